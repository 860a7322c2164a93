//! Error types.
//!
//! - `AppError` is the binary boundary: a message plus the process exit code.
//! - `NormalizeError` covers file-level failures that abort a load.
//! - `SessionError` covers rejected edits and operations on an empty session.
//! - `ParseError` covers row/cell-level problems that are recorded and skipped.

use serde::Serialize;
use thiserror::Error;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// File-level failures. Any of these aborts the load.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("Schema error: missing required column `{column}` for {data_type} data")]
    Schema { column: String, data_type: String },

    #[error("Unreadable upload: {0}")]
    Unreadable(String),

    #[error("Empty input: {0}")]
    EmptyInput(String),
}

impl From<NormalizeError> for AppError {
    fn from(err: NormalizeError) -> Self {
        let code = match err {
            NormalizeError::EmptyInput(_) => 3,
            NormalizeError::Schema { .. } | NormalizeError::Unreadable(_) => 2,
        };
        AppError::new(code, err.to_string())
    }
}

/// Rejected session operation. The session is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("no data loaded")]
    NotLoaded,

    #[error("row {row} is out of range (table has {rows} rows)")]
    RowOutOfRange { row: usize, rows: usize },

    #[error("unknown column `{0}`")]
    UnknownColumn(String),

    #[error("the `date` column is the row key and cannot be edited")]
    DateColumn,
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        AppError::new(2, err.to_string())
    }
}

/// Row- or cell-level problem. Recorded in the rejection summary, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseError {
    #[error("CSV parse error: {message}")]
    Csv { message: String },

    #[error("missing date")]
    MissingDate,

    #[error("unrecognized date '{value}'")]
    Date { value: String },

    #[error("non-numeric value '{value}' in `{column}` (marked missing)")]
    Numeric { column: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_errors_map_to_exit_codes() {
        let schema: AppError = NormalizeError::Schema {
            column: "close".to_string(),
            data_type: "securities".to_string(),
        }
        .into();
        assert_eq!(schema.exit_code(), 2);
        assert!(schema.to_string().contains("`close`"));

        let empty: AppError = NormalizeError::EmptyInput("no rows".to_string()).into();
        assert_eq!(empty.exit_code(), 3);
    }

    #[test]
    fn parse_error_messages_name_the_value() {
        let err = ParseError::Numeric {
            column: "close".to_string(),
            value: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "non-numeric value 'abc' in `close` (marked missing)");
    }
}
