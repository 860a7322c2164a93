//! Load summary: what was read, kept, rejected, and why.

use serde::Serialize;

use crate::domain::{DataType, SYNONYMS_VERSION};
use crate::error::ParseError;
use crate::io::ingest::Encoding;

/// A rejected row or a cell-level coercion failure, tied to its source line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rejection {
    /// 1-based line in the uploaded file.
    pub line: usize,
    pub reason: String,
    pub error: ParseError,
}

impl Rejection {
    pub fn new(line: usize, error: ParseError) -> Self {
        Self {
            line,
            reason: error.to_string(),
            error,
        }
    }
}

/// Accounting for a normalization pass.
///
/// `rows_read == rows_kept + rejected_rows.len() + duplicates_dropped` always holds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectionSummary {
    pub data_type: DataType,
    pub encoding: Encoding,
    pub synonyms_version: u32,
    pub rows_read: usize,
    pub rows_kept: usize,
    pub duplicates_dropped: usize,
    pub rejected_rows: Vec<Rejection>,
    pub cell_errors: Vec<Rejection>,
    pub ignored_columns: Vec<String>,
    pub absent_columns: Vec<String>,
    pub forward_filled: usize,
}

impl RejectionSummary {
    pub fn new(data_type: DataType, encoding: Encoding) -> Self {
        Self {
            data_type,
            encoding,
            synonyms_version: SYNONYMS_VERSION,
            rows_read: 0,
            rows_kept: 0,
            duplicates_dropped: 0,
            rejected_rows: Vec::new(),
            cell_errors: Vec::new(),
            ignored_columns: Vec::new(),
            absent_columns: Vec::new(),
            forward_filled: 0,
        }
    }

    pub fn is_balanced(&self) -> bool {
        self.rows_read == self.rows_kept + self.rejected_rows.len() + self.duplicates_dropped
    }
}
