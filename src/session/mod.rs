//! Inspection session: the working set for one upload.
//!
//! A session starts `Uninitialized`, becomes `Loaded` on upload and is replaced on
//! re-upload. Switching the data type is an explicit transition that drops edits and
//! re-normalizes the upload under the new type.
//!
//! Manual edits live in an overlay on top of the cleaned table. The missing-value
//! report follows edits immediately; outlier flags only change on `recompute`.

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::domain::{CanonicalTable, ColumnValues, DataType, EditOverlay, Field, NormalizeConfig};
use crate::error::{AppError, NormalizeError, SessionError};
use crate::io::export::{export_cleaned, write_cleaned_csv};
use crate::io::ingest::Upload;
use crate::normalize::numeric::{coerce_number, is_null_token};
use crate::normalize::{NormalizedTable, normalize_upload};
use crate::report::{MissingReport, OutlierReport, RejectionSummary};

/// Everything held for a loaded upload.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub upload: Upload,
    pub normalized: NormalizedTable,
    pub edits: EditOverlay,
    /// Flags as of the last normalization or recompute (may lag behind edits).
    pub outliers: OutlierReport,
    /// Always reflects the current edits.
    pub missing: MissingReport,
}

#[derive(Debug, Clone)]
pub enum SessionState {
    Uninitialized,
    Loaded(Box<LoadedData>),
}

#[derive(Debug, Clone)]
pub struct Session {
    config: NormalizeConfig,
    state: SessionState,
}

impl Session {
    pub fn new(config: NormalizeConfig) -> Self {
        Self {
            config,
            state: SessionState::Uninitialized,
        }
    }

    pub fn config(&self) -> &NormalizeConfig {
        &self.config
    }

    pub fn data_type(&self) -> DataType {
        self.config.data_type
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn loaded(&self) -> Option<&LoadedData> {
        match &self.state {
            SessionState::Loaded(data) => Some(&**data),
            SessionState::Uninitialized => None,
        }
    }

    pub fn table(&self) -> Option<&CanonicalTable> {
        self.loaded().map(|d| &d.normalized.table)
    }

    pub fn summary(&self) -> Option<&RejectionSummary> {
        self.loaded().map(|d| &d.normalized.summary)
    }

    pub fn edits(&self) -> Option<&EditOverlay> {
        self.loaded().map(|d| &d.edits)
    }

    pub fn outliers(&self) -> Option<&OutlierReport> {
        self.loaded().map(|d| &d.outliers)
    }

    pub fn missing_report(&self) -> Option<&MissingReport> {
        self.loaded().map(|d| &d.missing)
    }

    /// Normalize `upload` and make it the working set, replacing any previous one.
    ///
    /// On error the previous state is kept.
    pub fn load(&mut self, upload: Upload) -> Result<(), NormalizeError> {
        let normalized = normalize_upload(&upload, &self.config)?;
        info!(file = %upload.file_name, rows = normalized.table.len(), "session loaded");
        let data = LoadedData {
            outliers: normalized.outliers.clone(),
            missing: normalized.missing.clone(),
            upload,
            normalized,
            edits: EditOverlay::new(),
        };
        self.state = SessionState::Loaded(Box::new(data));
        Ok(())
    }

    /// Switch the declared data type. Prior state (including edits) is cleared and the
    /// current upload, if any, is re-normalized under the new type.
    ///
    /// If the upload does not fit the new type the session ends up `Uninitialized`.
    pub fn switch_type(&mut self, data_type: DataType) -> Result<(), NormalizeError> {
        self.config.data_type = data_type;
        let previous = std::mem::replace(&mut self.state, SessionState::Uninitialized);
        info!(%data_type, "switched data type");
        if let SessionState::Loaded(data) = previous {
            self.load(data.upload)?;
        }
        Ok(())
    }

    /// Overlay a verbatim value on one cell.
    pub fn apply_edit(&mut self, row: usize, column: &str, value: impl Into<String>) -> Result<(), SessionError> {
        let data = self.loaded_mut()?;
        validate_cell(&data.normalized.table, row, column)?;
        let value = value.into();
        debug!(row, column, value = %value, "apply edit");
        data.edits.insert((row, column.to_string()), value);
        data.missing = missing_with_edits(&data.normalized.table, &data.edits);
        Ok(())
    }

    /// Drop an edit. Returns whether one existed.
    pub fn clear_edit(&mut self, row: usize, column: &str) -> Result<bool, SessionError> {
        let data = self.loaded_mut()?;
        let removed = data.edits.remove(&(row, column.to_string())).is_some();
        if removed {
            data.missing = missing_with_edits(&data.normalized.table, &data.edits);
        }
        Ok(removed)
    }

    /// Refresh outlier flags against the edited values.
    pub fn recompute(&mut self) -> Result<&OutlierReport, SessionError> {
        let multiplier = self.config.iqr_multiplier;
        let method = self.config.quartile_method;
        let data = self.loaded_mut()?;

        let effective = effective_numeric_columns(&data.normalized.table, &data.edits);
        data.outliers = OutlierReport::compute(
            effective.iter().map(|(name, values)| (name.as_str(), values.as_slice())),
            multiplier,
            method,
        );
        info!(flagged = data.outliers.total_flagged(), edits = data.edits.len(), "recomputed outlier flags");
        Ok(&data.outliers)
    }

    /// One numeric column as currently edited. `None` for text or unknown columns.
    pub fn effective_values(&self, column: &str) -> Option<Vec<Option<f64>>> {
        let data = self.loaded()?;
        let values = data.normalized.table.column(column)?.as_numeric()?;
        Some(with_edits(column, values, &data.edits))
    }

    /// The cleaned table with edits folded in: numeric edits coerced (unparseable ones
    /// are missing), text edits verbatim. Reports and plots read this view.
    pub fn effective_table(&self) -> Option<CanonicalTable> {
        let data = self.loaded()?;
        let mut table = data.normalized.table.clone();
        for column in &mut table.columns {
            match &mut column.values {
                ColumnValues::Numeric(values) => *values = with_edits(&column.name, values, &data.edits),
                ColumnValues::Text(values) => {
                    for ((row, _), raw) in data.edits.iter().filter(|((_, col), _)| *col == column.name) {
                        if let Some(cell) = values.get_mut(*row) {
                            *cell = Some(raw.clone()).filter(|v| !is_null_token(v));
                        }
                    }
                }
            }
        }
        Some(table)
    }

    /// Write the cleaned CSV (edits applied) to `writer`.
    pub fn export_csv<W: Write>(&self, writer: W) -> Result<(), AppError> {
        let data = self.loaded().ok_or(SessionError::NotLoaded)?;
        write_cleaned_csv(writer, &data.normalized.table, &data.edits)
            .map_err(|e| AppError::new(4, format!("Failed to write export CSV: {e}")))
    }

    /// Write `cleaned_<stem>.csv` into `dir`.
    pub fn export_to_dir(&self, dir: &Path) -> Result<PathBuf, AppError> {
        let data = self.loaded().ok_or(SessionError::NotLoaded)?;
        let path = export_cleaned(dir, &data.upload.stem(), &data.normalized.table, &data.edits)?;
        info!(path = %path.display(), "exported cleaned CSV");
        Ok(path)
    }

    fn loaded_mut(&mut self) -> Result<&mut LoadedData, SessionError> {
        match &mut self.state {
            SessionState::Loaded(data) => Ok(&mut **data),
            SessionState::Uninitialized => Err(SessionError::NotLoaded),
        }
    }
}

fn validate_cell(table: &CanonicalTable, row: usize, column: &str) -> Result<(), SessionError> {
    if column == CanonicalTable::DATE_COLUMN {
        return Err(SessionError::DateColumn);
    }
    if table.column(column).is_none() {
        return Err(SessionError::UnknownColumn(column.to_string()));
    }
    if row >= table.len() {
        return Err(SessionError::RowOutOfRange { row, rows: table.len() });
    }
    Ok(())
}

/// Missing report where an edited cell counts as missing only if its value is a null token.
pub fn missing_with_edits(table: &CanonicalTable, edits: &EditOverlay) -> MissingReport {
    let header = table.header();
    MissingReport::compute(&header, table.len(), |row, col| {
        if col == 0 {
            return false;
        }
        match edits.get(&(row, header[col].clone())) {
            Some(value) => is_null_token(value),
            None => table.columns[col - 1].values.is_missing(row),
        }
    })
}

/// Numeric columns with edits coerced in. Edits that do not parse count as missing.
fn effective_numeric_columns(table: &CanonicalTable, edits: &EditOverlay) -> Vec<(String, Vec<Option<f64>>)> {
    table
        .numeric_columns()
        .map(|(name, values)| (name.to_string(), with_edits(name, values, edits)))
        .collect()
}

fn with_edits(name: &str, values: &[Option<f64>], edits: &EditOverlay) -> Vec<Option<f64>> {
    let suffix = name == Field::Volume.name();
    let mut values = values.to_vec();
    for ((row, _), raw) in edits.iter().filter(|((_, col), _)| col == name) {
        if let Some(cell) = values.get_mut(*row) {
            *cell = coerce_number(raw, suffix).value();
        }
    }
    values
}
