//! Exports: the cleaned CSV, the JSON report, and the manual-edits file reader.
//!
//! The cleaned CSV is meant to be easy to consume in spreadsheets or downstream
//! scripts, and re-cleaning it yields the same bytes.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::{CanonicalTable, EditOverlay, NormalizeConfig};
use crate::error::AppError;
use crate::report::{ColumnStats, MissingReport, OutlierReport, RejectionSummary};

/// `cleaned_<stem>.csv`
pub fn cleaned_file_name(stem: &str) -> String {
    format!("cleaned_{stem}.csv")
}

/// Write the table (edits applied verbatim) as CSV.
pub fn write_cleaned_csv<W: Write>(writer: W, table: &CanonicalTable, edits: &EditOverlay) -> Result<(), csv::Error> {
    let header = table.header();
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(&header)?;

    for row in 0..table.len() {
        let record: Vec<String> = header
            .iter()
            .map(|name| table.effective_cell(edits, row, name).unwrap_or_default())
            .collect();
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write `cleaned_<stem>.csv` into `dir` (created if needed). Returns the written path.
pub fn export_cleaned(dir: &Path, stem: &str, table: &CanonicalTable, edits: &EditOverlay) -> Result<PathBuf, AppError> {
    fs::create_dir_all(dir)
        .map_err(|e| AppError::new(4, format!("Failed to create output directory '{}': {e}", dir.display())))?;
    let path = dir.join(cleaned_file_name(stem));
    let file = File::create(&path)
        .map_err(|e| AppError::new(4, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_cleaned_csv(file, table, edits)
        .map_err(|e| AppError::new(4, format!("Failed to write export CSV '{}': {e}", path.display())))?;
    Ok(path)
}

/// One manual edit, as stored in an edits file (`row,column,value`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditRecord {
    /// 0-based row in the cleaned table.
    pub row: usize,
    pub column: String,
    pub value: String,
}

/// Read an edits file. Values are kept verbatim (cells are not trimmed).
pub fn read_edits_csv(path: &Path) -> Result<Vec<EditRecord>, AppError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_path(path)
        .map_err(|e| AppError::new(2, format!("Failed to open edits CSV '{}': {e}", path.display())))?;

    let mut out = Vec::new();
    for (idx, result) in rdr.deserialize::<EditRecord>().enumerate() {
        let record = result
            .map_err(|e| AppError::new(2, format!("Invalid edits CSV '{}' at line {}: {e}", path.display(), idx + 2)))?;
        out.push(record);
    }
    Ok(out)
}

/// Everything a downstream consumer needs to audit a cleaning run.
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub file_name: &'a str,
    pub output_file: String,
    pub config: &'a NormalizeConfig,
    pub summary: &'a RejectionSummary,
    pub missing: &'a MissingReport,
    pub outliers: &'a OutlierReport,
    pub stats: &'a [ColumnStats],
    pub edits: Vec<EditRecord>,
}

pub fn edit_records(edits: &EditOverlay) -> Vec<EditRecord> {
    edits
        .iter()
        .map(|((row, column), value)| EditRecord {
            row: *row,
            column: column.clone(),
            value: value.clone(),
        })
        .collect()
}

pub fn write_report_json(path: &Path, report: &JsonReport<'_>) -> Result<(), AppError> {
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| AppError::new(4, format!("Failed to serialize JSON report: {e}")))?;
    fs::write(path, json + "\n")
        .map_err(|e| AppError::new(4, format!("Failed to write JSON report '{}': {e}", path.display())))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::{Column, DataType};

    fn table() -> CanonicalTable {
        CanonicalTable {
            data_type: DataType::Securities,
            dates: vec![
                NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 16).unwrap(),
            ],
            columns: vec![
                Column::numeric("open", vec![None, None]),
                Column::numeric("close", vec![Some(150.25), Some(151.0)]),
                Column::numeric("volume", vec![Some(1_200_000.0), None]),
            ],
        }
    }

    #[test]
    fn writes_iso_dates_and_empty_missing_cells() {
        let mut buf = Vec::new();
        write_cleaned_csv(&mut buf, &table(), &EditOverlay::new()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "date,open,close,volume\n2024-01-15,,150.25,1200000\n2024-01-16,,151,\n");
    }

    #[test]
    fn edits_are_exported_verbatim() {
        let mut edits = EditOverlay::new();
        edits.insert((1, "volume".to_string()), "approx 1.1M".to_string());
        let mut buf = Vec::new();
        write_cleaned_csv(&mut buf, &table(), &edits).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.ends_with("2024-01-16,,151,approx 1.1M\n"), "{text}");
    }

    #[test]
    fn cleaned_name_uses_stem() {
        assert_eq!(cleaned_file_name("prices"), "cleaned_prices.csv");
    }
}
