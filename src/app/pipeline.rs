//! Shared "load" logic used by the CLI commands and the inspector.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! pick file -> read upload -> normalize into a session -> overlay edits
//!
//! The front-ends can then focus on presentation (printing vs widgets).

use std::path::{Path, PathBuf};

use tracing::info;

use crate::cli::InputArgs;
use crate::cli::picker::{prompt_for_csv_path, validate_csv_path};
use crate::domain::{CanonicalTable, Field, NormalizeConfig};
use crate::error::AppError;
use crate::io::export::{EditRecord, read_edits_csv};
use crate::io::ingest::load_upload;
use crate::session::Session;

/// `-f` if given, otherwise the interactive picker.
pub fn resolve_input(args: &InputArgs) -> Result<PathBuf, AppError> {
    match &args.file {
        Some(path) => validate_csv_path(path),
        None => prompt_for_csv_path(),
    }
}

/// Resolve the input file and load it into a fresh session.
pub fn load_session(args: &InputArgs) -> Result<Session, AppError> {
    let config = args.normalize_config()?;
    let path = resolve_input(args)?;
    load_session_from(&path, config)
}

pub fn load_session_from(path: &Path, config: NormalizeConfig) -> Result<Session, AppError> {
    let upload = load_upload(path)?;
    let mut session = Session::new(config);
    session.load(upload)?;
    Ok(session)
}

/// Apply every record from an edits file, then refresh the outlier flags once.
pub fn apply_edits_file(session: &mut Session, path: &Path) -> Result<usize, AppError> {
    let records = read_edits_csv(path)?;
    apply_edit_records(session, &records)?;
    info!(count = records.len(), file = %path.display(), "applied manual edits");
    Ok(records.len())
}

pub fn apply_edit_records(session: &mut Session, records: &[EditRecord]) -> Result<(), AppError> {
    for r in records {
        session
            .apply_edit(r.row, &r.column, r.value.clone())
            .map_err(|e| AppError::new(2, format!("Invalid edit (row {}, column `{}`): {e}", r.row, r.column)))?;
    }
    if !records.is_empty() {
        session.recompute()?;
    }
    Ok(())
}

/// `close` when present, otherwise the first numeric column.
pub fn default_plot_column(table: &CanonicalTable) -> Option<String> {
    let close = Field::Close.name();
    if table.numeric_columns().any(|(name, _)| name == close) {
        return Some(close.to_string());
    }
    table.numeric_columns().next().map(|(name, _)| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{SampleConfig, generate_sample};
    use crate::domain::{Column, DataType};
    use crate::io::export::{JsonReport, edit_records, write_report_json};
    use crate::report::describe;

    #[test]
    fn edits_file_overlays_and_recomputes() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("prices.csv");
        std::fs::write(
            &data,
            "Date,Close\n2024-01-01,10\n2024-01-02,12\n2024-01-03,11\n2024-01-04,13\n2024-01-05,12\n2024-01-06,11\n2024-01-07,100\n",
        )
        .unwrap();
        let edits = dir.path().join("edits.csv");
        std::fs::write(&edits, "row,column,value\n6,close,12\n").unwrap();

        let mut session = load_session_from(&data, NormalizeConfig::default()).unwrap();
        assert!(session.outliers().unwrap().is_flagged(6, "close"));
        assert_eq!(apply_edits_file(&mut session, &edits).unwrap(), 1);
        assert!(!session.outliers().unwrap().is_flagged(6, "close"));
    }

    #[test]
    fn edits_file_reaches_stats_and_plot() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("prices.csv");
        std::fs::write(
            &data,
            "Date,Close\n2024-01-01,10\n2024-01-02,12\n2024-01-03,11\n2024-01-04,13\n2024-01-05,12\n2024-01-06,11\n2024-01-07,100\n",
        )
        .unwrap();
        let edits = dir.path().join("edits.csv");
        std::fs::write(&edits, "row,column,value\n6,close,12\n0,close,500\n").unwrap();

        let mut session = load_session_from(&data, NormalizeConfig::default()).unwrap();
        apply_edits_file(&mut session, &edits).unwrap();
        let edited = session.effective_table().unwrap();
        let outliers = session.outliers().unwrap();

        let stats = describe(&edited, outliers, session.config().quartile_method);
        let close = stats.iter().find(|s| s.column == "close").unwrap();
        assert_eq!(close.max, Some(500.0));
        assert_eq!(close.latest, Some(12.0));

        let plot = crate::plot::render_column_plot(&edited, "close", outliers, 20, 6).unwrap();
        assert!(plot.lines().nth(1).unwrap().starts_with('X'), "{plot}");
    }

    #[test]
    fn bad_edit_names_the_row_and_column() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("prices.csv");
        std::fs::write(&data, "Date,Close\n2024-01-01,10\n").unwrap();
        let mut session = load_session_from(&data, NormalizeConfig::default()).unwrap();

        let records = vec![EditRecord {
            row: 5,
            column: "close".to_string(),
            value: "1".to_string(),
        }];
        let err = apply_edit_records(&mut session, &records).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("row 5"));
    }

    #[test]
    fn sample_file_accounts_for_every_row() {
        let dir = tempfile::tempdir().unwrap();
        let sample = generate_sample(&SampleConfig {
            rows: 120,
            seed: 7,
            duplicate_prob: 0.1,
            ..SampleConfig::default()
        })
        .unwrap();
        let path = dir.path().join("sample.csv");
        std::fs::write(&path, &sample.csv).unwrap();

        let session = load_session_from(&path, NormalizeConfig::default()).unwrap();
        let summary = session.summary().unwrap();
        assert_eq!(summary.rows_read, sample.summary.rows_written);
        assert_eq!(summary.rows_kept, 119);
        assert_eq!(summary.duplicates_dropped, sample.summary.duplicates);
        assert_eq!(summary.rejected_rows.len(), 1);
        assert!(summary.is_balanced());
        assert!(summary.ignored_columns.iter().any(|c| c.starts_with("Change %")));
    }

    #[test]
    fn json_report_lists_edits_and_stats() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("prices.csv");
        std::fs::write(&data, "Date,Close\n2024-01-01,10\n2024-01-02,\n2024-01-03,11\n").unwrap();
        let mut session = load_session_from(&data, NormalizeConfig::default()).unwrap();
        session.apply_edit(1, "close", "10.5").unwrap();

        let loaded = session.loaded().unwrap();
        let stats = describe(&loaded.normalized.table, &loaded.outliers, session.config().quartile_method);
        let report = JsonReport {
            file_name: &loaded.upload.file_name,
            output_file: "cleaned_prices.csv".to_string(),
            config: session.config(),
            summary: &loaded.normalized.summary,
            missing: &loaded.missing,
            outliers: &loaded.outliers,
            stats: &stats,
            edits: edit_records(&loaded.edits),
        };
        let path = dir.path().join("report.json");
        write_report_json(&path, &report).unwrap();

        let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["file_name"], "prices.csv");
        assert_eq!(json["edits"][0]["value"], "10.5");
        assert_eq!(json["summary"]["rows_kept"], 3);
        assert!(json["stats"].as_array().unwrap().iter().any(|s| s["column"] == "close"));
    }

    #[test]
    fn plot_column_prefers_close() {
        let date = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut table = CanonicalTable {
            data_type: DataType::Indicator,
            dates: vec![date],
            columns: vec![
                Column::text("note", vec![None]),
                Column::numeric("gdp", vec![Some(1.0)]),
            ],
        };
        assert_eq!(default_plot_column(&table).as_deref(), Some("gdp"));
        table.columns.push(Column::numeric("close", vec![Some(2.0)]));
        assert_eq!(default_plot_column(&table).as_deref(), Some("close"));
    }
}
