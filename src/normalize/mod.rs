//! Raw table → canonical table.
//!
//! Steps, in order:
//! 1. map headers through the synonym table (`columns`), failing on a missing required column
//! 2. parse dates, rejecting rows whose date is blank or unrecognized (`dates`)
//! 3. keep the last row supplied for each date, then sort ascending
//! 4. coerce value cells (`numeric`); failures become missing cells plus a cell error
//! 5. optional forward fill (indicator data)
//! 6. outlier flags and the missing-value report

pub mod columns;
pub mod dates;
pub mod numeric;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::domain::{CanonicalTable, Column, ColumnValues, DataType, NormalizeConfig};
use crate::error::{NormalizeError, ParseError};
use crate::io::ingest::{RawRow, RawTable, Upload, read_raw_table};
use crate::report::{MissingReport, OutlierReport, Rejection, RejectionSummary};

use self::columns::{ColumnPlan, ValueColumn, ValueKind, plan_columns};
use self::dates::parse_date;
use self::numeric::{Coerced, coerce_number, is_null_token};

/// Output of one normalization pass.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTable {
    pub table: CanonicalTable,
    pub summary: RejectionSummary,
    pub outliers: OutlierReport,
    pub missing: MissingReport,
}

/// Decode, parse and normalize an upload.
pub fn normalize_upload(upload: &Upload, config: &NormalizeConfig) -> Result<NormalizedTable, NormalizeError> {
    let raw = read_raw_table(upload)?;
    info!(
        file = %upload.file_name,
        rows = raw.rows.len(),
        columns = raw.headers.len(),
        "read upload"
    );
    normalize(&raw, config)
}

pub fn normalize(raw: &RawTable, config: &NormalizeConfig) -> Result<NormalizedTable, NormalizeError> {
    let plan = plan_columns(&raw.headers, config.data_type)?;

    let mut summary = RejectionSummary::new(config.data_type, raw.encoding);
    summary.rows_read = raw.rows.len() + raw.row_errors.len();
    summary.ignored_columns = plan.ignored.clone();
    summary.absent_columns = plan.absent.clone();
    summary
        .rejected_rows
        .extend(raw.row_errors.iter().map(|e| Rejection::new(e.line, e.error.clone())));

    // Later rows overwrite earlier ones: the most recently supplied row wins.
    let mut by_date: BTreeMap<NaiveDate, &RawRow> = BTreeMap::new();
    for row in &raw.rows {
        let cell = raw.cell(row, plan.date_index);
        if is_null_token(cell) {
            debug!(line = row.line, "rejecting row without a date");
            summary.rejected_rows.push(Rejection::new(row.line, ParseError::MissingDate));
            continue;
        }
        match parse_date(cell, config.date_order) {
            Some(date) => {
                if by_date.insert(date, row).is_some() {
                    summary.duplicates_dropped += 1;
                }
            }
            None => {
                debug!(line = row.line, value = cell, "rejecting row with unrecognized date");
                summary.rejected_rows.push(Rejection::new(
                    row.line,
                    ParseError::Date {
                        value: cell.to_string(),
                    },
                ));
            }
        }
    }
    summary.rejected_rows.sort_by_key(|r| r.line);

    if by_date.is_empty() {
        return Err(NormalizeError::EmptyInput(format!(
            "no usable rows after cleaning ({} read, {} rejected)",
            summary.rows_read,
            summary.rejected_rows.len()
        )));
    }

    let dates: Vec<NaiveDate> = by_date.keys().copied().collect();
    let rows: Vec<&RawRow> = by_date.into_values().collect();
    summary.rows_kept = rows.len();

    let mut columns: Vec<Column> = plan
        .values
        .iter()
        .map(|spec| build_column(raw, &rows, spec, &mut summary.cell_errors))
        .collect();
    summary.cell_errors.sort_by_key(|r| r.line);

    if config.forward_fill {
        match config.data_type {
            DataType::Indicator => summary.forward_filled = forward_fill(&mut columns),
            DataType::Securities => warn!("forward fill applies to indicator data only; ignoring"),
        }
    }

    let table = CanonicalTable {
        data_type: config.data_type,
        dates,
        columns,
    };
    let outliers = OutlierReport::from_table(&table, config.iqr_multiplier, config.quartile_method);
    let missing = MissingReport::from_table(&table);

    log_summary(&plan, &summary, &outliers);

    Ok(NormalizedTable {
        table,
        summary,
        outliers,
        missing,
    })
}

fn build_column(raw: &RawTable, rows: &[&RawRow], spec: &ValueColumn, errors: &mut Vec<Rejection>) -> Column {
    let Some(idx) = spec.source else {
        return Column::numeric(spec.name.clone(), vec![None; rows.len()]);
    };

    let suffix = match spec.kind {
        ValueKind::Numeric { suffix } => suffix,
        ValueKind::Detect => {
            if !mostly_numeric(rows.iter().map(|r| raw.cell(r, idx))) {
                let values = rows
                    .iter()
                    .map(|r| Some(raw.cell(r, idx)).filter(|c| !is_null_token(c)).map(str::to_string))
                    .collect();
                return Column::text(spec.name.clone(), values);
            }
            false
        }
    };

    let values = rows
        .iter()
        .map(|row| {
            let cell = raw.cell(row, idx);
            match coerce_number(cell, suffix) {
                Coerced::Value(v) => Some(v),
                Coerced::Missing => None,
                Coerced::Invalid => {
                    errors.push(Rejection::new(
                        row.line,
                        ParseError::Numeric {
                            column: spec.name.clone(),
                            value: cell.to_string(),
                        },
                    ));
                    None
                }
            }
        })
        .collect();
    Column::numeric(spec.name.clone(), values)
}

/// More than half of the non-blank cells coerce to a number.
fn mostly_numeric<'a>(cells: impl Iterator<Item = &'a str>) -> bool {
    let (mut present, mut numeric) = (0usize, 0usize);
    for cell in cells.filter(|c| !is_null_token(c)) {
        present += 1;
        if matches!(coerce_number(cell, false), Coerced::Value(_)) {
            numeric += 1;
        }
    }
    numeric * 2 > present
}

/// Carry the previous value into missing numeric cells. Returns the number filled.
fn forward_fill(columns: &mut [Column]) -> usize {
    let mut filled = 0;
    for column in columns {
        if let ColumnValues::Numeric(values) = &mut column.values {
            let mut last = None;
            for cell in values.iter_mut() {
                match cell {
                    Some(v) => last = Some(*v),
                    None if last.is_some() => {
                        *cell = last;
                        filled += 1;
                    }
                    None => {}
                }
            }
        }
    }
    filled
}

fn log_summary(plan: &ColumnPlan, summary: &RejectionSummary, outliers: &OutlierReport) {
    info!(
        data_type = %summary.data_type,
        rows_read = summary.rows_read,
        rows_kept = summary.rows_kept,
        duplicates = summary.duplicates_dropped,
        flagged = outliers.total_flagged(),
        "normalized table"
    );
    if !plan.ignored.is_empty() {
        warn!(columns = ?plan.ignored, "ignored columns");
    }
    if !summary.rejected_rows.is_empty() {
        warn!(count = summary.rejected_rows.len(), "rejected rows");
    }
    if !summary.cell_errors.is_empty() {
        warn!(count = summary.cell_errors.len(), "non-numeric cells marked missing");
    }
}
