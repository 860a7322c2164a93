//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during normalization and inspection
//! - exported to CSV/JSON
//! - reloaded later (a cleaned export re-normalizes to the same table)

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::domain::synonyms::Field;

/// Declared kind of upload. Decides the required columns and the output schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// OHLCV price bars. Output schema is exactly `date, open, high, low, close, volume`.
    Securities,
    /// Economic indicator series: `date` plus arbitrary value columns.
    #[value(alias = "economic")]
    Indicator,
}

impl DataType {
    pub fn display_name(self) -> &'static str {
        match self {
            DataType::Securities => "securities",
            DataType::Indicator => "indicator",
        }
    }

    /// Columns whose absence is a schema error.
    pub fn required_fields(self) -> &'static [Field] {
        match self {
            DataType::Securities => &[Field::Date, Field::Close],
            DataType::Indicator => &[Field::Date],
        }
    }

    pub fn toggled(self) -> DataType {
        match self {
            DataType::Securities => DataType::Indicator,
            DataType::Indicator => DataType::Securities,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// How to read ambiguous numeric dates such as `03/04/2024`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DateOrder {
    /// Month first (`MM/DD/YYYY`), the common export format for US price histories.
    Mdy,
    /// Day first (`DD/MM/YYYY`).
    Dmy,
}

/// Quartile estimator used for IQR outlier bounds.
///
/// Names follow the usual interpolation options for a sorted sample; `Linear` is the
/// standard estimator (position `p * (n - 1)` with linear interpolation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum QuartileMethod {
    Linear,
    Lower,
    Higher,
    Midpoint,
}

/// Tunables for a normalization pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizeConfig {
    pub data_type: DataType,
    pub date_order: DateOrder,
    /// IQR fence multiplier (`k` in `[Q1 - k*IQR, Q3 + k*IQR]`).
    pub iqr_multiplier: f64,
    pub quartile_method: QuartileMethod,
    /// Forward-fill missing numeric cells after sorting (indicator data only).
    pub forward_fill: bool,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            data_type: DataType::Securities,
            date_order: DateOrder::Mdy,
            iqr_multiplier: 1.5,
            quartile_method: QuartileMethod::Linear,
            forward_fill: false,
        }
    }
}

/// Values of a single canonical column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    Numeric(Vec<Option<f64>>),
    /// Pass-through text, carried verbatim.
    Text(Vec<Option<String>>),
}

impl ColumnValues {
    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Numeric(v) => v.len(),
            ColumnValues::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_missing(&self, row: usize) -> bool {
        match self {
            ColumnValues::Numeric(v) => v.get(row).is_none_or(|c| c.is_none()),
            ColumnValues::Text(v) => v.get(row).is_none_or(|c| c.is_none()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: ColumnValues,
}

impl Column {
    pub fn numeric(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            values: ColumnValues::Numeric(values),
        }
    }

    pub fn text(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self {
            name: name.into(),
            values: ColumnValues::Text(values),
        }
    }

    pub fn as_numeric(&self) -> Option<&[Option<f64>]> {
        match &self.values {
            ColumnValues::Numeric(v) => Some(v),
            ColumnValues::Text(_) => None,
        }
    }

    /// Render one cell the way it is exported (missing is the empty string).
    pub fn cell_text(&self, row: usize) -> String {
        match &self.values {
            ColumnValues::Numeric(v) => v
                .get(row)
                .copied()
                .flatten()
                .map(format_number)
                .unwrap_or_default(),
            ColumnValues::Text(v) => v.get(row).cloned().flatten().unwrap_or_default(),
        }
    }
}

/// The cleaned working set: one date per row, sorted ascending, no duplicates.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalTable {
    pub data_type: DataType,
    pub dates: Vec<NaiveDate>,
    /// Value columns in output order (the `date` column is implicit and always first).
    pub columns: Vec<Column>,
}

impl CanonicalTable {
    pub const DATE_COLUMN: &'static str = "date";

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Full header, `date` first.
    pub fn header(&self) -> Vec<String> {
        std::iter::once(Self::DATE_COLUMN.to_string())
            .chain(self.columns.iter().map(|c| c.name.clone()))
            .collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn numeric_columns(&self) -> impl Iterator<Item = (&str, &[Option<f64>])> {
        self.columns
            .iter()
            .filter_map(|c| c.as_numeric().map(|v| (c.name.as_str(), v)))
    }

    /// Render one cell by header name (including `date`).
    pub fn cell_text(&self, row: usize, column: &str) -> Option<String> {
        if column == Self::DATE_COLUMN {
            return self.dates.get(row).map(format_date);
        }
        let col = self.column(column)?;
        (row < self.len()).then(|| col.cell_text(row))
    }

    /// Cell as displayed and exported: a manual edit if one exists, else the cleaned value.
    pub fn effective_cell(&self, edits: &EditOverlay, row: usize, column: &str) -> Option<String> {
        match edits.get(&(row, column.to_string())) {
            Some(v) if row < self.len() => Some(v.clone()),
            _ => self.cell_text(row, column),
        }
    }
}

/// Manual cell edits keyed by `(row, column name)`. Values are kept verbatim.
pub type EditOverlay = BTreeMap<(usize, String), String>;

/// ISO calendar date (`YYYY-MM-DD`).
pub fn format_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Shortest representation that parses back to the same `f64`.
///
/// Keeping this stable is what makes re-cleaning an export byte-identical.
pub fn format_number(v: f64) -> String {
    if v == 0.0 {
        // Collapse `-0` so the output never depends on the sign of zero.
        return "0".to_string();
    }
    format!("{v}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_number_round_trips() {
        for v in [150.25, 1_200_000.0, 2_500_000_000.0, 0.1 + 0.2, -3.5, 1e-7] {
            let s = format_number(v);
            assert_eq!(s.parse::<f64>().unwrap(), v, "{s}");
        }
        assert_eq!(format_number(1_200_000.0), "1200000");
        assert_eq!(format_number(-0.0), "0");
    }

    #[test]
    fn table_cell_text_includes_date_column() {
        let table = CanonicalTable {
            data_type: DataType::Securities,
            dates: vec![NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()],
            columns: vec![Column::numeric("close", vec![Some(150.25)]), Column::numeric("open", vec![None])],
        };
        assert_eq!(table.header(), vec!["date", "close", "open"]);
        assert_eq!(table.cell_text(0, "date").as_deref(), Some("2024-01-15"));
        assert_eq!(table.cell_text(0, "close").as_deref(), Some("150.25"));
        assert_eq!(table.cell_text(0, "open").as_deref(), Some(""));
        assert_eq!(table.cell_text(1, "close"), None);
        assert_eq!(table.cell_text(0, "nope"), None);
    }
}
