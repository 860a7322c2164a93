//! IQR outlier flags.
//!
//! Flags are advisory: they annotate cells for display and never change a value or
//! drop a row. They are computed fresh on every pass.

use serde::Serialize;

use crate::domain::{CanonicalTable, QuartileMethod};
use crate::math::{quartiles, sorted_finite};

/// Fences and flagged rows for one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnOutliers {
    pub column: String,
    /// Non-missing observations the quartiles were computed from.
    pub n: usize,
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower: f64,
    pub upper: f64,
    /// 0-based row positions, ascending.
    pub flagged: Vec<usize>,
}

impl ColumnOutliers {
    pub fn is_flagged(&self, row: usize) -> bool {
        self.flagged.binary_search(&row).is_ok()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierReport {
    pub multiplier: f64,
    pub method: QuartileMethod,
    pub columns: Vec<ColumnOutliers>,
}

impl OutlierReport {
    /// Compute flags for each `(name, values)` column. Columns without any value are skipped.
    pub fn compute<'a, I>(columns: I, multiplier: f64, method: QuartileMethod) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a [Option<f64>])>,
    {
        let columns = columns
            .into_iter()
            .filter_map(|(name, values)| flag_column(name, values, multiplier, method))
            .collect();
        Self {
            multiplier,
            method,
            columns,
        }
    }

    pub fn from_table(table: &CanonicalTable, multiplier: f64, method: QuartileMethod) -> Self {
        Self::compute(table.numeric_columns(), multiplier, method)
    }

    pub fn column(&self, name: &str) -> Option<&ColumnOutliers> {
        self.columns.iter().find(|c| c.column == name)
    }

    pub fn is_flagged(&self, row: usize, column: &str) -> bool {
        self.column(column).is_some_and(|c| c.is_flagged(row))
    }

    pub fn total_flagged(&self) -> usize {
        self.columns.iter().map(|c| c.flagged.len()).sum()
    }
}

fn flag_column(name: &str, values: &[Option<f64>], multiplier: f64, method: QuartileMethod) -> Option<ColumnOutliers> {
    let sorted = sorted_finite(values.iter().flatten().copied());
    let (q1, q3) = quartiles(&sorted, method)?;
    let iqr = q3 - q1;
    let lower = q1 - multiplier * iqr;
    let upper = q3 + multiplier * iqr;

    let flagged = values
        .iter()
        .enumerate()
        .filter_map(|(row, v)| v.filter(|x| *x < lower || *x > upper).map(|_| row))
        .collect();

    Some(ColumnOutliers {
        column: name.to_string(),
        n: sorted.len(),
        q1,
        q3,
        iqr,
        lower,
        upper,
        flagged,
    })
}
