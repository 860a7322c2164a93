//! Descriptive statistics per numeric column.

use serde::Serialize;

use crate::domain::{CanonicalTable, QuartileMethod};
use crate::math::{mean, quantile_sorted, sample_std, sorted_finite, z_score};
use crate::report::OutlierReport;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnStats {
    pub column: String,
    pub count: usize,
    pub missing: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q1: Option<f64>,
    pub median: Option<f64>,
    pub q3: Option<f64>,
    pub max: Option<f64>,
    /// Most recent non-missing value (rows are date-ascending).
    pub latest: Option<f64>,
    pub latest_z: Option<f64>,
    pub outliers: usize,
}

pub fn describe(table: &CanonicalTable, outliers: &OutlierReport, method: QuartileMethod) -> Vec<ColumnStats> {
    table
        .numeric_columns()
        .map(|(name, values)| describe_column(name, values, outliers, method))
        .collect()
}

fn describe_column(
    name: &str,
    values: &[Option<f64>],
    outliers: &OutlierReport,
    method: QuartileMethod,
) -> ColumnStats {
    let present: Vec<f64> = values.iter().flatten().copied().filter(|v| v.is_finite()).collect();
    let sorted = sorted_finite(present.iter().copied());
    let m = mean(&present);
    let s = sample_std(&present);
    let latest = values.iter().rev().flatten().copied().next();
    let latest_z = match (latest, m, s) {
        (Some(x), Some(m), Some(s)) => z_score(x, m, s),
        _ => None,
    };

    ColumnStats {
        column: name.to_string(),
        count: present.len(),
        missing: values.len() - present.len(),
        mean: m,
        std: s,
        min: sorted.first().copied(),
        q1: quantile_sorted(&sorted, 0.25, method),
        median: quantile_sorted(&sorted, 0.5, method),
        q3: quantile_sorted(&sorted, 0.75, method),
        max: sorted.last().copied(),
        latest,
        latest_z,
        outliers: outliers.column(name).map_or(0, |c| c.flagged.len()),
    }
}
