//! Missing-value report.

use serde::Serialize;

use crate::domain::CanonicalTable;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnMissing {
    pub column: String,
    pub count: usize,
    /// 0-based row positions in the canonical (sorted) table.
    pub positions: Vec<usize>,
}

/// Per-column count and positions of absent values. Column order follows the table header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingReport {
    pub rows: usize,
    pub columns: Vec<ColumnMissing>,
}

impl MissingReport {
    /// Build from a header and a predicate telling whether `(row, column index)` is missing.
    pub fn compute<F>(header: &[String], rows: usize, is_missing: F) -> Self
    where
        F: Fn(usize, usize) -> bool,
    {
        let columns = header
            .iter()
            .enumerate()
            .map(|(col, name)| {
                let positions: Vec<usize> = (0..rows).filter(|&row| is_missing(row, col)).collect();
                ColumnMissing {
                    column: name.clone(),
                    count: positions.len(),
                    positions,
                }
            })
            .collect();
        Self { rows, columns }
    }

    /// Report for a table with no edits applied.
    pub fn from_table(table: &CanonicalTable) -> Self {
        // Canonical dates are never missing; the date column reports zero.
        Self::compute(&table.header(), table.len(), |row, col| {
            col > 0 && table.columns[col - 1].values.is_missing(row)
        })
    }

    pub fn column(&self, name: &str) -> Option<&ColumnMissing> {
        self.columns.iter().find(|c| c.column == name)
    }

    pub fn total(&self) -> usize {
        self.columns.iter().map(|c| c.count).sum()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Days, NaiveDate};

    use super::*;
    use crate::domain::{Column, DataType};

    #[test]
    fn counts_and_positions_of_blanks() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let dates: Vec<_> = (0..10).map(|i| start + Days::new(i)).collect();
        let close: Vec<Option<f64>> = (0..10)
            .map(|i| if [2, 5, 9].contains(&i) { None } else { Some(100.0 + i as f64) })
            .collect();
        let table = CanonicalTable {
            data_type: DataType::Indicator,
            dates,
            columns: vec![Column::numeric("close", close)],
        };

        let report = MissingReport::from_table(&table);
        assert_eq!(report.rows, 10);
        let close = report.column("close").unwrap();
        assert_eq!(close.count, 3);
        assert_eq!(close.positions, vec![2, 5, 9]);
        assert_eq!(report.column("date").unwrap().count, 0);
        assert_eq!(report.total(), 3);
    }
}
