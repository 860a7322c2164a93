//! Formatted terminal output.
//!
//! Formatting lives in one place so the cleaning code stays free of presentation
//! concerns and output changes are localized.

use crate::domain::{CanonicalTable, EditOverlay, NormalizeConfig};
use crate::report::{ColumnStats, MissingReport, OutlierReport, RejectionSummary};

const DATE_WIDTH: usize = 10;
const CELL_WIDTH: usize = 14;

/// Header block: what was loaded and how it was accounted for.
pub fn format_load_summary(file_name: &str, summary: &RejectionSummary, config: &NormalizeConfig) -> String {
    let mut out = String::new();

    out.push_str("=== fitclean - Data Cleaner & Inspector ===\n");
    out.push_str(&format!("File: {file_name} ({:?})\n", summary.encoding));
    out.push_str(&format!(
        "Type: {} | synonyms v{}\n",
        summary.data_type, summary.synonyms_version
    ));
    out.push_str(&format!(
        "Rows: read={} kept={} rejected={} duplicates={}\n",
        summary.rows_read,
        summary.rows_kept,
        summary.rejected_rows.len(),
        summary.duplicates_dropped
    ));
    out.push_str(&format!(
        "Outliers: k={} quartiles={:?}\n",
        config.iqr_multiplier, config.quartile_method
    ));
    if !summary.absent_columns.is_empty() {
        out.push_str(&format!("Absent (all missing): {}\n", summary.absent_columns.join(", ")));
    }
    if !summary.ignored_columns.is_empty() {
        out.push_str(&format!("Ignored: {}\n", summary.ignored_columns.join("; ")));
    }
    if summary.forward_filled > 0 {
        out.push_str(&format!("Forward-filled cells: {}\n", summary.forward_filled));
    }
    if !summary.cell_errors.is_empty() {
        out.push_str(&format!("Cell parse errors: {}\n", summary.cell_errors.len()));
    }

    out
}

/// Missing-value counts per column, with the first few positions.
pub fn format_missing(report: &MissingReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("Missing values ({} rows):\n", report.rows));
    push_line(&mut out, format!("{:<20} {:>8}  {}", "column", "missing", "rows (0-based)"));
    push_line(&mut out, format!("{:-<20} {:-<8}  {:-<14}", "", "", ""));
    for c in &report.columns {
        push_line(
            &mut out,
            format!("{:<20} {:>8}  {}", truncate(&c.column, 20), c.count, fmt_positions(&c.positions, 8)),
        );
    }
    out
}

/// Rejected rows and cell errors, at most `limit` of each.
pub fn format_rejections(summary: &RejectionSummary, limit: usize) -> String {
    let mut out = String::new();
    if summary.rejected_rows.is_empty() && summary.cell_errors.is_empty() {
        return out;
    }

    for (title, list) in [("Rejected rows", &summary.rejected_rows), ("Cell errors", &summary.cell_errors)] {
        if list.is_empty() {
            continue;
        }
        out.push_str(&format!("{title}:\n"));
        for r in list.iter().take(limit) {
            out.push_str(&format!("  line {:>5}: {}\n", r.line, r.reason));
        }
        if list.len() > limit {
            out.push_str(&format!("  ... {} more\n", list.len() - limit));
        }
    }
    out
}

pub fn format_describe(stats: &[ColumnStats]) -> String {
    let mut out = String::new();
    push_line(
        &mut out,
        format!(
            "{:<16} {:>6} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12} {:>8} {:>4}",
            "column", "count", "mean", "std", "min", "q1", "median", "q3", "max", "last_z", "out"
        ),
    );
    push_line(
        &mut out,
        format!(
            "{:-<16} {:-<6} {:-<12} {:-<12} {:-<12} {:-<12} {:-<12} {:-<12} {:-<12} {:-<8} {:-<4}",
            "", "", "", "", "", "", "", "", "", "", ""
        ),
    );
    for s in stats {
        push_line(
            &mut out,
            format!(
                "{:<16} {:>6} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12} {:>8} {:>4}",
                truncate(&s.column, 16),
                s.count,
                fmt_opt(s.mean, 4),
                fmt_opt(s.std, 4),
                fmt_opt(s.min, 4),
                fmt_opt(s.q1, 4),
                fmt_opt(s.median, 4),
                fmt_opt(s.q3, 4),
                fmt_opt(s.max, 4),
                fmt_opt(s.latest_z, 2),
                s.outliers,
            ),
        );
    }
    out
}

/// First `max_rows` rows with edits applied. Flagged outlier cells end in `*`,
/// edited cells in `~`.
pub fn format_preview(
    table: &CanonicalTable,
    outliers: &OutlierReport,
    edits: &EditOverlay,
    max_rows: usize,
) -> String {
    let header = table.header();
    let mut out = String::new();

    let mut line = String::new();
    for (i, name) in header.iter().enumerate() {
        let w = if i == 0 { DATE_WIDTH } else { CELL_WIDTH };
        line.push_str(&format!("{:>w$} ", truncate(name, w)));
    }
    push_line(&mut out, line);

    let mut line = String::new();
    for i in 0..header.len() {
        let w = if i == 0 { DATE_WIDTH } else { CELL_WIDTH };
        line.push_str(&format!("{:->w$} ", ""));
    }
    push_line(&mut out, line);

    for row in 0..table.len().min(max_rows) {
        let mut line = String::new();
        for (i, name) in header.iter().enumerate() {
            let w = if i == 0 { DATE_WIDTH } else { CELL_WIDTH };
            let mut cell = table.effective_cell(edits, row, name).unwrap_or_default();
            if edits.contains_key(&(row, name.clone())) {
                cell.push('~');
            } else if outliers.is_flagged(row, name) {
                cell.push('*');
            }
            line.push_str(&format!("{:>w$} ", truncate(&cell, w)));
        }
        push_line(&mut out, line);
    }
    if table.len() > max_rows {
        out.push_str(&format!("... {} more rows\n", table.len() - max_rows));
    }
    out
}

fn push_line(out: &mut String, line: String) {
    out.push_str(line.trim_end());
    out.push('\n');
}

fn fmt_opt(v: Option<f64>, decimals: usize) -> String {
    match v {
        Some(x) => format!("{x:.decimals$}"),
        None => "-".to_string(),
    }
}

fn fmt_positions(positions: &[usize], max: usize) -> String {
    let mut parts: Vec<String> = positions.iter().take(max).map(|p| p.to_string()).collect();
    if positions.len() > max {
        parts.push("...".to_string());
    }
    parts.join(", ")
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::{Column, DataType, QuartileMethod};

    fn table() -> CanonicalTable {
        let dates = (1..=7).map(|d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap()).collect();
        let close = [10.0, 12.0, 11.0, 13.0, 12.0, 11.0, 100.0].map(Some).to_vec();
        CanonicalTable {
            data_type: DataType::Securities,
            dates,
            columns: vec![Column::numeric("close", close)],
        }
    }

    #[test]
    fn preview_marks_outliers_and_edits() {
        let t = table();
        let outliers = OutlierReport::from_table(&t, 1.5, QuartileMethod::Linear);
        let mut edits = EditOverlay::new();
        edits.insert((1, "close".to_string()), "12.5".to_string());

        let text = format_preview(&t, &outliers, &edits, 10);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 9);
        assert!(lines[3].ends_with("12.5~"));
        assert!(lines[8].ends_with("100*"));
        assert!(lines[2].ends_with(" 10"));
    }

    #[test]
    fn preview_truncates_rows() {
        let t = table();
        let outliers = OutlierReport::from_table(&t, 1.5, QuartileMethod::Linear);
        let text = format_preview(&t, &outliers, &EditOverlay::new(), 3);
        assert!(text.ends_with("... 4 more rows\n"));
    }

    #[test]
    fn missing_lists_positions() {
        let mut t = table();
        t.columns[0] = Column::numeric("close", vec![Some(1.0), None, Some(2.0), None, None, Some(3.0), Some(4.0)]);
        let text = format_missing(&MissingReport::from_table(&t));
        let expected = format!("{:<20} {:>8}  1, 3, 4", "close", 3);
        assert!(text.contains(&expected), "{text}");
    }

    #[test]
    fn truncate_marks_cut_text() {
        assert_eq!(truncate("observation", 6), "obser.");
        assert_eq!(truncate("close", 6), "close");
    }
}
