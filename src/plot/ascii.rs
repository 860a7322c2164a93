//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements, one column over row order:
//! - values: `o`
//! - line between consecutive values: `-`
//! - flagged outliers: `X`

use crate::domain::CanonicalTable;
use crate::report::OutlierReport;

/// Render one numeric column. `None` if the column is missing, text, or has no values.
pub fn render_column_plot(
    table: &CanonicalTable,
    column: &str,
    outliers: &OutlierReport,
    width: usize,
    height: usize,
) -> Option<String> {
    let values = table.column(column)?.as_numeric()?;
    let points: Vec<(usize, f64)> = values
        .iter()
        .enumerate()
        .filter_map(|(row, v)| v.filter(|x| x.is_finite()).map(|x| (row, x)))
        .collect();
    if points.is_empty() {
        return None;
    }

    let width = width.max(10);
    let height = height.max(5);

    let x_max = table.len().saturating_sub(1).max(1) as f64;
    let (y_min, y_max) = y_range(&points);
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Line first so points can overlay.
    let mapped: Vec<(usize, usize, usize)> = points
        .iter()
        .map(|&(row, y)| (row, map_x(row as f64, x_max, width), map_y(y, y_min, y_max, height)))
        .collect();
    for pair in mapped.windows(2) {
        let (_, x0, y0) = pair[0];
        let (_, x1, y1) = pair[1];
        draw_line(&mut grid, x0, y0, x1, y1, '-');
    }
    for &(row, x, y) in &mapped {
        grid[y][x] = if outliers.is_flagged(row, column) { 'X' } else { 'o' };
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: {column} | rows=[0, {}] | y=[{y_min:.2}, {y_max:.2}]\n",
        table.len().saturating_sub(1)
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    Some(out)
}

fn y_range(points: &[(usize, f64)]) -> (f64, f64) {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for &(_, y) in points {
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }
    if max_y > min_y {
        (min_y, max_y)
    } else {
        // Flat series: centre it.
        (min_y - 1.0, max_y + 1.0)
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_max: f64, width: usize) -> usize {
    let u = (x / x_max).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y max is row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham). Only paints empty cells.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if let Some(cell) = grid.get_mut(y0 as usize).and_then(|r| r.get_mut(x0 as usize)) {
            if *cell == ' ' {
                *cell = ch;
            }
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
