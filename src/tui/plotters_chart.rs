//! Plotters-powered column chart widget for Ratatui.
//!
//! Plotters output is drawn into the Ratatui buffer through
//! `plotters-ratatui-backend`.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// Render-only chart description. Series and bounds are computed outside `render()`.
pub struct ColumnChart<'a> {
    /// Line through consecutive non-missing values, `(row, value)`.
    pub line: &'a [(f64, f64)],
    /// Flagged outliers, a subset of `line`.
    pub outliers: &'a [(f64, f64)],
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    pub y_label: &'a str,
}

impl ColumnChart<'_> {
    /// Bounds that fit `line`, padded 5% vertically. `None` without any finite point.
    pub fn fit_bounds(line: &[(f64, f64)]) -> Option<([f64; 2], [f64; 2])> {
        let (mut x_max, mut y_min, mut y_max) = (0.0_f64, f64::INFINITY, f64::NEG_INFINITY);
        for &(x, y) in line.iter().filter(|(_, y)| y.is_finite()) {
            x_max = x_max.max(x);
            y_min = y_min.min(y);
            y_max = y_max.max(y);
        }
        if !(y_min.is_finite() && y_max.is_finite()) {
            return None;
        }
        if y_max <= y_min {
            y_min -= 1.0;
            y_max += 1.0;
        }
        let pad = ((y_max - y_min) * 0.05).max(1e-12);
        Some(([0.0, x_max.max(1.0)], [y_min - pad, y_max + pad]))
    }
}

impl Widget for ColumnChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Plotters fails to lay out very small areas; show a hint instead.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;
        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                .set_label_area_size(LabelAreaPosition::Left, 8)
                .set_label_area_size(LabelAreaPosition::Bottom, 2)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            // Mesh lines clutter low-resolution terminal rendering; axes and labels suffice.
            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc("row")
                .y_desc(self.y_label)
                .x_labels(5)
                .y_labels(5)
                .x_label_formatter(&|v| format!("{v:.0}"))
                .y_label_formatter(&|v| fmt_axis_y(*v))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            let line_color = RGBColor(0, 255, 255);
            let outlier_color = RGBColor(255, 0, 0);

            chart.draw_series(LineSeries::new(self.line.iter().copied(), &line_color))?;

            // `Circle` radii are mis-scaled by the ratatui backend; a colored pixel reads fine.
            chart.draw_series(self.outliers.iter().map(|&(x, y)| Pixel::new((x, y), outlier_color)))?;

            Ok(())
        });

        widget.render(area, buf);
    }
}

fn fmt_axis_y(v: f64) -> String {
    let a = v.abs();
    if a >= 1e9 {
        format!("{:.1}B", v / 1e9)
    } else if a >= 1e6 {
        format!("{:.1}M", v / 1e6)
    } else if a >= 1e4 {
        format!("{:.0}K", v / 1e3)
    } else {
        format!("{v:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_pad_and_handle_flat_series() {
        let (x, y) = ColumnChart::fit_bounds(&[(0.0, 10.0), (4.0, 50.0)]).unwrap();
        assert_eq!(x, [0.0, 4.0]);
        assert!((y[0] - 8.0).abs() < 1e-12 && (y[1] - 52.0).abs() < 1e-12);

        let (x, y) = ColumnChart::fit_bounds(&[(0.0, 5.0)]).unwrap();
        assert_eq!(x, [0.0, 1.0]);
        assert!(y[0] < 5.0 && y[1] > 5.0);

        assert!(ColumnChart::fit_bounds(&[]).is_none());
    }

    #[test]
    fn axis_labels_abbreviate_large_values() {
        assert_eq!(fmt_axis_y(2_500_000_000.0), "2.5B");
        assert_eq!(fmt_axis_y(1_200_000.0), "1.2M");
        assert_eq!(fmt_axis_y(150.25), "150.25");
    }
}
