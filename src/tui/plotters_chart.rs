//! Plotters-powered purchase timeline chart widget for Ratatui.
//!
//! Plotters gives nicer axis rendering than Ratatui's built-in `Chart`, and we
//! draw it into the Ratatui buffer using `plotters-ratatui-backend`.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// One drawable run of consecutive non-null samples.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSegment {
    /// `(x, y)` with `x = -days_before`, so time runs left to right.
    pub points: Vec<(f64, f64)>,
    pub color: RGBColor,
}

/// A render-only chart description.
///
/// All segments and bounds are computed outside the render call, which keeps
/// `render()` focused on drawing.
pub struct TimelinePlottersChart<'a> {
    pub segments: &'a [ChartSegment],
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
}

impl Widget for TimelinePlottersChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Plotters may fail to build a chart in a tiny area.
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
                .build_cartesian_2d(x0..x1, y0..y1)?;

            // Tick labels are drawn by the caller in terminal cells; Plotters
            // only draws the axes here.
            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .axis_style(&WHITE)
                .draw()?;

            for seg in self.segments {
                if let [only] = seg.points.as_slice() {
                    chart.draw_series(std::iter::once(Pixel::new(*only, seg.color)))?;
                } else {
                    chart.draw_series(LineSeries::new(seg.points.iter().copied(), &seg.color))?;
                }
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}
