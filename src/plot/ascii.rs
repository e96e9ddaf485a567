//! ASCII plotting for terminal output.
//!
//! Fixed-size grid, deterministic output (helpful for golden tests).
//!
//! Plot elements:
//! - actual line: one uppercase letter per product (`A`, `B`, ...)
//! - forecast line: the same letter in lowercase, drawn only into blank cells

use crate::domain::{MergedTimeline, SeriesKind};
use crate::report::NO_DATA;

/// Render every product of a merged view on one grid.
///
/// The x axis runs from the largest `days_before` (left) to the smallest
/// (right); the y axis from zero to the largest cumulative value.
pub fn render_timeline_plot(merged: &MergedTimeline, width: usize, height: usize) -> String {
    let (Some(&d_max), Some(&d_min)) = (merged.axis.first(), merged.axis.last()) else {
        return format!("{NO_DATA}\n");
    };
    let width = width.max(10);
    let height = height.max(5);
    let y_max = merged.max_value().unwrap_or(0).max(1) as f64;

    let mut grid = vec![vec![' '; width]; height];

    // Actual lines first so forecasts never cover them.
    for kind in [SeriesKind::Actual, SeriesKind::Forecast] {
        for (i, p) in merged.products.iter().enumerate() {
            let ch = match kind {
                SeriesKind::Actual => glyph(i),
                SeriesKind::Forecast => glyph(i).to_ascii_lowercase(),
            };
            let cells: Vec<(usize, usize)> = merged
                .column(&p.product_id, kind)
                .into_iter()
                .map(|(d, v)| {
                    (
                        map_x(d, d_max, d_min, width),
                        map_y(v as f64, y_max, height),
                    )
                })
                .collect();
            draw_polyline(&mut grid, &cells, ch);
        }
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: days_before=[{d_max}, {d_min}] | sales=[0, {}]\n",
        y_max as u64
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    for (i, p) in merged.products.iter().enumerate() {
        let g = glyph(i);
        out.push_str(&format!(
            "{g}/{} {}: {}\n",
            g.to_ascii_lowercase(),
            p.product_id,
            p.product_name
        ));
    }
    out
}

/// Product glyphs cycle through `A..=Z`.
pub fn glyph(index: usize) -> char {
    (b'A' + (index % 26) as u8) as char
}

fn map_x(d: i64, d_max: i64, d_min: i64, width: usize) -> usize {
    let width = width.max(2);
    if d_max == d_min {
        return 0;
    }
    // i128 so a span wider than i64 (e.g. i64::MAX to i64::MIN) cannot wrap.
    let span = (d_max as i128 - d_min as i128) as f64;
    let u = ((d_max as i128 - d as i128) as f64 / span).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = (y / y_max).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_polyline(grid: &mut [Vec<char>], cells: &[(usize, usize)], ch: char) {
    let mut prev = None;
    for &(x, y) in cells {
        match prev {
            Some((x0, y0)) => draw_line(grid, x0, y0, x, y, ch),
            None => draw_line(grid, x, y, x, y, ch),
        }
        prev = Some((x, y));
    }
}

/// Integer line drawing (Bresenham-ish). Only blank cells are written.
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
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
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
