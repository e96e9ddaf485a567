//! Forecast projection for upcoming courses.
//!
//! The analytics endpoint normally ships a forecast for every upcoming course.
//! Snapshots from older backends (and hand-edited fixtures) may not, so with
//! `--project` we fill the gap locally: fit a line to the tail of the actual
//! series and walk it forward to the course start in fixed steps.
//!
//! Projected values never decrease and the first projected point is the last
//! actual point itself, so the merged chart bridges cleanly.

use tracing::debug;

use crate::domain::{ProductSeries, SeriesPoint, TimelineConfig, sort_series};
use crate::math::fit_line;

/// Day the projection runs to (the course start).
pub const PROJECTION_HORIZON: i64 = 0;

/// Most points a single projection emits; longer runs widen the step.
pub const MAX_PROJECTION_POINTS: i64 = 500;

/// Project cumulative sales from the last actual point down to `horizon`.
///
/// `actual` must be in chronological order. Returns an empty series when there
/// is nothing to project (no data, already at/after `horizon`, too few points).
pub fn project_forecast(actual: &[SeriesPoint], horizon: i64, step: i64, window: usize) -> Vec<SeriesPoint> {
    let Some(&last) = actual.last() else {
        return Vec::new();
    };
    if last.days_before <= horizon || step <= 0 {
        return Vec::new();
    }
    let Some(span) = last.days_before.checked_sub(horizon) else {
        return Vec::new();
    };
    let step = step.max(span / MAX_PROJECTION_POINTS + 1);

    let tail = &actual[actual.len().saturating_sub(window.max(2))..];
    // x runs forward in time.
    let x_of = |days_before: i64| -(days_before as f64);
    let xy: Vec<(f64, f64)> = tail
        .iter()
        .map(|p| (x_of(p.days_before), p.cumulative as f64))
        .collect();
    let Some(fit) = fit_line(&xy) else {
        return Vec::new();
    };
    let anchor = fit.at(x_of(last.days_before));

    let mut out = vec![last];
    let mut d = last.days_before;
    let mut prev = last.cumulative;
    while d > horizon {
        d = d.saturating_sub(step).max(horizon);
        // Fitted gain since the last point, anchored on its observed value.
        let projected = (last.cumulative as f64 + fit.at(x_of(d)) - anchor).round();
        let value = if projected.is_finite() && projected > 0.0 {
            (projected as u64).max(prev)
        } else {
            prev
        };
        out.push(SeriesPoint::new(d, value));
        prev = value;
    }
    out
}

/// Fill empty forecasts of upcoming products in place.
///
/// Returns the number of products that received a projection.
pub fn fill_missing_forecasts(products: &mut [ProductSeries], config: &TimelineConfig) -> usize {
    let mut filled = 0;
    for p in products.iter_mut() {
        if !p.meta.is_upcoming || !p.forecast_series.is_empty() || p.actual_series.is_empty() {
            continue;
        }
        let mut actual = p.actual_series.clone();
        sort_series(&mut actual);
        let projected = project_forecast(
            &actual,
            PROJECTION_HORIZON,
            config.project_step,
            config.project_window,
        );
        if projected.is_empty() {
            continue;
        }
        debug!(product = %p.product_id, points = projected.len(), "projected forecast");
        p.forecast_series = projected;
        filled += 1;
    }
    filled
}
