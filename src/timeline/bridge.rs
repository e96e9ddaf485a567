//! Forecast bridging.
//!
//! A forecast line is drawn as a continuation of the actual line. The bridge
//! injects the last actual observation as a forecast sample at the same axis
//! point so the two lines meet without a gap or a jump.

use crate::domain::SeriesPoint;
use crate::timeline::axis::axis_index;

/// The point the forecast must start from, if the product has both series.
///
/// Both series must be in chronological order.
pub fn bridge_point(actual: &[SeriesPoint], forecast: &[SeriesPoint]) -> Option<SeriesPoint> {
    if forecast.is_empty() {
        return None;
    }
    actual.last().copied()
}

/// Write the bridge into a forecast column aligned with `axis`.
///
/// Returns `false` (and leaves the column untouched) when the bridge day is not
/// on the axis.
pub fn apply_bridge(axis: &[i64], forecast: &mut [Option<u64>], bridge: SeriesPoint) -> bool {
    match axis_index(axis, bridge.days_before) {
        Some(i) if i < forecast.len() => {
            forecast[i] = Some(bridge.cumulative);
            true
        }
        _ => false,
    }
}

/// Where the forecast series has a point on the same day as an actual point,
/// the forecast cell takes the actual value.
pub fn apply_actual_precedence(
    axis: &[i64],
    actual_series: &[SeriesPoint],
    forecast_series: &[SeriesPoint],
    forecast: &mut [Option<u64>],
) {
    for f in forecast_series {
        let Some(a) = actual_series
            .iter()
            .rev()
            .find(|a| a.days_before == f.days_before)
        else {
            continue;
        };
        if let Some(i) = axis_index(axis, a.days_before) {
            if i < forecast.len() {
                forecast[i] = Some(a.cumulative);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(points: &[(i64, u64)]) -> Vec<SeriesPoint> {
        points.iter().map(|&(d, c)| SeriesPoint::new(d, c)).collect()
    }

    #[test]
    fn bridge_needs_both_series() {
        assert_eq!(bridge_point(&series(&[(5, 1)]), &[]), None);
        assert_eq!(bridge_point(&[], &series(&[(0, 2)])), None);
        assert_eq!(
            bridge_point(&series(&[(9, 1), (4, 3)]), &series(&[(0, 6)])),
            Some(SeriesPoint::new(4, 3))
        );
    }

    #[test]
    fn bridge_overwrites_the_forecast_cell() {
        let axis = vec![10, 4, 0];
        let mut col = vec![None, None, Some(6)];
        assert!(apply_bridge(&axis, &mut col, SeriesPoint::new(4, 3)));
        assert_eq!(col, vec![None, Some(3), Some(6)]);
    }

    #[test]
    fn bridge_off_axis_is_a_no_op() {
        let axis = vec![10, 0];
        let mut col = vec![None, Some(6)];
        assert!(!apply_bridge(&axis, &mut col, SeriesPoint::new(4, 3)));
        assert_eq!(col, vec![None, Some(6)]);
    }

    #[test]
    fn shared_days_take_the_actual_value() {
        let axis = vec![10, 5, 0];
        let actual = vec![SeriesPoint::new(10, 2), SeriesPoint::new(5, 8)];
        let forecast = vec![SeriesPoint::new(5, 11), SeriesPoint::new(0, 20)];
        let mut col = vec![None, Some(11), Some(20)];
        apply_actual_precedence(&axis, &actual, &forecast, &mut col);
        assert_eq!(col, vec![None, Some(8), Some(20)]);
    }
}
