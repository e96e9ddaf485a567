//! Day-axis unification.

use std::collections::BTreeSet;

use crate::domain::ProductSeries;

/// Collect every `days_before` value across all actual and forecast series,
/// plus each product's forecast lead-in day (see [`lead_in_day`]).
///
/// The result is deduplicated and strictly descending: the furthest point from
/// the course start comes first, so walking the axis moves forward in time.
pub fn unify_axis(products: &[ProductSeries]) -> Vec<i64> {
    let mut days: BTreeSet<i64> = products
        .iter()
        .flat_map(|p| p.actual_series.iter().chain(p.forecast_series.iter()))
        .map(|pt| pt.days_before)
        .collect();
    days.extend(products.iter().filter_map(lead_in_day));
    days.into_iter().rev().collect()
}

/// One forecast step before the bridge day, on the actual side.
///
/// The step is the gap between the two earliest forecast days. The lead-in is
/// `last actual day + step`, kept only when it falls strictly between the last
/// two actual days, so the flat stretch the actual line holds before the
/// forecast takes over lands on the forecast cadence. `None` for products
/// without both series, with fewer than two actual points, or with a one-point
/// forecast.
pub fn lead_in_day(product: &ProductSeries) -> Option<i64> {
    let actual: BTreeSet<i64> = product.actual_series.iter().map(|p| p.days_before).collect();
    let forecast: BTreeSet<i64> = product.forecast_series.iter().map(|p| p.days_before).collect();

    let mut actual_days = actual.iter().copied();
    let last = actual_days.next()?;
    let previous = actual_days.next()?;

    let mut forecast_days = forecast.iter().rev().copied();
    let first = forecast_days.next()?;
    let second = forecast_days.next()?;
    let step = first.checked_sub(second)?;

    let lead = last.checked_add(step)?;
    (lead < previous).then_some(lead)
}

/// Position of `days_before` in a descending axis.
pub fn axis_index(axis: &[i64], days_before: i64) -> Option<usize> {
    axis.binary_search_by(|d| days_before.cmp(d)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ProductMeta, SeriesPoint};

    fn product(id: &str, actual: &[(i64, u64)], forecast: &[(i64, u64)]) -> ProductSeries {
        ProductSeries {
            product_id: id.to_string(),
            product_name: id.to_string(),
            actual_series: actual.iter().map(|&(d, c)| SeriesPoint::new(d, c)).collect(),
            forecast_series: forecast.iter().map(|&(d, c)| SeriesPoint::new(d, c)).collect(),
            meta: ProductMeta::default(),
        }
    }

    #[test]
    fn empty_input_gives_empty_axis() {
        assert!(unify_axis(&[]).is_empty());
        assert!(unify_axis(&[product("a", &[], &[])]).is_empty());
    }

    #[test]
    fn axis_is_strictly_descending_union() {
        let products = vec![
            product("a", &[(30, 5), (10, 40), (0, 100)], &[(0, 100), (-5, 130)]),
            product("b", &[(45, 1), (10, 2)], &[]),
            product("c", &[], &[(7, 3), (-5, 9)]),
        ];
        let axis = unify_axis(&products);
        // 5 is a's lead-in: last actual day 0 plus its 5-day forecast step.
        assert_eq!(axis, vec![45, 30, 10, 7, 5, 0, -5]);
        assert!(axis.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn lead_in_follows_the_forecast_step() {
        let a = product("A", &[(30, 5), (10, 40), (0, 100)], &[(0, 100), (-5, 130), (-10, 160)]);
        assert_eq!(lead_in_day(&a), Some(5));
        assert_eq!(unify_axis(&[a]), vec![30, 10, 5, 0, -5, -10]);

        // Unsorted input gives the same day.
        let shuffled = product("A", &[(0, 100), (30, 5), (10, 40)], &[(-10, 160), (0, 100), (-5, 130)]);
        assert_eq!(lead_in_day(&shuffled), Some(5));
    }

    #[test]
    fn no_lead_in_without_room_or_cadence() {
        // Step reaches the previous actual day.
        assert_eq!(lead_in_day(&product("x", &[(20, 1), (10, 4)], &[(10, 4), (0, 9)])), None);
        // Single actual point.
        assert_eq!(lead_in_day(&product("x", &[(10, 4)], &[(10, 4), (0, 9)])), None);
        // Single forecast point.
        assert_eq!(lead_in_day(&product("x", &[(30, 1), (10, 4)], &[(10, 4)])), None);
        // Actual only.
        assert_eq!(lead_in_day(&product("x", &[(30, 1), (10, 4)], &[])), None);
    }

    #[test]
    fn lead_in_near_i64_limits_does_not_overflow() {
        let p = product("x", &[(i64::MAX, 1), (i64::MAX - 1, 2)], &[(i64::MAX, 2), (i64::MIN, 3)]);
        assert_eq!(lead_in_day(&p), None);
    }

    #[test]
    fn axis_index_finds_points_in_descending_axis() {
        let axis = vec![30, 10, 5, 0, -5, -10];
        assert_eq!(axis_index(&axis, 30), Some(0));
        assert_eq!(axis_index(&axis, 0), Some(3));
        assert_eq!(axis_index(&axis, -10), Some(5));
        assert_eq!(axis_index(&axis, 7), None);
    }
}
