//! Row assembly: axis + sampled columns + bridge -> chart rows.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashSet};

use crate::domain::{
    MergedRow, MergedTimeline, ProductInfo, ProductSeries, SampleCell, SeriesPoint, is_chronological, sort_series,
};
use crate::timeline::axis::unify_axis;
use crate::timeline::bridge::{apply_actual_precedence, apply_bridge, bridge_point};
use crate::timeline::sampler::sample_column;

/// Sampled columns for a single product, aligned with the axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductColumns {
    pub actual: Vec<Option<u64>>,
    pub forecast: Vec<Option<u64>>,
    /// Whether the forecast bridge landed on the axis.
    pub bridged: bool,
}

/// Merge product timelines into one row per axis point.
///
/// The input is only read. Series that are not in chronological order are
/// sorted on a private copy before sampling.
pub fn merge_timeline(products: &[ProductSeries]) -> MergedTimeline {
    let axis = unify_axis(products);

    let columns: Vec<ProductColumns> = products.iter().map(|p| product_columns(p, &axis)).collect();

    let rows = axis
        .iter()
        .enumerate()
        .map(|(i, &days_before)| {
            let mut cells = BTreeMap::new();
            for (product, cols) in products.iter().zip(&columns) {
                // Duplicate ids keep the first product's column.
                cells.entry(product.product_id.clone()).or_insert(SampleCell {
                    actual: cols.actual[i],
                    forecast: cols.forecast[i],
                });
            }
            MergedRow { days_before, cells }
        })
        .collect();

    MergedTimeline {
        axis,
        rows,
        products: unique_infos(products),
    }
}

fn unique_infos(products: &[ProductSeries]) -> Vec<ProductInfo> {
    let mut seen = HashSet::new();
    products
        .iter()
        .filter(|p| seen.insert(p.product_id.as_str()))
        .map(ProductSeries::info)
        .collect()
}

/// Sample one product's actual and forecast columns against `axis`.
pub fn product_columns(product: &ProductSeries, axis: &[i64]) -> ProductColumns {
    let actual_series = chronological(&product.actual_series);
    let forecast_series = chronological(&product.forecast_series);

    let actual = sample_column(&actual_series, axis);
    let mut forecast = sample_column(&forecast_series, axis);

    apply_actual_precedence(axis, &actual_series, &forecast_series, &mut forecast);

    let bridged = match bridge_point(&actual_series, &forecast_series) {
        Some(bridge) => apply_bridge(axis, &mut forecast, bridge),
        None => false,
    };

    ProductColumns {
        actual,
        forecast,
        bridged,
    }
}

fn chronological(series: &[SeriesPoint]) -> Cow<'_, [SeriesPoint]> {
    if is_chronological(series) {
        Cow::Borrowed(series)
    } else {
        let mut owned = series.to_vec();
        sort_series(&mut owned);
        Cow::Owned(owned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ProductMeta;

    fn product(id: &str, actual: &[(i64, u64)], forecast: &[(i64, u64)]) -> ProductSeries {
        ProductSeries {
            product_id: id.to_string(),
            product_name: format!("Course {id}"),
            actual_series: actual.iter().map(|&(d, c)| SeriesPoint::new(d, c)).collect(),
            forecast_series: forecast.iter().map(|&(d, c)| SeriesPoint::new(d, c)).collect(),
            meta: ProductMeta::default(),
        }
    }

    fn scenario_a() -> ProductSeries {
        product(
            "A",
            &[(30, 5), (10, 40), (0, 100)],
            &[(0, 100), (-5, 130), (-10, 160)],
        )
    }

    #[test]
    fn literal_scenario_single_product() {
        let merged = merge_timeline(&[scenario_a()]);
        assert_eq!(merged.axis, vec![30, 10, 5, 0, -5, -10]);

        let actual: Vec<_> = merged.rows.iter().map(|r| r.actual("A")).collect();
        assert_eq!(actual, vec![Some(5), Some(40), Some(40), Some(100), None, None]);

        let forecast: Vec<_> = merged.rows.iter().map(|r| r.forecast("A")).collect();
        assert_eq!(forecast, vec![None, None, None, Some(100), Some(130), Some(160)]);
    }

    #[test]
    fn empty_input_gives_no_rows() {
        let merged = merge_timeline(&[]);
        assert!(merged.axis.is_empty());
        assert!(merged.rows.is_empty());
        assert!(merged.is_empty());
    }

    #[test]
    fn actual_only_product_never_gets_a_forecast() {
        let done = product("done", &[(60, 3), (20, 18), (0, 25)], &[]);
        let merged = merge_timeline(std::slice::from_ref(&done));
        assert!(merged.rows.iter().all(|r| r.forecast("done").is_none()));
        assert!(!product_columns(&done, &merged.axis).bridged);
    }

    #[test]
    fn bridge_meets_the_last_actual_point() {
        // Forecast starts later than the last actual observation.
        let p = product("up", &[(40, 2), (12, 9)], &[(10, 11), (0, 20)]);
        let merged = merge_timeline(std::slice::from_ref(&p));
        let row = merged.rows.iter().find(|r| r.days_before == 12).unwrap();
        assert_eq!(row.actual("up"), Some(9));
        assert_eq!(row.forecast("up"), Some(9));
        assert!(product_columns(&p, &merged.axis).bridged);
    }

    #[test]
    fn actual_wins_where_both_series_share_a_day() {
        let p = product("x", &[(20, 4), (10, 9), (5, 12)], &[(10, 15), (5, 14), (0, 30)]);
        let merged = merge_timeline(&[p]);
        let at = |d: i64| merged.rows.iter().find(|r| r.days_before == d).unwrap().cell("x");
        assert_eq!(at(10).forecast, Some(9));
        assert_eq!(at(5).forecast, Some(12));
        assert_eq!(at(0).forecast, Some(30));
    }

    #[test]
    fn products_do_not_blank_each_other() {
        let merged = merge_timeline(&[scenario_a(), product("empty", &[], &[])]);
        assert_eq!(merged.rows.len(), 6);
        assert!(merged.rows.iter().all(|r| r.cell("empty") == SampleCell::default()));
        assert_eq!(merged.rows[0].actual("A"), Some(5));
        assert_eq!(merged.products.len(), 2);
    }

    #[test]
    fn removing_a_product_only_changes_its_columns() {
        let a = scenario_a();
        let b = product("B", &[(45, 1), (12, 6), (3, 8)], &[(3, 8), (-4, 14)]);
        let both = merge_timeline(&[a.clone(), b]);
        let only_a = merge_timeline(&[a]);

        for row in &only_a.rows {
            let full = both
                .rows
                .iter()
                .find(|r| r.days_before == row.days_before)
                .unwrap();
            assert_eq!(full.cell("A"), row.cell("A"), "d={}", row.days_before);
        }
    }

    #[test]
    fn unsorted_input_is_handled_without_mutating_it() {
        let mut p = scenario_a();
        p.actual_series.reverse();
        p.forecast_series.swap(0, 2);
        let before = p.clone();

        let merged = merge_timeline(std::slice::from_ref(&p));
        assert_eq!(p, before);
        assert_eq!(merged, merge_timeline(&[scenario_a()]));
    }

    #[test]
    fn merge_is_idempotent() {
        let input = vec![
            scenario_a(),
            product("B", &[(45, 1), (12, 6), (3, 8)], &[(3, 8), (-4, 14)]),
        ];
        assert_eq!(merge_timeline(&input), merge_timeline(&input));
    }

    #[test]
    fn sampled_actuals_accumulate_forward_in_time() {
        let input = vec![
            product("A", &[(50, 0), (33, 4), (21, 4), (8, 19), (1, 27)], &[(1, 27), (-3, 40)]),
            product("B", &[(70, 2), (40, 9), (12, 30)], &[]),
        ];
        let merged = merge_timeline(&input);
        for id in ["A", "B"] {
            let mut prev: Option<u64> = None;
            for row in &merged.rows {
                if let Some(v) = row.actual(id) {
                    if let Some(p) = prev {
                        assert!(v >= p, "{id} decreased at d={}", row.days_before);
                    }
                    prev = Some(v);
                }
            }
        }
    }

    #[test]
    fn duplicate_ids_keep_the_first_product() {
        let first = product("a", &[(10, 1)], &[]);
        let second = product("a", &[(10, 9), (5, 12)], &[]);
        let merged = merge_timeline(&[first, second]);
        assert_eq!(merged.products.len(), 1);
        assert_eq!(merged.rows[0].actual("a"), Some(1));
    }
}
