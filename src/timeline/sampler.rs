//! Step-forward sampling of cumulative series.
//!
//! A series is a step function in time: the value "as of" day `d` is the most
//! recent observation at or before `d` in calendar terms, which is the last
//! point (in chronological order) whose `days_before >= d`.
//!
//! A series only covers its own observed window. Past its final point the
//! sample is `None` rather than a carried value, so an actual line stops where
//! observation stops and a forecast line does not leak back before it begins.

use crate::domain::SeriesPoint;

/// Sample `series` at axis point `d`.
///
/// `series` must be in decreasing `days_before` order. Single-point lookup;
/// the merge uses [`sample_column`], which walks the series once per axis.
pub fn sample_at(series: &[SeriesPoint], d: i64) -> Option<u64> {
    let last = series.last()?;
    if d < last.days_before {
        return None;
    }
    // Points with days_before >= d form a prefix of a descending series.
    let n = series.partition_point(|p| p.days_before >= d);
    n.checked_sub(1).map(|i| series[i].cumulative)
}

/// Sample `series` at every point of a descending axis.
///
/// Equivalent to calling [`sample_at`] per axis point, but walks the series once.
pub fn sample_column(series: &[SeriesPoint], axis: &[i64]) -> Vec<Option<u64>> {
    let Some(last) = series.last() else {
        return vec![None; axis.len()];
    };

    let mut out = Vec::with_capacity(axis.len());
    let mut cursor = 0usize;
    let mut current: Option<u64> = None;
    for &d in axis {
        while cursor < series.len() && series[cursor].days_before >= d {
            current = Some(series[cursor].cumulative);
            cursor += 1;
        }
        out.push(if d < last.days_before { None } else { current });
    }
    out
}
