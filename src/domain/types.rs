//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - parsed straight from the analytics endpoint (camelCase JSON)
//! - merged in-memory into chart rows
//! - written back out as snapshots and exports

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Largest `|days_before|` accepted from any source (about 270 years).
pub const MAX_ABS_DAYS_BEFORE: i64 = 100_000;

/// One observation of cumulative sales, counted in days before the course start.
///
/// Larger `days_before` is further in the past. Zero is the start day, negative
/// values are after the course started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPoint {
    pub days_before: i64,
    pub cumulative: u64,
}

impl SeriesPoint {
    pub fn new(days_before: i64, cumulative: u64) -> Self {
        Self {
            days_before,
            cumulative,
        }
    }
}

/// Sales pace relative to target, as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaceRating {
    Ahead,
    OnTrack,
    Behind,
}

impl PaceRating {
    /// Parse the wire label. Unknown labels yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "ahead" => Some(PaceRating::Ahead),
            "on_track" | "ontrack" => Some(PaceRating::OnTrack),
            "behind" => Some(PaceRating::Behind),
            _ => None,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            PaceRating::Ahead => "ahead",
            PaceRating::OnTrack => "on track",
            PaceRating::Behind => "behind",
        }
    }
}

/// Scalar metadata shown next to the chart. Passed through the merge unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductMeta {
    pub total_sales: u64,
    pub total_revenue_cents: i64,
    pub sales_target: Option<u64>,
    pub is_upcoming: bool,
    pub rating: Option<PaceRating>,
    pub avg_price_cents: i64,
    pub days_until_start: Option<i64>,
    /// Median purchase lead time, only reported for completed courses.
    pub median_days_before: Option<f64>,
}

/// Per-product timeline as delivered by the analytics endpoint.
///
/// After ingest both series are ordered by decreasing `days_before`
/// (chronological order, moving toward the course start).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSeries {
    pub product_id: String,
    pub product_name: String,
    pub actual_series: Vec<SeriesPoint>,
    pub forecast_series: Vec<SeriesPoint>,
    #[serde(flatten)]
    pub meta: ProductMeta,
}

impl ProductSeries {
    /// Sort both series into decreasing `days_before` order (stable).
    pub fn normalize(&mut self) {
        sort_series(&mut self.actual_series);
        sort_series(&mut self.forecast_series);
    }

    pub fn info(&self) -> ProductInfo {
        ProductInfo {
            product_id: self.product_id.clone(),
            product_name: self.product_name.clone(),
            meta: self.meta.clone(),
        }
    }
}

/// Stable sort into decreasing `days_before` order.
pub fn sort_series(series: &mut [SeriesPoint]) {
    series.sort_by(|a, b| b.days_before.cmp(&a.days_before));
}

/// Whether a series is already in decreasing `days_before` order.
pub fn is_chronological(series: &[SeriesPoint]) -> bool {
    series.is_sorted_by(|a, b| a.days_before >= b.days_before)
}

/// Product identity plus pass-through metadata for side panels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInfo {
    pub product_id: String,
    pub product_name: String,
    pub meta: ProductMeta,
}

/// Actual and forecast samples for one product at one axis point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleCell {
    pub actual: Option<u64>,
    pub forecast: Option<u64>,
}

/// One row of the merged chart table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedRow {
    pub days_before: i64,
    pub cells: BTreeMap<String, SampleCell>,
}

impl MergedRow {
    /// Cell for a product. Unknown ids read as an empty cell.
    pub fn cell(&self, product_id: &str) -> SampleCell {
        self.cells.get(product_id).copied().unwrap_or_default()
    }

    pub fn actual(&self, product_id: &str) -> Option<u64> {
        self.cell(product_id).actual
    }

    pub fn forecast(&self, product_id: &str) -> Option<u64> {
        self.cell(product_id).forecast
    }
}

/// Output of the merge: the unified axis, one row per axis point, and the
/// products in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergedTimeline {
    pub axis: Vec<i64>,
    pub rows: Vec<MergedRow>,
    pub products: Vec<ProductInfo>,
}

impl MergedTimeline {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// `(days_before, value)` pairs of one product column, skipping nulls.
    pub fn column(&self, product_id: &str, kind: SeriesKind) -> Vec<(i64, u64)> {
        self.rows
            .iter()
            .filter_map(|row| {
                let cell = row.cell(product_id);
                let v = match kind {
                    SeriesKind::Actual => cell.actual,
                    SeriesKind::Forecast => cell.forecast,
                };
                v.map(|v| (row.days_before, v))
            })
            .collect()
    }

    /// Largest sampled value across all cells.
    pub fn max_value(&self) -> Option<u64> {
        self.rows
            .iter()
            .flat_map(|r| r.cells.values())
            .flat_map(|c| [c.actual, c.forecast])
            .flatten()
            .max()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesKind {
    Actual,
    Forecast,
}

/// Which products a view shows.
///
/// `All` means no filter. `Only` with an empty set selects nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ProductFilter {
    #[default]
    All,
    Only(BTreeSet<String>),
}

impl ProductFilter {
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ProductFilter::Only(ids.into_iter().map(Into::into).collect())
    }

    pub fn allows(&self, product_id: &str) -> bool {
        match self {
            ProductFilter::All => true,
            ProductFilter::Only(ids) => ids.contains(product_id),
        }
    }

    pub fn apply(&self, products: &[ProductSeries]) -> Vec<ProductSeries> {
        products
            .iter()
            .filter(|p| self.allows(&p.product_id))
            .cloned()
            .collect()
    }

    pub fn label(&self) -> String {
        match self {
            ProductFilter::All => "all".to_string(),
            ProductFilter::Only(ids) if ids.is_empty() => "none".to_string(),
            ProductFilter::Only(ids) => ids.iter().cloned().collect::<Vec<_>>().join(","),
        }
    }
}

/// Where a run reads its product timelines from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpec {
    /// The backend analytics endpoint (`PTL_API_URL`).
    Api,
    /// A snapshot JSON written by `ptl snapshot`.
    Snapshot(PathBuf),
    /// Seeded synthetic catalogue.
    Demo { seed: u64 },
}

impl SourceSpec {
    pub fn label(&self) -> String {
        match self {
            SourceSpec::Api => "api".to_string(),
            SourceSpec::Snapshot(path) => format!("snapshot {}", path.display()),
            SourceSpec::Demo { seed } => format!("demo (seed {seed})"),
        }
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct TimelineConfig {
    pub source: SourceSpec,
    pub filter: ProductFilter,
    /// Fill in missing forecasts for upcoming products.
    pub project: bool,
    /// Forecast projection step (days).
    pub project_step: i64,
    /// Number of trailing actual points used by the projection fit.
    pub project_window: usize,

    pub top_n: usize,
    /// Cap on printed table rows (0 = all).
    pub max_rows: usize,
    pub plot_width: usize,
    pub plot_height: usize,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            source: SourceSpec::Api,
            filter: ProductFilter::All,
            project: false,
            project_step: 5,
            project_window: 6,
            top_n: 5,
            max_rows: 0,
            plot_width: 100,
            plot_height: 25,
        }
    }
}
