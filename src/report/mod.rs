//! Reporting utilities: per-product summary stats and top-N rankings.

use crate::domain::{MergedTimeline, PaceRating, ProductInfo, SeriesKind};

pub mod format;

pub use format::*;

/// Side-panel stats for one product.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductStats {
    pub product_id: String,
    pub product_name: String,
    pub total_sales: u64,
    pub total_revenue_cents: i64,
    pub avg_price_cents: i64,
    pub sales_target: Option<u64>,
    /// `total_sales / sales_target` in percent.
    pub target_pct: Option<f64>,
    pub rating: Option<PaceRating>,
    pub is_upcoming: bool,
    pub days_until_start: Option<i64>,
    pub median_days_before: Option<f64>,
    /// `(days_before, cumulative)` of the last sampled actual value.
    pub last_actual: Option<(i64, u64)>,
    /// Final value of the forecast line, if any.
    pub forecast_final: Option<u64>,
}

/// One entry of the top-N list.
#[derive(Debug, Clone, PartialEq)]
pub struct TopEntry {
    pub product_id: String,
    pub product_name: String,
    pub total_sales: u64,
    /// Share of all listed products' sales, in percent.
    pub share_pct: f64,
}

/// Summary of a merged view.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub products: Vec<ProductStats>,
    pub top: Vec<TopEntry>,
    pub total_sales: u64,
    pub total_revenue_cents: i64,
}

/// Compute per-product stats and the top-N list for a merged timeline.
pub fn summarize(merged: &MergedTimeline, top_n: usize) -> Summary {
    let products: Vec<ProductStats> = merged.products.iter().map(|p| product_stats(merged, p)).collect();
    let total_sales: u64 = products.iter().map(|p| p.total_sales).sum();
    let total_revenue_cents: i64 = products.iter().map(|p| p.total_revenue_cents).sum();
    let top = top_products(&products, top_n, total_sales);

    Summary {
        products,
        top,
        total_sales,
        total_revenue_cents,
    }
}

fn product_stats(merged: &MergedTimeline, info: &ProductInfo) -> ProductStats {
    let meta = &info.meta;
    let target_pct = meta
        .sales_target
        .filter(|&t| t > 0)
        .map(|t| percentage(meta.total_sales, t));

    ProductStats {
        product_id: info.product_id.clone(),
        product_name: info.product_name.clone(),
        total_sales: meta.total_sales,
        total_revenue_cents: meta.total_revenue_cents,
        avg_price_cents: meta.avg_price_cents,
        sales_target: meta.sales_target,
        target_pct,
        rating: meta.rating,
        is_upcoming: meta.is_upcoming,
        days_until_start: meta.days_until_start,
        median_days_before: meta.median_days_before,
        last_actual: merged.column(&info.product_id, SeriesKind::Actual).last().copied(),
        forecast_final: merged
            .column(&info.product_id, SeriesKind::Forecast)
            .last()
            .map(|&(_, v)| v),
    }
}

/// Rank products by total sales (ties keep input order).
pub fn top_products(products: &[ProductStats], top_n: usize, total_sales: u64) -> Vec<TopEntry> {
    let mut sorted: Vec<&ProductStats> = products.iter().collect();
    sorted.sort_by(|a, b| b.total_sales.cmp(&a.total_sales));
    sorted
        .into_iter()
        .take(top_n)
        .map(|p| TopEntry {
            product_id: p.product_id.clone(),
            product_name: p.product_name.clone(),
            total_sales: p.total_sales,
            share_pct: percentage(p.total_sales, total_sales),
        })
        .collect()
}

/// `part / whole` in percent; zero when `whole` is zero.
pub fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
