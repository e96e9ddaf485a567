//! Timeline response ingest and normalization.
//!
//! This module turns the analytics endpoint's JSON into clean `ProductSeries`
//! values that are safe to merge.
//!
//! Design goals:
//! - **Point-level tolerance**: a malformed series point is skipped and
//!   reported, never fatal, so one bad product does not blank the chart
//! - **Explicit ordering**: series are sorted into chronological order here
//!   instead of trusting the backend
//! - **Separation of concerns**: no merge logic here

use std::collections::HashSet;

use serde_json::{Map, Value};
use tracing::warn;

use crate::domain::{MAX_ABS_DAYS_BEFORE, PaceRating, ProductMeta, ProductSeries, SeriesKind, SeriesPoint};
use crate::error::AppError;

/// Something skipped during ingest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedPoint {
    /// Product id when known, else `#<index>` of the product in the response.
    pub product: String,
    /// `None` when the whole product was skipped.
    pub series: Option<SeriesKind>,
    /// Index of the point within its series.
    pub index: Option<usize>,
    pub message: String,
}

/// Ingest output: normalized products + everything that was dropped.
#[derive(Debug, Clone, Default)]
pub struct IngestedTimeline {
    pub products: Vec<ProductSeries>,
    pub dropped: Vec<DroppedPoint>,
    pub products_read: usize,
}

impl IngestedTimeline {
    pub fn points_dropped(&self) -> usize {
        self.dropped.iter().filter(|d| d.series.is_some()).count()
    }
}

/// Parse a timeline response body.
pub fn parse_timeline_json(body: &str) -> Result<IngestedTimeline, AppError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| AppError::runtime(format!("Timeline response is not valid JSON: {e}")))?;
    ingest_value(&value)
}

/// Normalize an already-parsed response (a JSON array of product objects).
pub fn ingest_value(value: &Value) -> Result<IngestedTimeline, AppError> {
    let items = value
        .as_array()
        .ok_or_else(|| AppError::runtime("Timeline response must be a JSON array of products."))?;

    let mut products = Vec::with_capacity(items.len());
    let mut dropped = Vec::new();

    for (idx, item) in items.iter().enumerate() {
        let Some(obj) = item.as_object() else {
            dropped.push(DroppedPoint {
                product: format!("#{idx}"),
                series: None,
                index: None,
                message: "product entry is not an object".to_string(),
            });
            continue;
        };
        match parse_product(obj, &mut dropped) {
            Some(p) => products.push(p),
            None => dropped.push(DroppedPoint {
                product: format!("#{idx}"),
                series: None,
                index: None,
                message: "missing productId".to_string(),
            }),
        }
    }

    let mut out = normalize_products(products);
    out.products_read = items.len();
    dropped.append(&mut out.dropped);
    out.dropped = dropped;

    for d in &out.dropped {
        warn!(product = %d.product, index = ?d.index, "dropped: {}", d.message);
    }
    Ok(out)
}

/// Sort series chronologically and drop duplicate product ids (first wins).
pub fn normalize_products(products: Vec<ProductSeries>) -> IngestedTimeline {
    let products_read = products.len();
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(products.len());
    let mut dropped = Vec::new();

    for mut p in products {
        if !seen.insert(p.product_id.clone()) {
            dropped.push(DroppedPoint {
                product: p.product_id.clone(),
                series: None,
                index: None,
                message: "duplicate productId".to_string(),
            });
            continue;
        }
        p.normalize();
        out.push(p);
    }

    IngestedTimeline {
        products: out,
        dropped,
        products_read,
    }
}

fn parse_product(obj: &Map<String, Value>, dropped: &mut Vec<DroppedPoint>) -> Option<ProductSeries> {
    let product_id = match obj.get("productId")? {
        Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    let product_name = obj
        .get("productName")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| product_id.clone());

    let actual_series = parse_series(obj.get("actualSeries"), &product_id, SeriesKind::Actual, dropped);
    let forecast_series = parse_series(obj.get("forecastSeries"), &product_id, SeriesKind::Forecast, dropped);

    let meta = ProductMeta {
        total_sales: obj.get("totalSales").and_then(as_count).unwrap_or(0),
        total_revenue_cents: obj.get("totalRevenueCents").and_then(as_whole).unwrap_or(0),
        sales_target: obj.get("salesTarget").and_then(as_count),
        is_upcoming: obj.get("isUpcoming").and_then(Value::as_bool).unwrap_or(false),
        rating: obj.get("rating").and_then(Value::as_str).and_then(PaceRating::parse),
        avg_price_cents: obj.get("avgPriceCents").and_then(as_whole).unwrap_or(0),
        days_until_start: obj.get("daysUntilStart").and_then(as_whole),
        median_days_before: obj
            .get("medianDaysBefore")
            .and_then(Value::as_f64)
            .filter(|v| v.is_finite()),
    };

    Some(ProductSeries {
        product_id,
        product_name,
        actual_series,
        forecast_series,
        meta,
    })
}

fn parse_series(
    raw: Option<&Value>,
    product_id: &str,
    kind: SeriesKind,
    dropped: &mut Vec<DroppedPoint>,
) -> Vec<SeriesPoint> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    let Some(items) = raw.as_array() else {
        if !raw.is_null() {
            dropped.push(DroppedPoint {
                product: product_id.to_string(),
                series: Some(kind),
                index: None,
                message: "series is not an array".to_string(),
            });
        }
        return Vec::new();
    };

    let mut out = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match parse_point(item) {
            Ok(p) => out.push(p),
            Err(message) => dropped.push(DroppedPoint {
                product: product_id.to_string(),
                series: Some(kind),
                index: Some(index),
                message,
            }),
        }
    }
    out
}

fn parse_point(item: &Value) -> Result<SeriesPoint, String> {
    let days_before = item
        .get("daysBefore")
        .ok_or_else(|| "missing daysBefore".to_string())?;
    let days_before = as_whole(days_before).ok_or_else(|| format!("invalid daysBefore: {days_before}"))?;
    if days_before.unsigned_abs() > MAX_ABS_DAYS_BEFORE.unsigned_abs() {
        return Err(format!("daysBefore out of range: {days_before}"));
    }

    let cumulative = item
        .get("cumulative")
        .ok_or_else(|| "missing cumulative".to_string())?;
    let cumulative = as_count(cumulative).ok_or_else(|| format!("invalid cumulative: {cumulative}"))?;

    Ok(SeriesPoint::new(days_before, cumulative))
}

/// Integer, or a float with no fractional part.
fn as_whole(v: &Value) -> Option<i64> {
    if let Some(i) = v.as_i64() {
        return Some(i);
    }
    let f = v.as_f64()?;
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15 {
        Some(f as i64)
    } else {
        None
    }
}

/// Non-negative whole number.
fn as_count(v: &Value) -> Option<u64> {
    if let Some(u) = v.as_u64() {
        return Some(u);
    }
    as_whole(v).and_then(|i| u64::try_from(i).ok())
}
