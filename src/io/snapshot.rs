//! Read/write timeline snapshot files.
//!
//! A snapshot is the "portable" form of one fetch:
//! - which tool wrote it and from where
//! - when the data was fetched
//! - the products exactly as normalized by ingest
//!
//! Reading goes back through `ingest`, so a hand-edited snapshot with a broken
//! point loses that point only.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::ProductSeries;
use crate::error::{AppError, EXIT_USAGE};
use crate::io::ingest::{IngestedTimeline, ingest_value};

/// On-disk snapshot schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotFile {
    pub tool: String,
    pub source: String,
    pub fetched_at: DateTime<Utc>,
    pub products: Vec<ProductSeries>,
}

/// A snapshot after ingest.
#[derive(Debug, Clone)]
pub struct LoadedSnapshot {
    pub source: String,
    pub fetched_at: DateTime<Utc>,
    pub ingest: IngestedTimeline,
}

/// Write a snapshot JSON file.
pub fn write_snapshot_json(
    path: &Path,
    products: &[ProductSeries],
    source: &str,
    fetched_at: DateTime<Utc>,
) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::usage(format!("Failed to create snapshot '{}': {e}", path.display())))?;

    let snapshot = SnapshotFile {
        tool: "ptl".to_string(),
        source: source.to_string(),
        fetched_at,
        products: products.to_vec(),
    };

    serde_json::to_writer_pretty(file, &snapshot)
        .map_err(|e| AppError::usage(format!("Failed to write snapshot JSON: {e}")))?;

    Ok(())
}

/// Read a snapshot JSON file.
///
/// A bare array of products (a raw endpoint response saved with curl) is
/// accepted too; its fetch time is unknown and reported as the file's mtime.
pub fn read_snapshot_json(path: &Path) -> Result<LoadedSnapshot, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::usage(format!("Failed to open snapshot '{}': {e}", path.display())))?;
    let value: Value = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| AppError::usage(format!("Invalid snapshot JSON: {e}")))?;

    if value.is_array() {
        let fetched_at = std::fs::metadata(path)
            .and_then(|m| m.modified())
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());
        return Ok(LoadedSnapshot {
            source: format!("file {}", path.display()),
            fetched_at,
            ingest: ingest_value(&value)?,
        });
    }

    let products = value
        .get("products")
        .ok_or_else(|| AppError::usage("Invalid snapshot JSON: missing `products`."))?;
    let fetched_at = value
        .get("fetchedAt")
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| AppError::usage("Invalid snapshot JSON: missing or bad `fetchedAt`."))?;
    let source = value
        .get("source")
        .and_then(Value::as_str)
        .unwrap_or("snapshot")
        .to_string();

    let ingest = ingest_value(products).map_err(|e| e.reclassify(EXIT_USAGE, "Invalid snapshot products"))?;
    Ok(LoadedSnapshot {
        source,
        fetched_at,
        ingest,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ProductMeta, SeriesPoint};

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("ptl_{}_{name}", std::process::id()))
    }

    #[test]
    fn snapshot_roundtrip_keeps_products_and_time() {
        let products = vec![ProductSeries {
            product_id: "ccfb1".to_string(),
            product_name: "Builders".to_string(),
            actual_series: vec![SeriesPoint::new(20, 3), SeriesPoint::new(4, 9)],
            forecast_series: vec![SeriesPoint::new(4, 9), SeriesPoint::new(0, 12)],
            meta: ProductMeta {
                total_sales: 9,
                sales_target: Some(20),
                is_upcoming: true,
                ..ProductMeta::default()
            },
        }];
        let at = DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        let path = temp_path("roundtrip.json");
        write_snapshot_json(&path, &products, "api", at).unwrap();
        let loaded = read_snapshot_json(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded.fetched_at, at);
        assert_eq!(loaded.source, "api");
        assert_eq!(loaded.ingest.products, products);
    }

    #[test]
    fn bare_array_is_accepted() {
        let path = temp_path("bare.json");
        std::fs::write(&path, r#"[{"productId": "x", "actualSeries": [{"daysBefore": 1, "cumulative": 2}]}]"#)
            .unwrap();
        let loaded = read_snapshot_json(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded.ingest.products.len(), 1);
    }

    #[test]
    fn missing_file_is_a_user_error() {
        let err = read_snapshot_json(Path::new("/definitely/not/here.json")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
