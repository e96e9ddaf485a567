//! Export merged timeline rows to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts:
//! one row per axis point, two columns per product, empty fields for nulls.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::MergedTimeline;
use crate::error::AppError;

/// Write merged rows to a CSV file.
pub fn write_timeline_csv(path: &Path, merged: &MergedTimeline) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::usage(format!("Failed to create export CSV '{}': {e}", path.display())))?;
    let mut out = BufWriter::new(file);
    write_timeline_csv_to(&mut out, merged)
        .map_err(|e| AppError::usage(format!("Failed to write export CSV: {e}")))?;
    out.flush()
        .map_err(|e| AppError::usage(format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}

/// Write merged rows as CSV to any writer.
pub fn write_timeline_csv_to<W: Write>(out: &mut W, merged: &MergedTimeline) -> std::io::Result<()> {
    let mut header = vec!["days_before".to_string()];
    for p in &merged.products {
        header.push(csv_field(&format!("{}_actual", p.product_id)));
        header.push(csv_field(&format!("{}_forecast", p.product_id)));
    }
    writeln!(out, "{}", header.join(","))?;

    for row in &merged.rows {
        let mut fields = vec![row.days_before.to_string()];
        for p in &merged.products {
            let cell = row.cell(&p.product_id);
            fields.push(cell.actual.map(|v| v.to_string()).unwrap_or_default());
            fields.push(cell.forecast.map(|v| v.to_string()).unwrap_or_default());
        }
        writeln!(out, "{}", fields.join(","))?;
    }
    Ok(())
}

fn csv_field(raw: &str) -> String {
    if raw.contains([',', '"', '\n']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ProductMeta, ProductSeries, SeriesPoint};
    use crate::timeline::merge_timeline;

    #[test]
    fn csv_layout_has_two_columns_per_product() {
        let products = vec![ProductSeries {
            product_id: "A".to_string(),
            product_name: "A".to_string(),
            actual_series: vec![SeriesPoint::new(30, 5), SeriesPoint::new(10, 40), SeriesPoint::new(0, 100)],
            forecast_series: vec![SeriesPoint::new(0, 100), SeriesPoint::new(-5, 130)],
            meta: ProductMeta::default(),
        }];
        let merged = merge_timeline(&products);

        let mut buf = Vec::new();
        write_timeline_csv_to(&mut buf, &merged).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let expected = concat!(
            "days_before,A_actual,A_forecast\n",
            "30,5,\n",
            "10,40,\n",
            "5,40,\n",
            "0,100,100\n",
            "-5,,130\n",
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn ids_with_commas_are_quoted() {
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("plain"), "plain");
    }
}
