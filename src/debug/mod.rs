//! Debug bundle writer for inspecting what a view was built from.
//!
//! A bundle is a markdown file under `debug/` with the source, filter, every
//! raw series as received, what ingest dropped, and the merged rows.

use std::fs::{File, create_dir_all};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::info;

use crate::app::pipeline::RunOutput;
use crate::domain::{SeriesPoint, TimelineConfig};
use crate::error::AppError;

pub const DEBUG_DIR: &str = "debug";

/// Write a bundle for `run` into `debug/` and return its path.
pub fn write_debug_bundle(run: &RunOutput, config: &TimelineConfig) -> Result<PathBuf, AppError> {
    write_debug_bundle_in(Path::new(DEBUG_DIR), run, config)
}

pub fn write_debug_bundle_in(dir: &Path, run: &RunOutput, config: &TimelineConfig) -> Result<PathBuf, AppError> {
    create_dir_all(dir).map_err(|e| AppError::runtime(format!("Failed to create debug dir: {e}")))?;

    let ts = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("ptl_debug_{ts}.md"));

    let file = File::create(&path)
        .map_err(|e| AppError::runtime(format!("Failed to create debug file: {e}")))?;
    let mut w = BufWriter::new(file);
    render_bundle(&mut w, run, config)
        .and_then(|_| w.flush())
        .map_err(|e| AppError::runtime(format!("Failed to write debug bundle: {e}")))?;

    info!(path = %path.display(), "debug bundle written");
    Ok(path)
}

fn render_bundle<W: Write>(w: &mut W, run: &RunOutput, config: &TimelineConfig) -> std::io::Result<()> {
    writeln!(w, "# ptl debug bundle")?;
    writeln!(w, "- generated: {}", Local::now().to_rfc3339())?;
    writeln!(w, "- source: {}", run.fetched.source)?;
    writeln!(w, "- fetched_at: {}", run.fetched.fetched_at.to_rfc3339())?;
    writeln!(w, "- filter: {}", config.filter.label())?;
    writeln!(
        w,
        "- projection: {} (step={}, window={}, filled={})",
        if config.project { "on" } else { "off" },
        config.project_step,
        config.project_window,
        run.projected
    )?;
    writeln!(
        w,
        "- products: read={}, kept={}, shown={}",
        run.fetched.ingest.products_read,
        run.fetched.ingest.products.len(),
        run.products.len()
    )?;

    writeln!(w, "\n## Dropped during ingest")?;
    if run.fetched.ingest.dropped.is_empty() {
        writeln!(w, "none")?;
    } else {
        writeln!(w, "| product | series | index | message |")?;
        writeln!(w, "| - | - | - | - |")?;
        for d in &run.fetched.ingest.dropped {
            writeln!(
                w,
                "| {} | {} | {} | {} |",
                d.product,
                d.series.map(|s| format!("{s:?}")).unwrap_or_else(|| "-".to_string()),
                d.index.map(|i| i.to_string()).unwrap_or_else(|| "-".to_string()),
                d.message
            )?;
        }
    }

    writeln!(w, "\n## Series")?;
    for p in &run.products {
        writeln!(w, "\n### {} ({})", p.product_name, p.product_id)?;
        writeln!(
            w,
            "upcoming={} total_sales={} target={}",
            p.meta.is_upcoming,
            p.meta.total_sales,
            p.meta.sales_target.map(|t| t.to_string()).unwrap_or_else(|| "-".to_string())
        )?;
        writeln!(w, "- actual: {}", fmt_points(&p.actual_series))?;
        writeln!(w, "- forecast: {}", fmt_points(&p.forecast_series))?;
    }

    writeln!(w, "\n## Merged rows")?;
    if run.merged.is_empty() {
        writeln!(w, "none")?;
        return Ok(());
    }
    let mut header = String::from("| days_before |");
    let mut rule = String::from("| - |");
    for p in &run.merged.products {
        header.push_str(&format!(" {0} actual | {0} forecast |", p.product_id));
        rule.push_str(" - | - |");
    }
    writeln!(w, "{header}")?;
    writeln!(w, "{rule}")?;
    for row in &run.merged.rows {
        let mut line = format!("| {} |", row.days_before);
        for p in &run.merged.products {
            let cell = row.cell(&p.product_id);
            line.push_str(&format!(" {} | {} |", fmt_opt(cell.actual), fmt_opt(cell.forecast)));
        }
        writeln!(w, "{line}")?;
    }
    Ok(())
}

fn fmt_points(points: &[SeriesPoint]) -> String {
    if points.is_empty() {
        return "[]".to_string();
    }
    let parts: Vec<String> = points
        .iter()
        .map(|p| format!("({}, {})", p.days_before, p.cumulative))
        .collect();
    format!("[{}]", parts.join(", "))
}

fn fmt_opt(value: Option<u64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "-".to_string(),
    }
}
