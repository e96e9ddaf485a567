//! Shared timeline pipeline used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! fetch -> filter -> (optional projection) -> merge -> summary
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use tracing::debug;

use crate::data::{FetchedTimeline, open_source};
use crate::domain::{MergedTimeline, ProductSeries, TimelineConfig};
use crate::error::AppError;
use crate::forecast::fill_missing_forecasts;
use crate::report::{Summary, summarize};
use crate::timeline::merge_timeline;

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub fetched: FetchedTimeline,
    /// Products after filtering and projection, in input order.
    pub products: Vec<ProductSeries>,
    pub merged: MergedTimeline,
    pub summary: Summary,
    /// Number of products that received a projected forecast.
    pub projected: usize,
}

/// Fetch from the configured source and build the view.
pub fn run_timeline(config: &TimelineConfig) -> Result<RunOutput, AppError> {
    let source = open_source(&config.source)?;
    let fetched = source.fetch()?;
    Ok(build_view(fetched, config))
}

/// Build the view for an already-fetched timeline.
///
/// The TUI calls this on every filter change without re-fetching.
pub fn build_view(fetched: FetchedTimeline, config: &TimelineConfig) -> RunOutput {
    let mut products = config.filter.apply(&fetched.ingest.products);
    let projected = if config.project {
        fill_missing_forecasts(&mut products, config)
    } else {
        0
    };

    let merged = merge_timeline(&products);
    let summary = summarize(&merged, config.top_n);
    debug!(
        products = products.len(),
        rows = merged.rows.len(),
        projected,
        "view built"
    );

    RunOutput {
        fetched,
        products,
        merged,
        summary,
        projected,
    }
}
