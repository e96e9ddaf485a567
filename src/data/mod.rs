//! Timeline data sources.
//!
//! Every source produces a [`FetchedTimeline`]: normalized products plus when
//! and where they came from. The pipeline does not care which one ran.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::SourceSpec;
use crate::error::AppError;
use crate::io::ingest::IngestedTimeline;
use crate::io::snapshot::read_snapshot_json;

pub mod api;
pub mod refresh;
pub mod sample;

pub use api::AnalyticsClient;
pub use refresh::{Completed, RefreshCoordinator, RefreshTicket};
pub use sample::{DemoSource, generate_demo};

/// One fetch worth of products.
#[derive(Debug, Clone)]
pub struct FetchedTimeline {
    pub source: String,
    pub fetched_at: DateTime<Utc>,
    pub ingest: IngestedTimeline,
}

/// Anything that can produce a timeline snapshot.
///
/// Sources are shared with the TUI's fetch worker, hence `Send + Sync`.
pub trait TimelineSource: Send + Sync {
    fn label(&self) -> String;
    fn fetch(&self) -> Result<FetchedTimeline, AppError>;
}

/// A snapshot file on disk, re-read on every fetch.
#[derive(Debug, Clone)]
pub struct SnapshotSource {
    path: PathBuf,
}

impl SnapshotSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl TimelineSource for SnapshotSource {
    fn label(&self) -> String {
        format!("snapshot {}", self.path.display())
    }

    fn fetch(&self) -> Result<FetchedTimeline, AppError> {
        let loaded = read_snapshot_json(&self.path)?;
        Ok(FetchedTimeline {
            source: format!("{} ({})", self.label(), loaded.source),
            fetched_at: loaded.fetched_at,
            ingest: loaded.ingest,
        })
    }
}

/// Build the source a run asked for.
pub fn open_source(source: &SourceSpec) -> Result<Arc<dyn TimelineSource>, AppError> {
    let opened: Arc<dyn TimelineSource> = match source {
        SourceSpec::Api => Arc::new(AnalyticsClient::from_env()?),
        SourceSpec::Snapshot(path) => Arc::new(SnapshotSource::new(path.clone())),
        SourceSpec::Demo { seed } => Arc::new(DemoSource::new(*seed)),
    };
    Ok(opened)
}
