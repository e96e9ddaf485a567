//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - wire-level product timelines (`ProductSeries`, `SeriesPoint`, `ProductMeta`)
//! - merge outputs (`MergedRow`, `MergedTimeline`, `SampleCell`)
//! - run configuration (`TimelineConfig`, `ProductFilter`, `SourceSpec`)

pub mod types;

pub use types::*;
