//! Input/output helpers.
//!
//! - timeline response ingest + normalization (`ingest`)
//! - merged-row CSV export (`export`)
//! - snapshot JSON read/write (`snapshot`)

pub mod export;
pub mod ingest;
pub mod snapshot;

pub use export::*;
pub use ingest::*;
pub use snapshot::*;
