//! Purchase timeline merge.
//!
//! Steps, leaf first:
//! - `axis`: union of all observed days plus forecast lead-ins, descending
//! - `sampler`: step-forward samples of one series on that axis
//! - `bridge`: stitch each forecast line onto its last actual point
//! - `assemble`: one row per axis point, keyed by product id

pub mod assemble;
pub mod axis;
pub mod bridge;
pub mod sampler;

pub use assemble::{ProductColumns, merge_timeline, product_columns};
pub use axis::{lead_in_day, unify_axis};
pub use sampler::{sample_at, sample_column};
