//! `purchase-timeline` library crate.
//!
//! The binary (`ptl`) is a thin wrapper around this library so that:
//!
//! - the merge core is testable without spawning processes
//! - front-ends (CLI printing, TUI) share one pipeline

pub mod app;
pub mod cli;
pub mod data;
pub mod debug;
pub mod domain;
pub mod error;
pub mod forecast;
pub mod io;
pub mod math;
pub mod plot;
pub mod report;
pub mod timeline;
pub mod tui;
