//! Command-line parsing for the purchase timeline tool.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the merge code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

pub mod picker;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "ptl", version, about = "Purchase timeline merge & forecast viewer")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the merged day-by-day table and a per-product summary.
    Merge(ViewArgs),
    /// Print the per-product summary and top list only.
    Summary(ViewArgs),
    /// Render all selected products as an ASCII chart.
    Plot(ViewArgs),
    /// Write the merged rows to CSV.
    Export(ExportArgs),
    /// Fetch once and save the raw products as a snapshot JSON.
    Snapshot(SnapshotArgs),
    /// Launch the interactive TUI.
    ///
    /// This uses the same underlying merge pipeline as `ptl merge`, but renders
    /// results in a terminal UI using Ratatui.
    Tui(SourceArgs),
}

/// Where the data comes from and which products to keep.
#[derive(Debug, Args, Clone)]
pub struct SourceArgs {
    /// Read a snapshot JSON instead of calling the API.
    #[arg(long, value_name = "JSON", conflicts_with = "demo")]
    pub snapshot: Option<PathBuf>,

    /// Choose a snapshot JSON interactively.
    #[arg(long, conflicts_with_all = ["snapshot", "demo"])]
    pub pick: bool,

    /// Use the built-in synthetic catalogue.
    #[arg(long)]
    pub demo: bool,

    /// Random seed for `--demo`.
    #[arg(long, default_value_t = 7)]
    pub seed: u64,

    /// Only show these product ids (comma separated).
    #[arg(short = 'p', long, value_delimiter = ',')]
    pub products: Option<Vec<String>>,

    /// Project a forecast for upcoming products that have none.
    #[arg(long)]
    pub project: bool,

    /// Projection step (days).
    #[arg(long, default_value_t = 5)]
    pub project_step: i64,

    /// Trailing actual points used by the projection.
    #[arg(long, default_value_t = 6)]
    pub project_window: usize,
}

/// Options for the printing commands.
#[derive(Debug, Args, Clone)]
pub struct ViewArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Show top-N products by sales.
    #[arg(long, default_value_t = 5)]
    pub top: usize,

    /// Max table rows to print (0 = all).
    #[arg(long, default_value_t = 0)]
    pub rows: usize,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

/// Options for `ptl export`.
#[derive(Debug, Args, Clone)]
pub struct ExportArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Output CSV path.
    #[arg(long, value_name = "CSV")]
    pub csv: PathBuf,
}

/// Options for `ptl snapshot`.
#[derive(Debug, Args, Clone)]
pub struct SnapshotArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Output JSON path.
    #[arg(long, value_name = "JSON")]
    pub out: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn products_split_on_commas() {
        let cli = Cli::parse_from(["ptl", "merge", "--demo", "--products", "a,b", "--rows", "3"]);
        let Command::Merge(args) = cli.command else {
            panic!("expected merge");
        };
        assert!(args.source.demo);
        assert_eq!(args.source.products, Some(vec!["a".to_string(), "b".to_string()]));
        assert_eq!(args.rows, 3);
    }

    #[test]
    fn export_requires_csv_path() {
        assert!(Cli::try_parse_from(["ptl", "export", "--demo"]).is_err());
        assert!(Cli::try_parse_from(["ptl", "export", "--demo", "--csv", "out.csv"]).is_ok());
    }

    #[test]
    fn snapshot_and_demo_conflict() {
        assert!(Cli::try_parse_from(["ptl", "summary", "--demo", "--snapshot", "s.json"]).is_err());
    }
}
