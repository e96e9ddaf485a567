//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - sets up logging
//! - runs the merge pipeline
//! - prints tables/plots or writes exports

use std::fs::{File, create_dir_all};
use std::path::Path;
use std::sync::Mutex;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, ExportArgs, SnapshotArgs, SourceArgs, ViewArgs};
use crate::domain::{ProductFilter, SourceSpec, TimelineConfig};
use crate::error::AppError;

pub mod pipeline;

const TUI_LOG_FILE: &str = "ptl-tui.log";

/// Entry point for the `ptl` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();

    // We want `ptl` and `ptl --demo` to behave like `ptl tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Merge(args) => {
            init_logging(false)?;
            handle_view(args, OutputMode::Merge)
        }
        Command::Summary(args) => {
            init_logging(false)?;
            handle_view(args, OutputMode::Summary)
        }
        Command::Plot(args) => {
            init_logging(false)?;
            handle_view(args, OutputMode::Plot)
        }
        Command::Export(args) => {
            init_logging(false)?;
            handle_export(args)
        }
        Command::Snapshot(args) => {
            init_logging(false)?;
            handle_snapshot(args)
        }
        Command::Tui(args) => {
            // The alternate screen owns the terminal, so logs go to a file.
            init_logging(true)?;
            let config = timeline_config_from_args(&args)?;
            crate::tui::run(config)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Merge,
    Summary,
    Plot,
}

fn handle_view(args: ViewArgs, mode: OutputMode) -> Result<(), AppError> {
    let config = view_config_from_args(&args)?;
    let run = pipeline::run_timeline(&config)?;

    match mode {
        OutputMode::Merge => {
            println!("{}", crate::report::format_run_summary(&run, &config));
            println!("{}", crate::report::format_rows(&run.merged, config.max_rows));
        }
        OutputMode::Summary => {
            println!("{}", crate::report::format_run_summary(&run, &config));
        }
        OutputMode::Plot => {
            let plot = crate::plot::render_timeline_plot(&run.merged, config.plot_width, config.plot_height);
            println!("{plot}");
        }
    }

    Ok(())
}

fn handle_export(args: ExportArgs) -> Result<(), AppError> {
    let config = timeline_config_from_args(&args.source)?;
    let run = pipeline::run_timeline(&config)?;
    crate::io::export::write_timeline_csv(&args.csv, &run.merged)?;
    info!(path = %args.csv.display(), rows = run.merged.rows.len(), "csv written");
    println!("Wrote {} row(s) to {}", run.merged.rows.len(), args.csv.display());
    Ok(())
}

fn handle_snapshot(args: SnapshotArgs) -> Result<(), AppError> {
    let config = timeline_config_from_args(&args.source)?;
    let fetched = crate::data::open_source(&config.source)?.fetch()?;
    // Filtered, never projected.
    let products = config.filter.apply(&fetched.ingest.products);
    crate::io::snapshot::write_snapshot_json(&args.out, &products, &fetched.source, fetched.fetched_at)?;
    info!(path = %args.out.display(), products = products.len(), "snapshot written");
    println!("Saved {} product(s) to {}", products.len(), args.out.display());
    Ok(())
}

/// Build a pipeline config from the shared source flags.
///
/// `--pick` prompts on stdin, so this is not pure for that flag.
pub fn timeline_config_from_args(args: &SourceArgs) -> Result<TimelineConfig, AppError> {
    let source = if args.demo {
        SourceSpec::Demo { seed: args.seed }
    } else if let Some(path) = &args.snapshot {
        SourceSpec::Snapshot(path.clone())
    } else if args.pick {
        SourceSpec::Snapshot(crate::cli::picker::prompt_for_snapshot_path()?)
    } else {
        SourceSpec::Api
    };

    if args.project_step <= 0 {
        return Err(AppError::usage("--project-step must be > 0."));
    }
    if args.project_window < 2 {
        return Err(AppError::usage("--project-window must be at least 2."));
    }

    let filter = match &args.products {
        Some(ids) => ProductFilter::from_ids(ids.iter().map(|s| s.trim()).filter(|s| !s.is_empty())),
        None => ProductFilter::All,
    };

    Ok(TimelineConfig {
        source,
        filter,
        project: args.project,
        project_step: args.project_step,
        project_window: args.project_window,
        ..TimelineConfig::default()
    })
}

fn view_config_from_args(args: &ViewArgs) -> Result<TimelineConfig, AppError> {
    Ok(TimelineConfig {
        top_n: args.top,
        max_rows: args.rows,
        plot_width: args.width,
        plot_height: args.height,
        ..timeline_config_from_args(&args.source)?
    })
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` overrides the default `warn` level. With `to_file`, output goes
/// to `debug/ptl-tui.log` without ANSI colors.
fn init_logging(to_file: bool) -> Result<(), AppError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact();

    if to_file {
        let dir = Path::new(crate::debug::DEBUG_DIR);
        create_dir_all(dir).map_err(|e| AppError::runtime(format!("Failed to create log dir: {e}")))?;
        let file = File::create(dir.join(TUI_LOG_FILE))
            .map_err(|e| AppError::runtime(format!("Failed to create log file: {e}")))?;
        let _ = builder.with_ansi(false).with_writer(Mutex::new(file)).try_init();
    } else {
        let _ = builder.with_writer(std::io::stderr).try_init();
    }
    Ok(())
}

/// Rewrite argv so `ptl` defaults to `ptl tui`.
///
/// Rules:
/// - `ptl`                      -> `ptl tui`
/// - `ptl --demo ...`           -> `ptl tui --demo ...`
/// - `ptl --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(
        arg1.as_str(),
        "merge" | "summary" | "plot" | "export" | "snapshot" | "tui"
    );
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    argv
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_and_flags_default_to_tui() {
        assert_eq!(rewrite_args(argv(&["ptl"])), argv(&["ptl", "tui"]));
        assert_eq!(
            rewrite_args(argv(&["ptl", "--demo", "--seed", "3"])),
            argv(&["ptl", "tui", "--demo", "--seed", "3"])
        );
        assert_eq!(rewrite_args(argv(&["ptl", "--help"])), argv(&["ptl", "--help"]));
        assert_eq!(rewrite_args(argv(&["ptl", "plot", "--demo"])), argv(&["ptl", "plot", "--demo"]));
    }

    #[test]
    fn products_flag_becomes_filter() {
        let cli = Cli::parse_from(["ptl", "summary", "--demo", "--products", "a, b,", "--top", "2"]);
        let Command::Summary(args) = cli.command else {
            panic!("expected summary");
        };
        let config = view_config_from_args(&args).unwrap();
        assert_eq!(config.source, SourceSpec::Demo { seed: 7 });
        assert_eq!(config.filter, ProductFilter::from_ids(["a", "b"]));
        assert_eq!(config.top_n, 2);
    }

    #[test]
    fn missing_products_flag_means_all() {
        let cli = Cli::parse_from(["ptl", "tui", "--snapshot", "s.json"]);
        let Command::Tui(args) = cli.command else {
            panic!("expected tui");
        };
        let config = timeline_config_from_args(&args).unwrap();
        assert_eq!(config.filter, ProductFilter::All);
        assert_eq!(config.source, SourceSpec::Snapshot("s.json".into()));
    }

    #[test]
    fn invalid_projection_settings_are_user_errors() {
        let cli = Cli::parse_from(["ptl", "tui", "--demo", "--project-window", "1"]);
        let Command::Tui(args) = cli.command else {
            panic!("expected tui");
        };
        assert_eq!(timeline_config_from_args(&args).unwrap_err().exit_code(), 2);
    }
}
