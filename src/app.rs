//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - sets up logging
//! - loads and normalizes the chosen CSV into a session
//! - prints reports/plots or hands the session to the inspector
//! - writes the cleaned export and optional JSON report

use std::fs;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

use crate::cli::{CleanArgs, Cli, Command, InputArgs, InspectArgs, SampleArgs};
use crate::data::{SampleConfig, generate_sample};
use crate::error::{AppError, SessionError};
use crate::io::export::{JsonReport, edit_records, write_report_json};
use crate::report::describe;
use crate::report::format::{format_describe, format_load_summary, format_missing, format_preview, format_rejections};

pub mod pipeline;

const DEFAULT_LOG_FILTER: &str = "fit_cleaner=info";
const REJECTION_LIMIT: usize = 10;

/// Entry point for the `fitclean` binary.
pub fn run() -> Result<(), AppError> {
    // Before parsing, so `FIT_*` values from `.env` act as flag defaults.
    dotenvy::dotenv().ok();

    let argv = rewrite_args(std::env::args().collect());
    let cli = Cli::parse_from(argv);

    // The inspector owns the terminal; log lines would corrupt the screen.
    init_tracing(!matches!(cli.command, Command::Inspect(_)));

    match cli.command {
        Command::Clean(args) => handle_clean(args),
        Command::Inspect(args) => handle_inspect(args),
        Command::Describe(args) => handle_describe(args),
        Command::Sample(args) => handle_sample(args),
    }
}

/// `RUST_LOG` wins; otherwise `fit_cleaner=info`. Logs go to stderr so stdout stays clean.
fn init_tracing(to_stderr: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let layer = to_stderr.then(|| fmt::layer().with_writer(std::io::stderr).with_target(false).compact());
    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry().with(filter).with(layer).try_init();
}

fn handle_clean(args: CleanArgs) -> Result<(), AppError> {
    let mut session = pipeline::load_session(&args.input)?;
    if let Some(path) = &args.edits {
        pipeline::apply_edits_file(&mut session, path)?;
    }

    let data = session.loaded().ok_or(SessionError::NotLoaded)?;
    let table = &data.normalized.table;
    // Plot and stats read edited values, matching the recomputed flags.
    let edited = session.effective_table().ok_or(SessionError::NotLoaded)?;
    let config = session.config();

    println!("{}", format_load_summary(&data.upload.file_name, &data.normalized.summary, config));
    let rejections = format_rejections(&data.normalized.summary, REJECTION_LIMIT);
    if !rejections.is_empty() {
        println!("{rejections}");
    }
    println!("{}", format_missing(&data.missing));
    println!(
        "Outliers flagged: {} (cells marked *, edits marked ~)",
        data.outliers.total_flagged()
    );
    println!("{}", format_preview(table, &data.outliers, &data.edits, args.preview));

    if args.plot {
        let column = args.plot_column.clone().or_else(|| pipeline::default_plot_column(&edited));
        let plot = column
            .as_deref()
            .and_then(|c| crate::plot::render_column_plot(&edited, c, &data.outliers, args.width, args.height));
        match plot {
            Some(plot) => println!("{plot}"),
            None => println!("(no numeric values to plot for {})", column.as_deref().unwrap_or("any column")),
        }
    }

    let path = session.export_to_dir(&args.out_dir)?;
    println!("Wrote {}", path.display());

    if let Some(json_path) = &args.report_json {
        let stats = describe(&edited, &data.outliers, config.quartile_method);
        let report = JsonReport {
            file_name: &data.upload.file_name,
            output_file: path.display().to_string(),
            config,
            summary: &data.normalized.summary,
            missing: &data.missing,
            outliers: &data.outliers,
            stats: &stats,
            edits: edit_records(&data.edits),
        };
        write_report_json(json_path, &report)?;
        println!("Wrote {}", json_path.display());
    }

    Ok(())
}

fn handle_inspect(args: InspectArgs) -> Result<(), AppError> {
    let session = pipeline::load_session(&args.input)?;
    crate::tui::run(session, args.out_dir)
}

fn handle_describe(args: InputArgs) -> Result<(), AppError> {
    let session = pipeline::load_session(&args)?;
    let data = session.loaded().ok_or(SessionError::NotLoaded)?;
    let config = session.config();

    println!("{}", format_load_summary(&data.upload.file_name, &data.normalized.summary, config));
    let stats = describe(&data.normalized.table, &data.outliers, config.quartile_method);
    println!("{}", format_describe(&stats));
    Ok(())
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    let config = SampleConfig {
        rows: args.rows,
        seed: args.seed,
        ..SampleConfig::default()
    };
    let sample = generate_sample(&config)?;
    fs::write(&args.out, &sample.csv)
        .map_err(|e| AppError::new(4, format!("Failed to write sample CSV '{}': {e}", args.out.display())))?;

    println!(
        "Wrote {} ({} rows, {} duplicate dates, {} price jumps)",
        args.out.display(),
        sample.summary.rows_written,
        sample.summary.duplicates,
        sample.summary.jumps
    );
    Ok(())
}

/// Rewrite argv so `fitclean` defaults to `fitclean inspect`.
///
/// Rules:
/// - `fitclean`                      -> `fitclean inspect`
/// - `fitclean -f prices.csv ...`    -> `fitclean inspect -f prices.csv ...`
/// - `fitclean --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("inspect".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    if arg1.starts_with('-') {
        argv.insert(1, "inspect".to_string());
    }
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_opens_the_inspector() {
        assert_eq!(rewrite_args(argv(&["fitclean"])), argv(&["fitclean", "inspect"]));
        assert_eq!(
            rewrite_args(argv(&["fitclean", "-f", "a.csv"])),
            argv(&["fitclean", "inspect", "-f", "a.csv"])
        );
    }

    #[test]
    fn subcommands_and_help_are_untouched() {
        assert_eq!(rewrite_args(argv(&["fitclean", "--help"])), argv(&["fitclean", "--help"]));
        assert_eq!(
            rewrite_args(argv(&["fitclean", "clean", "-f", "a.csv"])),
            argv(&["fitclean", "clean", "-f", "a.csv"])
        );
    }
}
