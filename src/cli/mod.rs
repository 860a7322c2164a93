//! Command-line parsing for the data cleaner.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the cleaning code. Tunables fall back to `FIT_*` environment
//! variables (a `.env` file is loaded at startup), then to the defaults below.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{DataType, DateOrder, NormalizeConfig, QuartileMethod};
use crate::error::AppError;

pub mod picker;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "fitclean", version, about = "Data Cleaner & Inspector for price and indicator CSVs")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Clean a CSV, print the load/missing/outlier summary, and write `cleaned_<name>.csv`.
    Clean(CleanArgs),
    /// Launch the interactive inspector.
    ///
    /// Shows the outlier-highlighted table, the missing-value summary and a chart,
    /// and lets you edit cells before saving.
    Inspect(InspectArgs),
    /// Print descriptive statistics per numeric column.
    Describe(InputArgs),
    /// Write a seeded, deliberately messy securities CSV for demos.
    Sample(SampleArgs),
}

/// Input file and normalization settings shared by every data command.
#[derive(Debug, Args, Clone)]
pub struct InputArgs {
    /// CSV file to load. Without it, an interactive picker lists `*.csv` files.
    #[arg(short = 'f', long = "file", value_name = "CSV")]
    pub file: Option<PathBuf>,

    /// Declared kind of data.
    #[arg(long = "type", value_enum, env = "FIT_DATA_TYPE", default_value_t = DataType::Securities)]
    pub data_type: DataType,

    /// How to read ambiguous numeric dates like 03/04/2024.
    #[arg(long, value_enum, env = "FIT_DATE_ORDER", default_value_t = DateOrder::Mdy)]
    pub date_order: DateOrder,

    /// IQR fence multiplier for outlier flags.
    #[arg(long, env = "FIT_IQR_MULTIPLIER", default_value_t = 1.5)]
    pub iqr_multiplier: f64,

    /// Quartile estimator for the IQR fences.
    #[arg(long = "quartile", value_enum, env = "FIT_QUARTILE_METHOD", default_value_t = QuartileMethod::Linear)]
    pub quartile_method: QuartileMethod,

    /// Forward-fill missing numeric cells (indicator data only).
    #[arg(long)]
    pub ffill: bool,
}

impl InputArgs {
    pub fn normalize_config(&self) -> Result<NormalizeConfig, AppError> {
        if !(self.iqr_multiplier.is_finite() && self.iqr_multiplier > 0.0) {
            return Err(AppError::new(
                2,
                format!("Invalid --iqr-multiplier {}; expected a positive number.", self.iqr_multiplier),
            ));
        }
        Ok(NormalizeConfig {
            data_type: self.data_type,
            date_order: self.date_order,
            iqr_multiplier: self.iqr_multiplier,
            quartile_method: self.quartile_method,
            forward_fill: self.ffill,
        })
    }
}

#[derive(Debug, Args, Clone)]
pub struct CleanArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Directory for `cleaned_<name>.csv`.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub out_dir: PathBuf,

    /// Manual edits to overlay before export (CSV with `row,column,value`).
    #[arg(long, value_name = "CSV")]
    pub edits: Option<PathBuf>,

    /// Also write a JSON report (summary, missing values, outliers, stats).
    #[arg(long = "report-json", value_name = "JSON")]
    pub report_json: Option<PathBuf>,

    /// Render an ASCII plot of one column.
    #[arg(long)]
    pub plot: bool,

    /// Column to plot (defaults to `close`, else the first numeric column).
    #[arg(long, value_name = "COLUMN")]
    pub plot_column: Option<String>,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Rows shown in the outlier-highlighted preview table.
    #[arg(long, default_value_t = 20)]
    pub preview: usize,
}

#[derive(Debug, Args, Clone)]
pub struct InspectArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Directory the inspector saves `cleaned_<name>.csv` into.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub out_dir: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct SampleArgs {
    /// Output CSV path.
    #[arg(long, value_name = "CSV")]
    pub out: PathBuf,

    /// Distinct trading days to generate.
    #[arg(long, default_value_t = 250)]
    pub rows: usize,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_flags_build_a_config() {
        let cli = Cli::try_parse_from([
            "fitclean",
            "clean",
            "-f",
            "prices.csv",
            "--type",
            "economic",
            "--iqr-multiplier",
            "3",
            "--quartile",
            "midpoint",
            "--date-order",
            "dmy",
            "--ffill",
        ])
        .unwrap();
        let Command::Clean(args) = cli.command else {
            panic!("expected clean");
        };
        let config = args.input.normalize_config().unwrap();
        assert_eq!(config.data_type, DataType::Indicator);
        assert_eq!(config.iqr_multiplier, 3.0);
        assert_eq!(config.quartile_method, QuartileMethod::Midpoint);
        assert_eq!(config.date_order, DateOrder::Dmy);
        assert!(config.forward_fill);
        assert_eq!(args.out_dir, PathBuf::from("."));
    }

    #[test]
    fn non_positive_multiplier_is_rejected() {
        let cli = Cli::try_parse_from(["fitclean", "describe", "--iqr-multiplier", "0"]).unwrap();
        let Command::Describe(args) = cli.command else {
            panic!("expected describe");
        };
        assert_eq!(args.normalize_config().unwrap_err().exit_code(), 2);
    }
}
