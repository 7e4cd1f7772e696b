#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the Bangladesh climate dataset.
//!
//! Loads the dataset once, then runs one subcommand against it. With no
//! subcommand, an interactive menu picks the analysis and its parameters.
//!
//! Uses `indicatif-log-bridge` (via [`bd_climate_cli_utils::init_logger`])
//! so that log lines and the batch forecast progress bar never fight for
//! the terminal.

mod commands;
mod interactive;
mod output;

use std::path::{Path, PathBuf};

use bd_climate_dataset::{Dataset, LoadOptions, load_path};
use bd_climate_forecast_models::Config;
use bd_climate_indicator_models::{Indicator, Scope};
use clap::{Parser, Subcommand};

/// File read when neither `--data` nor `BD_CLIMATE_DATA` is given.
const DEFAULT_DATA_PATH: &str = "Bangladesh_Environmental_Climate_Change_Impact.csv";

/// Environment variable overriding the default data path.
const DATA_PATH_ENV: &str = "BD_CLIMATE_DATA";

#[derive(Parser)]
#[command(
    name = "bd_climate",
    about = "Bangladesh district climate dataset explorer and forecaster"
)]
struct Cli {
    /// Path of the dataset file (overrides `BD_CLIMATE_DATA`)
    #[arg(long, global = true)]
    data: Option<PathBuf>,
    /// TOML configuration replacing the built-in defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Skip invalid rows instead of aborting on the first one
    #[arg(long, global = true)]
    lenient: bool,
    /// Print results as pretty JSON instead of tables
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Clone, Subcommand)]
enum Commands {
    /// Row counts, year span, missing cells and column statistics
    Summary,
    /// List the districts present in the dataset
    Districts,
    /// Yearly values of an indicator with a linear trend line
    Trend {
        /// Indicator column name (e.g., `Avg_Temperature_C`)
        indicator: Indicator,
        /// `national`, a region (`coastal`, `northern`, `central`, `other`)
        /// or a district name
        #[arg(long, default_value = "national")]
        scope: Scope,
        /// First year to include
        #[arg(long)]
        from: Option<i32>,
        /// Last year to include
        #[arg(long)]
        to: Option<i32>,
        /// Also show rows marked as forecast in the file
        #[arg(long)]
        include_forecast_rows: bool,
    },
    /// Rank districts by their mean value of an indicator
    Rank {
        /// Indicator column name
        indicator: Indicator,
        /// First year to include
        #[arg(long)]
        from: Option<i32>,
        /// Last year to include
        #[arg(long)]
        to: Option<i32>,
        /// Show only the top N districts
        #[arg(long)]
        limit: Option<usize>,
        /// Lowest values first
        #[arg(long)]
        ascending: bool,
    },
    /// Pearson correlation between all indicators
    Correlation {
        /// Number of strongest pairs to list
        #[arg(long, default_value = "10")]
        top: usize,
    },
    /// Change of every indicator over one district's history
    Dashboard {
        /// District name (any accepted spelling)
        district: String,
    },
    /// Rows and districts per region
    Regions,
    /// Forecast one indicator for a district, region or the whole country
    Forecast {
        /// Indicator column name
        indicator: Indicator,
        /// `national`, a region or a district name
        #[arg(long, default_value = "national")]
        scope: Scope,
        /// Comma-separated target years (default: the configured horizon)
        #[arg(long, value_delimiter = ',')]
        years: Vec<i32>,
        /// Also fit on rows marked as forecast in the file
        #[arg(long)]
        include_forecast_rows: bool,
    },
    /// Forecast every district and indicator
    ForecastAll {
        /// Comma-separated indicator column names (default: all)
        #[arg(long, value_delimiter = ',')]
        indicators: Vec<Indicator>,
        /// Comma-separated district names (default: all in the file)
        #[arg(long, value_delimiter = ',')]
        districts: Vec<String>,
        /// Comma-separated target years (default: the configured horizon)
        #[arg(long, value_delimiter = ',')]
        years: Vec<i32>,
        /// Also fit on rows marked as forecast in the file
        #[arg(long)]
        include_forecast_rows: bool,
    },
    /// Fill missing values, clip outliers and write the file with derived
    /// feature columns
    Preprocess {
        /// Output path
        #[arg(long)]
        output: PathBuf,
    },
    /// Write the dataset back out unchanged and compare with the input
    Roundtrip {
        /// Output path
        #[arg(long)]
        output: PathBuf,
    },
}

/// Resolves the data path from the flag, the environment or the default.
fn data_path(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| std::env::var_os(DATA_PATH_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH))
}

fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    Ok(match path {
        Some(path) => {
            log::info!("Using configuration from {}", path.display());
            Config::load(path)?
        }
        None => Config::embedded(),
    })
}

fn load_dataset(
    path: &Path,
    config: &Config,
    lenient: bool,
) -> Result<Dataset, Box<dyn std::error::Error>> {
    let options = LoadOptions::default()
        .with_strict(!lenient)
        .with_delimiter(config.dataset.delimiter_byte()?)
        .with_measured_through(config.dataset.measured_through);

    let (dataset, report) = load_path(path, &options)?;
    for rejected in &report.rejected {
        log::warn!("Skipped line {}: {}", rejected.line, rejected.error);
    }
    if !report.provenance_from_column {
        log::debug!(
            "No provenance column; rows after {} count as forecast",
            options.measured_through
        );
    }
    Ok(dataset)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = bd_climate_cli_utils::init_logger();
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    let path = data_path(cli.data);
    let dataset = load_dataset(&path, &config, cli.lenient)?;

    let command = match cli.command {
        Some(command) => command,
        None => {
            println!("Bangladesh Climate Toolchain");
            println!();
            interactive::prompt(&dataset)?
        }
    };

    let context = commands::Context {
        dataset: &dataset,
        config: &config,
        input: &path,
        json: cli.json,
        multi: &multi,
    };
    commands::run(&context, command)
}
