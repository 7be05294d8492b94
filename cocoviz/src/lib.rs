//! Runtime profiles of benchmarked optimization algorithms.
//!
//! A [`BenchmarkResult`] holds the trace of one algorithm run on one problem
//! instance: performance indicator values over the number of function
//! evaluations. Results are collected in a [`ResultSet`] and reduced to
//! per-algorithm runtime profiles with [`runtime_profiles`].

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tracing::info;

pub mod config;
pub mod ecdf;
pub mod error;
pub mod helpers;
pub mod indicator;
pub mod persist;
pub mod plot;
pub mod problem;
pub mod result;
pub mod result_set;
pub mod rtp;
pub mod table;
pub mod targets;

pub use config::AnalysisConfig;
pub use ecdf::{CensoredSample, Ecdf};
pub use error::{Error, ErrorDetails};
pub use indicator::{Indicator, IndicatorRef, IndicatorRegistry};
pub use persist::{read_parquet, read_result_set, write_parquet};
pub use plot::{ProfilePlot, rtp_plot};
pub use problem::ProblemDescription;
pub use result::BenchmarkResult;
pub use result_set::ResultSet;
pub use rtp::{RuntimeProfileOptions, runtime_profiles};
pub use table::Table;
pub use targets::{TargetStrategy, Targets};

#[derive(clap::ValueEnum, Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[clap(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Jsonl,
    #[default]
    Pretty,
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to an analysis config (TOML).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Indicator to compute the profiles for. Overrides `profile.indicator`.
    #[arg(short, long)]
    pub indicator: Option<String>,

    /// Number of targets per problem. Overrides `profile.number_of_targets`.
    #[arg(short, long)]
    pub number_of_targets: Option<usize>,

    /// How targets are placed. Overrides `profile.target_strategy`.
    #[arg(short, long)]
    pub target_strategy: Option<TargetStrategy>,

    /// Evaluation column of files without `__fevals`. Overrides `profile.fevals_column`.
    #[arg(long)]
    pub fevals_column: Option<String>,

    #[arg(short, long, default_value = "pretty")]
    pub format: OutputFormat,

    /// Write a chart description of the profiles (JSON) to this path.
    #[arg(long)]
    pub plot_output: Option<PathBuf>,

    /// Parquet files, one benchmark result each.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Serialize)]
struct ProfileLine<'a> {
    algorithm: &'a str,
    indicator: &'a str,
    #[serde(flatten)]
    profile: &'a Ecdf,
}

/// Loads the results named in `args`, computes their runtime profiles and
/// writes them to `writer`.
pub fn run_analysis(args: Args, mut writer: impl Write) -> Result<()> {
    let config = args.config.as_deref().map(AnalysisConfig::load).transpose()?;
    if let Some(config) = &config {
        config.register_global_indicators();
    }

    let indicator = match (&args.indicator, &config) {
        (Some(indicator), _) => indicator.clone(),
        (None, Some(config)) => config.profile.indicator.clone(),
        (None, None) => {
            bail!("No indicator given. Pass --indicator or set `profile.indicator`.")
        }
    };
    let mut options = config
        .as_ref()
        .map(AnalysisConfig::runtime_profile_options)
        .unwrap_or_default();
    if let Some(number_of_targets) = args.number_of_targets {
        if number_of_targets == 0 {
            bail!("--number-of-targets must be greater than 0");
        }
        options.number_of_targets = number_of_targets;
    }
    if let Some(target_strategy) = args.target_strategy {
        options.target_strategy = target_strategy;
    }

    let fevals_column = match (&args.fevals_column, &config) {
        (Some(column), _) => column.as_str(),
        (None, Some(config)) => config.profile.fevals_column.as_str(),
        (None, None) => result::DEFAULT_FEVALS_COLUMN,
    };
    let results = read_result_set(&args.files, fevals_column)?;
    info!(
        results = results.len(),
        algorithms = results.algorithms().len(),
        problems = results.problems().len(),
        "Loaded results"
    );

    let profiles = runtime_profiles(&results, &indicator, &options)?;
    let mut algorithms: Vec<&String> = profiles.keys().collect();
    algorithms.sort();

    match args.format {
        OutputFormat::Jsonl => {
            for algorithm in algorithms {
                let line = ProfileLine {
                    algorithm,
                    indicator: &indicator,
                    profile: &profiles[algorithm],
                };
                writeln!(writer, "{}", serde_json::to_string(&line)?)?;
            }
        }
        OutputFormat::Pretty => {
            writeln!(
                writer,
                "Runtime profiles for `{indicator}` ({} results, {} targets per problem)",
                results.len(),
                options.number_of_targets
            )?;
            for algorithm in algorithms {
                let profile = &profiles[algorithm];
                let reached = profile.probabilities.last().copied().unwrap_or(0.0) * 100.0;
                let last = profile.quantiles.last().copied().unwrap_or(0.0);
                writeln!(
                    writer,
                    "{algorithm}: {reached:.1}% of targets reached after {last} fevals / dimension"
                )?;
            }
        }
    }

    if let Some(path) = &args.plot_output {
        let plot = ProfilePlot::from_profiles(&profiles).with_title(indicator.as_str());
        std::fs::write(path, plot.to_json()?).map_err(|e| {
            Error::new(ErrorDetails::FileWrite {
                path: path.clone(),
                message: e.to_string(),
            })
        })?;
        info!(path = %path.display(), "Wrote plot description");
    }
    Ok(())
}
