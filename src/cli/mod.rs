//! Command-line parsing for the `evt` threshold tool.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the numerical code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{
    DEFAULT_MIN_EXCEEDANCES, DEFAULT_N_THRESHOLDS, DEFAULT_RETURN_PERIOD, DEFAULT_RETURN_PERIOD_SIZE,
};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "evt",
    version,
    about = "Extreme-value threshold selection for univariate series"
)]
pub struct Cli {
    /// Verbose logging (debug level for this crate).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Analyse one or more cleaned CSV series and print a report per series.
    Analyze(AnalyzeArgs),
    /// Generate a synthetic series with a GPD tail and analyse it.
    Demo(DemoArgs),
}

/// Knobs of the analysis pipeline, shared by every subcommand.
#[derive(Debug, Args, Clone)]
pub struct AnalysisArgs {
    /// Quantile of the values where the threshold grid starts.
    #[arg(long, env = "EVT_GRID_QUANTILE", default_value_t = 0.8)]
    pub grid_quantile: f64,

    /// The grid stops at the k-th largest value.
    #[arg(long, env = "EVT_GRID_TOP_RANK", default_value_t = 10)]
    pub grid_top_rank: usize,

    /// Number of candidate thresholds.
    #[arg(long, env = "EVT_N_THRESHOLDS", default_value_t = DEFAULT_N_THRESHOLDS)]
    pub n_thresholds: usize,

    /// Minimum exceedances for a threshold to be fitted.
    #[arg(long, env = "EVT_MIN_EXCEEDANCES", default_value_t = DEFAULT_MIN_EXCEEDANCES)]
    pub min_exceedances: usize,

    /// Return period (years).
    #[arg(long, env = "EVT_RETURN_PERIOD", default_value_t = DEFAULT_RETURN_PERIOD)]
    pub return_period: f64,

    /// Observations per year.
    #[arg(long, env = "EVT_RETURN_PERIOD_SIZE", default_value_t = DEFAULT_RETURN_PERIOD_SIZE)]
    pub return_period_size: f64,

    /// Smoothed normalised difference below which the two models agree.
    #[arg(long, env = "EVT_AGREEMENT_CUTOFF", default_value_t = 0.1)]
    pub agreement_cutoff: f64,

    /// Trailing window for smoothing the normalised difference.
    #[arg(long, env = "EVT_SMOOTHING_WINDOW", default_value_t = 5)]
    pub smoothing_window: usize,

    /// Number of flattest windows kept per parameter.
    #[arg(long, env = "EVT_TOP_SEGMENTS", default_value_t = 3)]
    pub top_segments: usize,

    /// Iteration cap of the likelihood optimiser.
    #[arg(long, env = "EVT_MAX_FIT_ITERS", default_value_t = 2_000)]
    pub max_fit_iters: u64,

    /// Print the full results table of every series.
    #[arg(long)]
    pub table: bool,
}

#[derive(Debug, Args, Clone)]
pub struct AnalyzeArgs {
    /// Input CSV files (`value` column, optional `date`/`timestamp`).
    #[arg(required = true, value_name = "FILES")]
    pub files: Vec<PathBuf>,

    /// Write every series' results table into this directory.
    #[arg(long, value_name = "DIR")]
    pub results_dir: Option<PathBuf>,

    /// Write `(file_name, final_threshold)` for all series to this CSV.
    #[arg(long, value_name = "PATH")]
    pub thresholds_csv: Option<PathBuf>,

    /// Write every series' report JSON into this directory.
    #[arg(long, value_name = "DIR")]
    pub report_json: Option<PathBuf>,

    /// Worker threads (defaults to rayon's global pool).
    #[arg(long, env = "EVT_THREADS")]
    pub threads: Option<usize>,

    #[command(flatten)]
    pub analysis: AnalysisArgs,
}

#[derive(Debug, Args, Clone)]
pub struct DemoArgs {
    /// Number of observations.
    #[arg(short = 'n', long, default_value_t = 3_650)]
    pub n: usize,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// GPD shape of the tail.
    #[arg(long, default_value_t = 0.2, allow_negative_numbers = true)]
    pub shape: f64,

    /// GPD scale of the tail.
    #[arg(long, default_value_t = 5.0)]
    pub scale: f64,

    #[command(flatten)]
    pub analysis: AnalysisArgs,
}
