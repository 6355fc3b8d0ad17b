//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and sets up logging
//! - loads series (CSV files or a synthetic sample)
//! - runs the analysis pipeline per series
//! - prints reports and writes optional exports

use std::path::Path;

use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::cli::{AnalysisArgs, AnalyzeArgs, Command, DemoArgs};
use crate::domain::AnalysisConfig;
use crate::error::{AppError, EXIT_NO_DATA, EXIT_USAGE};

pub mod batch;
pub mod pipeline;
pub mod session;

/// Entry point for the `evt` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Analyze(args) => handle_analyze(args),
        Command::Demo(args) => handle_demo(args),
    }
}

/// `RUST_LOG` wins over the built-in filter.
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "evt_threshold=debug,info"
    } else {
        "evt_threshold=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn config_from_args(args: &AnalysisArgs) -> Result<AnalysisConfig, AppError> {
    let config = AnalysisConfig {
        grid_quantile: args.grid_quantile,
        grid_top_rank: args.grid_top_rank,
        n_thresholds: args.n_thresholds,
        min_exceedances: args.min_exceedances,
        return_period: args.return_period,
        return_period_size: args.return_period_size,
        agreement_cutoff: args.agreement_cutoff,
        smoothing_window: args.smoothing_window,
        top_segments: args.top_segments,
        max_fit_iters: args.max_fit_iters,
        ..AnalysisConfig::default()
    };
    config.validate()?;
    Ok(config)
}

fn handle_analyze(args: AnalyzeArgs) -> Result<(), AppError> {
    let config = config_from_args(&args.analysis)?;
    for dir in [&args.results_dir, &args.report_json].into_iter().flatten() {
        ensure_dir(dir)?;
    }

    let cancel = batch::CancellationToken::new();
    let outcome = batch::run_batch_with_threads(&args.files, &config, &cancel, args.threads)?;

    for analysis in outcome.outcomes.iter().filter_map(batch::SeriesOutcome::analysis) {
        println!("{}", crate::report::format_series_report(analysis));
        if args.analysis.table {
            println!("{}", crate::report::format_results_table(&analysis.results));
        }
    }
    println!("{}", crate::report::format_batch_summary(&outcome));

    write_exports(
        &outcome,
        args.results_dir.as_deref(),
        args.report_json.as_deref(),
        args.thresholds_csv.as_deref(),
    )?;

    if outcome.completed() == 0 {
        return Err(AppError::new(EXIT_NO_DATA, "No series could be analysed."));
    }
    Ok(())
}

/// Write every requested export. A failed write does not stop the others;
/// failures are logged and reported together at the end.
pub fn write_exports(
    outcome: &batch::BatchOutcome,
    results_dir: Option<&Path>,
    report_dir: Option<&Path>,
    thresholds_csv: Option<&Path>,
) -> Result<(), AppError> {
    let names: Vec<&str> = outcome.outcomes.iter().map(|o| o.name.as_str()).collect();
    let stems = crate::io::unique_output_stems(&names);

    let mut failures = Vec::new();
    for (o, stem) in outcome.outcomes.iter().zip(&stems) {
        let Some(analysis) = o.analysis() else {
            continue;
        };
        if let Some(dir) = results_dir {
            failures.extend(
                crate::io::write_results_csv(&crate::io::results_path(dir, stem), &analysis.results).err(),
            );
        }
        if let Some(dir) = report_dir {
            failures.extend(crate::io::write_report_json(&crate::io::report_path(dir, stem), analysis).err());
        }
    }
    if let Some(path) = thresholds_csv {
        failures.extend(crate::io::write_thresholds_csv(path, &outcome.threshold_rows()).err());
    }

    for e in &failures {
        warn!("{e}");
    }
    match failures.first() {
        None => Ok(()),
        Some(first) => Err(AppError::new(
            first.exit_code(),
            format!("{} export(s) failed; first: {}", failures.len(), first.message()),
        )),
    }
}

fn handle_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = config_from_args(&args.analysis)?;
    let options = crate::data::SyntheticOptions {
        n: args.n,
        seed: args.seed,
        shape: args.shape,
        scale: args.scale,
        ..crate::data::SyntheticOptions::default()
    };
    let series = crate::data::generate_series(&options)?;
    let analysis = pipeline::analyze_series(&series, &config);

    println!(
        "Synthetic sample: n={} | tail shape={} scale={} | splice point={:.4}\n",
        options.n,
        options.shape,
        options.scale,
        options.splice_point()
    );
    println!("{}", crate::report::format_series_report(&analysis));
    if args.analysis.table {
        println!("{}", crate::report::format_results_table(&analysis.results));
    }
    Ok(())
}

fn ensure_dir(dir: &Path) -> Result<(), AppError> {
    std::fs::create_dir_all(dir)
        .map_err(|e| AppError::new(EXIT_USAGE, format!("Failed to create directory '{}': {e}", dir.display())))
}
