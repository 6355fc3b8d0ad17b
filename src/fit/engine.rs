//! Threshold sweep: fit both tail models at every grid threshold.
//!
//! For each candidate threshold `u` we:
//! - collect exceedances `x > u` (skip `u` with fewer than `min_exceedances`)
//! - fit a GPD by maximum likelihood with location `u`
//! - turn the observed exceedance rate into the probability that matches the
//!   return period, and evaluate both models' return levels there
//! - score both models with AICc
//!
//! Thresholds are evaluated in parallel; results are collected by grid index so
//! rows stay ascending by threshold.

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::domain::{AnalysisConfig, AnalysisResultSet, FitDiagnostics, ThresholdFitResult};
use crate::error::FitError;
use crate::fit::grid::threshold_grid;
use crate::fit::mle::fit_gpd;
use crate::models::{ModelKind, TailModel, aicc};

/// Probability of exceeding the return level within one observation.
///
/// `n_exceedances / (n_total / return_period_size)` is the exceedance rate per
/// year; the return level is exceeded once per `return_period` years.
pub fn exceedance_probability(n_exceedances: usize, n_total: usize, config: &AnalysisConfig) -> f64 {
    let per_year = n_exceedances as f64 / (n_total as f64 / config.return_period_size);
    1.0 / (config.return_period * per_year)
}

/// Fit one candidate threshold.
pub fn fit_threshold(
    values: &[f64],
    threshold: f64,
    config: &AnalysisConfig,
) -> Result<ThresholdFitResult, FitError> {
    let exceedances: Vec<f64> = values.iter().copied().filter(|&v| v > threshold).collect();
    let n = exceedances.len();
    if n < config.min_exceedances {
        return Err(FitError::InsufficientExceedances {
            count: n,
            required: config.min_exceedances,
        });
    }

    let fit = fit_gpd(&exceedances, threshold, config.max_fit_iters)?;
    debug!(threshold, n_exceedances = n, iterations = fit.iterations, "gpd fitted");
    let p = exceedance_probability(n, values.len(), config);

    let gpd = TailModel::gpd(threshold, fit.scale, fit.shape);
    // Same σ as the GPD: the exponential is the ξ = 0 member of the family.
    let exponential = TailModel::exponential(threshold, fit.scale);

    Ok(ThresholdFitResult {
        threshold,
        shape: fit.shape,
        scale: fit.scale,
        return_value_gpd: gpd.isf(p),
        return_value_exponential: exponential.isf(p),
        aic_gpd: aicc(gpd.log_likelihood(&exceedances), ModelKind::Gpd.param_count(), n),
        aic_exponential: aicc(
            exponential.log_likelihood(&exceedances),
            ModelKind::Exponential.param_count(),
            n,
        ),
        n_exceedances: n,
    })
}

/// Run the full threshold sweep for one series' values.
///
/// Never fails: a degenerate grid yields an empty result set, and thresholds
/// that cannot be fitted are omitted and counted in the diagnostics.
pub fn analyze_thresholds(values: &[f64], config: &AnalysisConfig) -> AnalysisResultSet {
    let grid = match threshold_grid(values, config) {
        Ok(grid) => grid,
        Err(e) => {
            warn!(n_values = values.len(), "{e}; no thresholds evaluated");
            return AnalysisResultSet {
                rows: Vec::new(),
                diagnostics: FitDiagnostics {
                    degenerate_grid: true,
                    ..FitDiagnostics::default()
                },
            };
        }
    };

    let outcomes: Vec<Result<ThresholdFitResult, FitError>> = grid
        .par_iter()
        .map(|&u| fit_threshold(values, u, config))
        .collect();

    let mut diagnostics = FitDiagnostics {
        grid_len: grid.len(),
        ..FitDiagnostics::default()
    };
    let mut rows = Vec::with_capacity(outcomes.len());
    for (u, outcome) in grid.iter().zip(outcomes) {
        match outcome {
            Ok(row) => rows.push(row),
            Err(e @ FitError::InsufficientExceedances { .. }) => {
                debug!(threshold = u, "skipped: {e}");
                diagnostics.skipped_insufficient += 1;
            }
            Err(e @ FitError::NonConvergence { .. }) => {
                debug!(threshold = u, "skipped: {e}");
                diagnostics.skipped_nonconvergence += 1;
            }
        }
    }
    diagnostics.fitted = rows.len();

    AnalysisResultSet { rows, diagnostics }
}
