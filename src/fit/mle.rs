//! Maximum-likelihood fit of a GPD with known location.
//!
//! We minimise the negative log-likelihood over `θ = (ξ, ln σ)` with argmin's
//! Nelder–Mead simplex:
//!
//! - the log-scale parameterisation keeps `σ > 0` without constraints
//! - points outside the support (`1 + ξ y ≤ 0` for some exceedance) cost `+∞`
//! - `ξ ≤ -1` is excluded: the likelihood is unbounded there and no MLE exists
//!
//! The simplex starts at the method-of-moments estimate, which is usually
//! within a few percent of the optimum for moderately heavy tails.

use argmin::core::{CostFunction, Error, Executor, State, TerminationReason, TerminationStatus};
use argmin::solver::neldermead::NelderMead;

use crate::error::FitError;
use crate::models::TailModel;

/// Smallest admissible shape (exclusive).
const XI_MIN: f64 = -1.0;
/// Standard deviation of simplex costs at which the search stops.
const SD_TOLERANCE: f64 = 1e-10;

/// Fitted GPD parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpdFit {
    pub shape: f64,
    pub scale: f64,
    pub log_likelihood: f64,
    pub iterations: u64,
}

/// Negative GPD log-likelihood of excesses `y_i = x_i - u > 0`.
struct GpdNegLogLik<'a> {
    excesses: &'a [f64],
}

impl GpdNegLogLik<'_> {
    fn value(&self, xi: f64, ln_sigma: f64) -> f64 {
        if !(xi.is_finite() && ln_sigma.is_finite()) || xi <= XI_MIN {
            return f64::INFINITY;
        }
        let model = TailModel::gpd(0.0, ln_sigma.exp(), xi);
        let nll = -model.log_likelihood(self.excesses);
        // NaN would break simplex ordering; treat as infeasible.
        if nll.is_nan() { f64::INFINITY } else { nll }
    }
}

impl CostFunction for GpdNegLogLik<'_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        Ok(self.value(theta[0], theta[1]))
    }
}

/// Method-of-moments start `(ξ₀, σ₀)`, nudged inside the support.
fn initial_guess(excesses: &[f64]) -> (f64, f64) {
    let n = excesses.len() as f64;
    let mean = excesses.iter().sum::<f64>() / n;
    let var = excesses.iter().map(|y| (y - mean).powi(2)).sum::<f64>() / (n - 1.0).max(1.0);
    let y_max = excesses.iter().copied().fold(0.0_f64, f64::max);

    if !(var.is_finite() && var > 0.0 && mean > 0.0) {
        return (0.0, mean.max(f64::MIN_POSITIVE));
    }

    let ratio = mean * mean / var;
    let mut xi = (0.5 * (1.0 - ratio)).clamp(-0.45, 0.9);
    let sigma = (0.5 * mean * (ratio + 1.0)).max(f64::MIN_POSITIVE);

    // For ξ < 0 the upper endpoint σ/|ξ| must lie beyond the largest excess.
    if xi < 0.0 && y_max > 0.0 {
        xi = xi.max(-0.9 * sigma / y_max);
    }
    (xi, sigma)
}

/// Fit a GPD to `exceedances` with location fixed at `threshold`.
pub fn fit_gpd(exceedances: &[f64], threshold: f64, max_iters: u64) -> Result<GpdFit, FitError> {
    if exceedances.len() < 2 {
        return Err(FitError::non_convergence("fewer than two exceedances"));
    }
    let excesses: Vec<f64> = exceedances.iter().map(|x| x - threshold).collect();
    if excesses.iter().any(|y| !(y.is_finite() && *y > 0.0)) {
        return Err(FitError::non_convergence("exceedances must lie strictly above the threshold"));
    }

    let (xi0, sigma0) = initial_guess(&excesses);
    let ln_sigma0 = sigma0.ln();
    let simplex = vec![
        vec![xi0, ln_sigma0],
        vec![xi0 + 0.1, ln_sigma0],
        vec![xi0, ln_sigma0 + 0.1],
    ];

    let problem = GpdNegLogLik {
        excesses: &excesses,
    };
    let solver = NelderMead::new(simplex)
        .with_sd_tolerance(SD_TOLERANCE)
        .map_err(|e| FitError::non_convergence(e.to_string()))?;

    let result = Executor::new(problem, solver)
        .configure(|state| state.max_iters(max_iters))
        .run()
        .map_err(|e| FitError::non_convergence(e.to_string()))?;

    let state = result.state();
    if let TerminationStatus::Terminated(TerminationReason::MaxItersReached) =
        state.get_termination_status()
    {
        return Err(FitError::non_convergence(format!(
            "no convergence within {max_iters} iterations"
        )));
    }

    let best = state
        .get_best_param()
        .ok_or_else(|| FitError::non_convergence("optimiser returned no parameters"))?;
    let cost = state.get_best_cost();
    if !cost.is_finite() {
        return Err(FitError::non_convergence(format!("non-finite objective {cost}")));
    }

    let shape = best[0];
    let scale = best[1].exp();
    if !(shape.is_finite() && scale.is_finite() && scale > 0.0) {
        return Err(FitError::non_convergence(format!(
            "invalid parameters shape={shape} scale={scale}"
        )));
    }

    Ok(GpdFit {
        shape,
        scale,
        log_likelihood: -cost,
        iterations: state.get_iter(),
    })
}
