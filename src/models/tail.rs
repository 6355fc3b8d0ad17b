//! Model evaluation for the two competing tail models.
//!
//! Both models live on exceedances `x > loc`, with `y = (x - loc) / scale`:
//!
//! - GPD:          `log f = -ln σ - (1 + 1/ξ) ln(1 + ξ y)`, support `1 + ξ y > 0`
//! - Exponential:  `log f = -ln σ - y` (the `ξ → 0` limit of the GPD)
//!
//! The fitter needs three primitives per model: the log-likelihood of a sample,
//! the inverse survival function (return level), and the parameter count for
//! information criteria.

use serde::{Deserialize, Serialize};

/// `|ξ|` below this is evaluated with the exponential limit.
const XI_EPS: f64 = 1e-12;

/// Which tail model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Gpd,
    Exponential,
}

impl ModelKind {
    /// Human-readable label, as used in table headers.
    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::Gpd => "GPD",
            ModelKind::Exponential => "ED",
        }
    }

    /// Number of estimated parameters for information criteria.
    pub fn param_count(self) -> usize {
        match self {
            ModelKind::Gpd => 2,
            ModelKind::Exponential => 1,
        }
    }
}

/// Parameters of a tail model. `shape` is ignored for the exponential model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TailModel {
    pub kind: ModelKind,
    pub loc: f64,
    pub scale: f64,
    pub shape: f64,
}

impl TailModel {
    pub fn gpd(loc: f64, scale: f64, shape: f64) -> Self {
        Self {
            kind: ModelKind::Gpd,
            loc,
            scale,
            shape,
        }
    }

    pub fn exponential(loc: f64, scale: f64) -> Self {
        Self {
            kind: ModelKind::Exponential,
            loc,
            scale,
            shape: 0.0,
        }
    }

    fn effective_shape(&self) -> f64 {
        match self.kind {
            ModelKind::Gpd if self.shape.abs() >= XI_EPS => self.shape,
            _ => 0.0,
        }
    }

    /// Log density at `x`. `-inf` outside the support, NaN for invalid parameters.
    pub fn log_pdf(&self, x: f64) -> f64 {
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return f64::NAN;
        }
        let y = (x - self.loc) / self.scale;
        if y < 0.0 {
            return f64::NEG_INFINITY;
        }
        let xi = self.effective_shape();
        if xi == 0.0 {
            return -self.scale.ln() - y;
        }
        let z = xi * y;
        if z <= -1.0 {
            return f64::NEG_INFINITY;
        }
        -self.scale.ln() - (1.0 + 1.0 / xi) * z.ln_1p()
    }

    /// Sum of log densities over a sample.
    pub fn log_likelihood(&self, sample: &[f64]) -> f64 {
        sample.iter().map(|&x| self.log_pdf(x)).sum()
    }

    /// Inverse survival function: the level exceeded with probability `p`.
    ///
    /// NaN when `p` is outside `(0, 1]` or the parameters are invalid.
    pub fn isf(&self, p: f64) -> f64 {
        if !(p > 0.0 && p <= 1.0) || !(self.scale.is_finite() && self.scale > 0.0) {
            return f64::NAN;
        }
        let xi = self.effective_shape();
        if xi == 0.0 {
            return self.loc - self.scale * p.ln();
        }
        // (p^-ξ - 1) / ξ, via expm1 for accuracy at small ξ.
        self.loc + self.scale * (-xi * p.ln()).exp_m1() / xi
    }
}

/// Small-sample corrected AIC.
///
/// `AICc = 2k - 2 LL + (2k² + 2k) / (n - k - 1)`; NaN when `n <= k + 1`.
pub fn aicc(log_likelihood: f64, k: usize, n: usize) -> f64 {
    if n <= k + 1 {
        return f64::NAN;
    }
    let k_f = k as f64;
    2.0 * k_f - 2.0 * log_likelihood + (2.0 * k_f * k_f + 2.0 * k_f) / (n - k - 1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponential_isf_matches_closed_form() {
        let m = TailModel::exponential(10.0, 2.0);
        let p: f64 = 0.01;
        assert!((m.isf(p) - (10.0 - 2.0 * p.ln())).abs() < 1e-12);
    }

    #[test]
    fn gpd_isf_matches_closed_form() {
        let m = TailModel::gpd(5.0, 1.5, 0.2);
        let p: f64 = 0.001;
        let expected = 5.0 + 1.5 / 0.2 * (p.powf(-0.2) - 1.0);
        assert!((m.isf(p) - expected).abs() < 1e-9);
    }

    #[test]
    fn gpd_with_tiny_shape_matches_exponential() {
        let g = TailModel::gpd(0.0, 3.0, 1e-14);
        let e = TailModel::exponential(0.0, 3.0);
        assert_eq!(g.isf(0.05), e.isf(0.05));
        assert_eq!(g.log_pdf(2.0), e.log_pdf(2.0));
    }

    #[test]
    fn isf_is_nan_outside_probability_range() {
        let m = TailModel::gpd(0.0, 1.0, 0.1);
        assert!(m.isf(0.0).is_nan());
        assert!(m.isf(1.5).is_nan());
        assert_eq!(m.isf(1.0), 0.0);
    }

    #[test]
    fn gpd_log_pdf_outside_bounded_support() {
        // ξ < 0: upper endpoint at loc - σ/ξ = 2.
        let m = TailModel::gpd(0.0, 1.0, -0.5);
        assert!(m.log_pdf(1.0).is_finite());
        assert_eq!(m.log_pdf(2.5), f64::NEG_INFINITY);
        assert_eq!(m.log_pdf(-0.1), f64::NEG_INFINITY);
    }

    #[test]
    fn exponential_log_likelihood_closed_form() {
        let m = TailModel::exponential(1.0, 2.0);
        let sample = [1.5, 2.0, 4.0];
        // Σ (-ln 2 - (x-1)/2)
        let expected = -3.0 * 2.0_f64.ln() - (0.5 + 1.0 + 3.0) / 2.0;
        assert!((m.log_likelihood(&sample) - expected).abs() < 1e-12);
    }

    #[test]
    fn aicc_formula_and_small_sample_guard() {
        // k=2, n=10: 4 - 2LL + 12/7
        let v = aicc(-5.0, 2, 10);
        assert!((v - (4.0 + 10.0 + 12.0 / 7.0)).abs() < 1e-12);
        assert!(aicc(-5.0, 2, 3).is_nan());
        assert!(aicc(-5.0, 1, 2).is_nan());
        assert!(aicc(-5.0, 1, 3).is_finite());
    }
}
