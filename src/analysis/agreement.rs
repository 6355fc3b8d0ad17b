//! Agreement between the GPD and exponential return values.
//!
//! - XX: the first threshold where the smoothed, min-max normalised absolute
//!   difference of the two return values drops below the agreement cutoff.
//! - YY: the first threshold where the signed difference changes sign,
//!   located by linear interpolation between the two bracketing rows.

use serde::{Deserialize, Serialize};

use crate::domain::{AgreementCurve, AnalysisConfig, AnalysisResultSet};

/// Agreement curve plus the two markers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Agreement {
    pub curve: AgreementCurve,
    pub xx: Option<f64>,
    pub yy: Option<f64>,
}

/// Min-max normalisation over the finite entries.
///
/// All zeros when the finite range is empty or zero. Otherwise non-finite
/// entries stay NaN.
pub fn normalize_min_max(values: &[f64]) -> Vec<f64> {
    let finite = values.iter().copied().filter(|v| v.is_finite());
    let (min, max) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !(max > min) {
        return vec![0.0; values.len()];
    }
    let range = max - min;
    values
        .iter()
        .map(|&v| if v.is_finite() { (v - min) / range } else { f64::NAN })
        .collect()
}

/// Trailing mean over up to `window` entries ending at each index.
///
/// Partial windows at the start use the available entries; non-finite entries
/// are skipped, and a window with no finite entry yields NaN.
pub fn trailing_mean(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    (0..values.len())
        .map(|i| {
            let lo = (i + 1).saturating_sub(window);
            let (sum, count) = values[lo..=i]
                .iter()
                .filter(|v| v.is_finite())
                .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
            if count == 0 { f64::NAN } else { sum / count as f64 }
        })
        .collect()
}

fn sign(v: f64) -> i8 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}

/// First sign change of `diffs` between consecutive rows, interpolated in `thresholds`.
///
/// Zero counts as its own sign. Pairs with a non-finite difference are never a crossover.
pub fn first_crossover(thresholds: &[f64], diffs: &[f64]) -> Option<f64> {
    let n = thresholds.len().min(diffs.len());
    (0..n.saturating_sub(1)).find_map(|i| {
        let (d0, d1) = (diffs[i], diffs[i + 1]);
        if !(d0.is_finite() && d1.is_finite()) || sign(d0) == sign(d1) {
            return None;
        }
        let (t0, t1) = (thresholds[i], thresholds[i + 1]);
        Some(t0 + (t1 - t0) * d0.abs() / (d0.abs() + d1.abs()))
    })
}

/// Compute the agreement curve and the XX/YY markers.
pub fn detect_agreement(results: &AnalysisResultSet, config: &AnalysisConfig) -> Agreement {
    let thresholds = results.thresholds();
    let diffs: Vec<f64> = results
        .rows
        .iter()
        .map(|r| r.return_value_gpd - r.return_value_exponential)
        .collect();
    let abs_diff: Vec<f64> = diffs.iter().map(|d| d.abs()).collect();
    let normalized_abs_diff = normalize_min_max(&abs_diff);
    let smoothed = trailing_mean(&normalized_abs_diff, config.smoothing_window);

    let xx = smoothed
        .iter()
        .position(|&s| s < config.agreement_cutoff)
        .map(|i| thresholds[i]);
    let yy = first_crossover(&thresholds, &diffs);

    Agreement {
        curve: AgreementCurve {
            thresholds,
            abs_diff,
            normalized_abs_diff,
            smoothed,
        },
        xx,
        yy,
    }
}
