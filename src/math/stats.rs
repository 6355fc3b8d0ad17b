//! Descriptive statistics over `f64` slices.
//!
//! Quantiles use linear interpolation between order statistics
//! (`h = (n - 1) q`), the usual "type 7" definition.

use crate::domain::SummaryStats;

fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Quantile of already-sorted values. `None` for empty input.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let h = last as f64 * q.clamp(0.0, 1.0);
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(last);
    let frac = h - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Quantile with linear interpolation. `None` for empty input.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    quantile_sorted(&sorted_copy(values), q)
}

/// The `k`-th largest value (1-based).
///
/// With fewer than `k` values this is the smallest value, matching
/// "take the top k, then the last of them".
pub fn kth_largest(values: &[f64], k: usize) -> Option<f64> {
    if values.is_empty() || k == 0 {
        return None;
    }
    let sorted = sorted_copy(values);
    let idx = sorted.len().saturating_sub(k);
    Some(sorted[idx])
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (divides by `n`).
pub fn population_std(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    Some(var.sqrt())
}

/// Sample standard deviation (divides by `n - 1`).
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

/// Rescale to zero mean and unit population variance.
///
/// Returns `None` when the variance is zero (up to rounding) or not finite.
pub fn standardize(values: &[f64]) -> Option<Vec<f64>> {
    let m = mean(values)?;
    let sd = population_std(values)?;
    if !(sd.is_finite() && sd > 1e-12 * m.abs().max(1.0)) {
        return None;
    }
    Some(values.iter().map(|v| (v - m) / sd).collect())
}

/// Count, moments and quartiles of a series' values.
pub fn summary_stats(values: &[f64]) -> Option<SummaryStats> {
    let sorted = sorted_copy(values);
    let count = sorted.len();
    let first = *sorted.first()?;
    let last = *sorted.last()?;
    Some(SummaryStats {
        count,
        mean: mean(&sorted)?,
        std: sample_std(&sorted),
        min: first,
        q25: quantile_sorted(&sorted, 0.25)?,
        median: quantile_sorted(&sorted, 0.5)?,
        q75: quantile_sorted(&sorted, 0.75)?,
        q90: quantile_sorted(&sorted, 0.9)?,
        max: last,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantile_interpolates_between_order_statistics() {
        let v = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert!((quantile(&v, 0.8).unwrap() - 4.2).abs() < 1e-12);
        assert_eq!(quantile(&v, 0.0), Some(1.0));
        assert_eq!(quantile(&v, 1.0), Some(5.0));
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn quantile_ignores_input_order() {
        let v = [5.0, 1.0, 4.0, 2.0, 3.0];
        assert_eq!(quantile(&v, 0.5), Some(3.0));
    }

    #[test]
    fn kth_largest_counts_from_the_top() {
        let v: Vec<f64> = (1..=20).map(f64::from).collect();
        assert_eq!(kth_largest(&v, 10), Some(11.0));
        assert_eq!(kth_largest(&v, 1), Some(20.0));
        // Fewer values than k: smallest value.
        assert_eq!(kth_largest(&[3.0, 1.0, 2.0], 10), Some(1.0));
    }

    #[test]
    fn standardize_zero_mean_unit_variance() {
        let z = standardize(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        let m = mean(&z).unwrap();
        let sd = population_std(&z).unwrap();
        assert!(m.abs() < 1e-12);
        assert!((sd - 1.0).abs() < 1e-12);
    }

    #[test]
    fn standardize_constant_is_degenerate() {
        assert_eq!(standardize(&[2.0, 2.0, 2.0]), None);
        assert_eq!(standardize(&[0.1; 7]), None);
    }

    #[test]
    fn summary_stats_basic() {
        let s = summary_stats(&[4.0, 1.0, 3.0, 2.0, 5.0]).unwrap();
        assert_eq!(s.count, 5);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 5.0);
        assert_eq!(s.median, 3.0);
        assert_eq!(s.mean, 3.0);
        assert!((s.std.unwrap() - 2.5_f64.sqrt()).abs() < 1e-12);
    }
}
