//! Threshold grid generation.
//!
//! Candidate thresholds are a deterministic, linearly spaced grid between a
//! high quantile of the data and the value of a fixed rank from the top.

use thiserror::Error;

use crate::domain::AnalysisConfig;
use crate::math::{kth_largest, quantile};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    #[error("series is empty")]
    EmptySeries,

    #[error("grid needs at least 2 points, got {0}")]
    InvalidCount(usize),

    #[error("degenerate threshold grid: stop {stop} is not above start {start}")]
    Degenerate { start: f64, stop: f64 },
}

/// Generate `steps` linearly spaced points between `start` and `stop` (inclusive).
///
/// The last point is exactly `stop`.
pub fn linear_space(start: f64, stop: f64, steps: usize) -> Result<Vec<f64>, GridError> {
    if steps < 2 {
        return Err(GridError::InvalidCount(steps));
    }
    if !(start.is_finite() && stop.is_finite() && stop > start) {
        return Err(GridError::Degenerate { start, stop });
    }

    let step = (stop - start) / (steps as f64 - 1.0);
    let mut out = Vec::with_capacity(steps);
    for i in 0..steps - 1 {
        out.push(start + step * i as f64);
    }
    out.push(stop);
    Ok(out)
}

/// Grid bounds: (quantile of values, k-th largest value).
pub fn grid_bounds(values: &[f64], config: &AnalysisConfig) -> Result<(f64, f64), GridError> {
    let start = quantile(values, config.grid_quantile).ok_or(GridError::EmptySeries)?;
    let stop = kth_largest(values, config.grid_top_rank).ok_or(GridError::EmptySeries)?;
    Ok((start, stop))
}

/// Build the candidate threshold grid for a series.
pub fn threshold_grid(values: &[f64], config: &AnalysisConfig) -> Result<Vec<f64>, GridError> {
    let (start, stop) = grid_bounds(values, config)?;
    linear_space(start, stop, config.n_thresholds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_space_includes_endpoints() {
        let v = linear_space(60.0, 95.0, 100).unwrap();
        assert_eq!(v.len(), 100);
        assert_eq!(v[0], 60.0);
        assert_eq!(v[99], 95.0);
        assert!(v.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn linear_space_rejects_inverted_range() {
        assert!(matches!(
            linear_space(5.0, 5.0, 10),
            Err(GridError::Degenerate { .. })
        ));
        assert_eq!(linear_space(0.0, 1.0, 1), Err(GridError::InvalidCount(1)));
    }

    #[test]
    fn grid_spans_quantile_to_tenth_largest() {
        let values: Vec<f64> = (1..=500).map(f64::from).collect();
        let config = AnalysisConfig::default();
        let grid = threshold_grid(&values, &config).unwrap();
        assert_eq!(grid.len(), 100);
        // 0.8 quantile of 1..=500: h = 499 * 0.8 = 399.2 -> 400.2
        assert!((grid[0] - 400.2).abs() < 1e-9);
        assert_eq!(grid[99], 491.0);
    }

    #[test]
    fn constant_series_gives_degenerate_grid() {
        let values = vec![3.0; 50];
        let err = threshold_grid(&values, &AnalysisConfig::default()).unwrap_err();
        assert_eq!(err, GridError::Degenerate { start: 3.0, stop: 3.0 });
    }

    #[test]
    fn empty_series_is_reported() {
        assert_eq!(
            threshold_grid(&[], &AnalysisConfig::default()),
            Err(GridError::EmptySeries)
        );
    }
}
