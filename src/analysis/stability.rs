//! Parameter stability scan.
//!
//! A POT threshold is defensible where the fitted parameters stop drifting as
//! the threshold moves. We standardise a parameter column, slide a short
//! window along the rows, and measure the absolute least-squares slope of the
//! parameter against threshold in each window. The flattest windows become
//! candidate stable intervals, which are then merged when they sit close to
//! each other.

use crate::domain::{AnalysisConfig, AnalysisResultSet, ParamColumn, StableRegion};
use crate::math::{linear_slope, standardize};

/// Absolute slope of one window, keyed by its first row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowSlope {
    pub start_idx: usize,
    pub abs_slope: f64,
}

/// Window length for `n_rows`: `round(fraction · n)` clamped to the configured bounds.
pub fn segment_size(n_rows: usize, config: &AnalysisConfig) -> usize {
    let raw = (config.segment_fraction * n_rows as f64).round() as usize;
    raw.clamp(config.segment_min, config.segment_max)
}

/// Absolute slope for every window of `size` consecutive rows (step 1).
///
/// Windows whose regression is undefined get an infinite slope so they rank last.
pub fn window_slopes(thresholds: &[f64], values: &[f64], size: usize) -> Vec<WindowSlope> {
    if size == 0 || thresholds.len() < size || values.len() != thresholds.len() {
        return Vec::new();
    }
    (0..=thresholds.len() - size)
        .map(|i| {
            let abs_slope = linear_slope(&thresholds[i..i + size], &values[i..i + size])
                .map(f64::abs)
                .unwrap_or(f64::INFINITY);
            WindowSlope {
                start_idx: i,
                abs_slope,
            }
        })
        .collect()
}

/// Merge candidate intervals that lie within half their average width of each other.
///
/// Candidates are sorted by start (then end), and merged in one left-to-right pass.
pub fn merge_regions(mut candidates: Vec<StableRegion>) -> Vec<StableRegion> {
    if candidates.is_empty() {
        return candidates;
    }
    candidates.sort_by(|a, b| a.start.total_cmp(&b.start).then(a.end.total_cmp(&b.end)));

    let avg_width = candidates.iter().map(StableRegion::width).sum::<f64>() / candidates.len() as f64;
    let merge_distance = avg_width / 2.0;

    let mut merged: Vec<StableRegion> = Vec::with_capacity(candidates.len());
    for region in candidates {
        match merged.last_mut() {
            Some(prev) if region.start - prev.end <= merge_distance => {
                prev.end = prev.end.max(region.end);
            }
            _ => merged.push(region),
        }
    }
    merged
}

/// Stable regions of one parameter column.
///
/// - fewer rows than the window length: no regions
/// - constant column (zero variance): one region spanning all rows
pub fn stable_regions(
    results: &AnalysisResultSet,
    column: ParamColumn,
    config: &AnalysisConfig,
) -> Vec<StableRegion> {
    let thresholds = results.thresholds();
    let (Some(&first), Some(&last)) = (thresholds.first(), thresholds.last()) else {
        return Vec::new();
    };

    let Some(normalized) = standardize(&results.column(column)) else {
        return vec![StableRegion::new(first, last)];
    };

    let size = segment_size(thresholds.len(), config);
    let mut slopes = window_slopes(&thresholds, &normalized, size);
    // Stable sort: ties keep the earliest window first.
    slopes.sort_by(|a, b| a.abs_slope.total_cmp(&b.abs_slope));

    let candidates = slopes
        .iter()
        .take(config.top_segments)
        .map(|w| StableRegion::new(thresholds[w.start_idx], thresholds[w.start_idx + size - 1]))
        .collect();

    merge_regions(candidates)
}
