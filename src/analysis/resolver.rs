//! Final threshold resolution.
//!
//! Combines the stable regions of both parameters with the agreement (XX) and
//! crossover (YY) markers. Only the first shape/scale overlap is ever used.

use serde::{Deserialize, Serialize};

use crate::analysis::agreement::{Agreement, detect_agreement};
use crate::analysis::stability::stable_regions;
use crate::domain::{
    AnalysisConfig, AnalysisResultSet, ParamColumn, ResolutionRule, StableRegion, ThresholdReport,
};

/// Resolver output: the overlaps it saw, the threshold, and the branch taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub overlaps: Vec<StableRegion>,
    pub final_threshold: Option<f64>,
    pub rule: ResolutionRule,
}

/// Pairwise intersections of shape and scale regions, shape-major.
///
/// Touching intervals (`max(start) == min(end)`) do not overlap.
pub fn find_overlaps(shape: &[StableRegion], scale: &[StableRegion]) -> Vec<StableRegion> {
    shape
        .iter()
        .flat_map(|s| {
            scale.iter().filter_map(move |c| {
                let start = s.start.max(c.start);
                let end = s.end.min(c.end);
                (start < end).then(|| StableRegion::new(start, end))
            })
        })
        .collect()
}

/// Midpoint closest to `target` among `regions`; the first wins ties.
fn nearest_midpoint<'a>(target: f64, regions: impl IntoIterator<Item = &'a StableRegion>) -> Option<f64> {
    let mut best: Option<(f64, f64)> = None;
    for region in regions {
        let mid = region.midpoint();
        let dist = (mid - target).abs();
        if best.is_none_or(|(_, d)| dist < d) {
            best = Some((mid, dist));
        }
    }
    best.map(|(mid, _)| mid)
}

/// `(xx + nearest midpoint) / 2`, or `xx` itself when there are no regions.
fn fall_back_to_nearest(xx: f64, shape: &[StableRegion], scale: &[StableRegion]) -> (f64, ResolutionRule) {
    match nearest_midpoint(xx, shape.iter().chain(scale)) {
        Some(mid) => ((xx + mid) / 2.0, ResolutionRule::NearestRegion),
        None => (xx, ResolutionRule::AgreementOnly),
    }
}

fn with_crossover(
    xx: f64,
    yy: f64,
    shape: &[StableRegion],
    scale: &[StableRegion],
    overlaps: &[StableRegion],
) -> (f64, ResolutionRule) {
    if let Some(first) = overlaps.first() {
        let c = first.midpoint();
        return if xx < first.start {
            if yy <= first.end {
                ((c + yy) / 2.0, ResolutionRule::OverlapWithCrossover)
            } else {
                (c, ResolutionRule::OverlapCenter)
            }
        } else {
            ((c + xx) / 2.0, ResolutionRule::OverlapWithAgreement)
        };
    }

    let (lo, hi) = if xx <= yy { (xx, yy) } else { (yy, xx) };
    let markers = StableRegion::new(lo, hi);
    let inside = shape
        .iter()
        .chain(scale)
        .filter(|r| markers.contains(r.start) && markers.contains(r.end));
    match nearest_midpoint(xx, inside) {
        Some(mid) => (mid, ResolutionRule::RegionBetweenMarkers),
        None => fall_back_to_nearest(xx, shape, scale),
    }
}

fn without_crossover(
    xx: f64,
    shape: &[StableRegion],
    scale: &[StableRegion],
    overlaps: &[StableRegion],
) -> (f64, ResolutionRule) {
    if let Some(first) = overlaps.first() {
        return ((first.midpoint() + xx) / 2.0, ResolutionRule::OverlapWithAgreement);
    }

    let after = shape.iter().chain(scale).filter(|r| r.midpoint() >= xx);
    match nearest_midpoint(xx, after) {
        Some(mid) => (mid, ResolutionRule::RegionAfterAgreement),
        None => fall_back_to_nearest(xx, shape, scale),
    }
}

/// Resolve the final threshold from stable regions and agreement markers.
pub fn resolve(
    shape: &[StableRegion],
    scale: &[StableRegion],
    xx: Option<f64>,
    yy: Option<f64>,
) -> Resolution {
    let overlaps = find_overlaps(shape, scale);
    let Some(xx) = xx else {
        return Resolution {
            overlaps,
            final_threshold: None,
            rule: ResolutionRule::Unavailable,
        };
    };

    let (t, rule) = match yy {
        Some(yy) => with_crossover(xx, yy, shape, scale, &overlaps),
        None => without_crossover(xx, shape, scale, &overlaps),
    };
    Resolution {
        overlaps,
        final_threshold: Some(t),
        rule,
    }
}

/// Run stages 2-4 on a fitted result set.
pub fn build_report(results: &AnalysisResultSet, config: &AnalysisConfig) -> (Agreement, ThresholdReport) {
    let stable_shape = stable_regions(results, ParamColumn::Shape, config);
    let stable_scale = stable_regions(results, ParamColumn::Scale, config);
    let agreement = detect_agreement(results, config);
    let resolution = resolve(&stable_shape, &stable_scale, agreement.xx, agreement.yy);

    let report = ThresholdReport {
        stable_shape,
        stable_scale,
        xx: agreement.xx,
        yy: agreement.yy,
        overlaps: resolution.overlaps,
        final_threshold: resolution.final_threshold,
        rule: resolution.rule,
    };
    (agreement, report)
}
