//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting and analysis
//! - exported to CSV/JSON
//! - handed to presentation layers without copying internals

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, EXIT_USAGE};

/// Return period (years) for the return-value estimates.
pub const DEFAULT_RETURN_PERIOD: f64 = 100.0;
/// Observations per year (daily data over a Gregorian year).
pub const DEFAULT_RETURN_PERIOD_SIZE: f64 = 365.2425;
/// Number of candidate thresholds in the grid.
pub const DEFAULT_N_THRESHOLDS: usize = 100;
/// A threshold needs at least this many exceedances to be fitted.
pub const DEFAULT_MIN_EXCEEDANCES: usize = 10;

/// One observation of the cleaned input series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

/// A named, cleaned univariate series (ordered, finite values).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub observations: Vec<Observation>,
}

impl Series {
    pub fn new(name: impl Into<String>, observations: Vec<Observation>) -> Self {
        Self {
            name: name.into(),
            observations,
        }
    }

    /// Build a series from bare values with daily timestamps starting at 1970-01-01.
    pub fn from_values(name: impl Into<String>, values: &[f64]) -> Self {
        let epoch = NaiveDateTime::default();
        let observations = values
            .iter()
            .enumerate()
            .map(|(i, &value)| Observation {
                timestamp: epoch + chrono::Duration::days(i as i64),
                value,
            })
            .collect();
        Self::new(name, observations)
    }

    pub fn values(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.value).collect()
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

/// Which fitted parameter a stability scan runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamColumn {
    Shape,
    Scale,
}

impl ParamColumn {
    pub fn display_name(self) -> &'static str {
        match self {
            ParamColumn::Shape => "Shape",
            ParamColumn::Scale => "Scale",
        }
    }

    pub fn value_of(self, row: &ThresholdFitResult) -> f64 {
        match self {
            ParamColumn::Shape => row.shape,
            ParamColumn::Scale => row.scale,
        }
    }
}

/// Fit output for a single candidate threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdFitResult {
    pub threshold: f64,
    /// GPD shape ξ.
    pub shape: f64,
    /// GPD scale σ (shared with the exponential model).
    pub scale: f64,
    pub return_value_gpd: f64,
    pub return_value_exponential: f64,
    /// Corrected AIC of the GPD fit (NaN when undefined).
    pub aic_gpd: f64,
    /// Corrected AIC of the exponential model (NaN when undefined).
    pub aic_exponential: f64,
    pub n_exceedances: usize,
}

/// Counters describing what happened to each grid point.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FitDiagnostics {
    pub grid_len: usize,
    pub fitted: usize,
    pub skipped_insufficient: usize,
    pub skipped_nonconvergence: usize,
    pub degenerate_grid: bool,
}

impl FitDiagnostics {
    pub fn skipped(&self) -> usize {
        self.skipped_insufficient + self.skipped_nonconvergence
    }
}

/// All fitted rows for one series, ascending by threshold.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResultSet {
    pub rows: Vec<ThresholdFitResult>,
    pub diagnostics: FitDiagnostics,
}

impl AnalysisResultSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn thresholds(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.threshold).collect()
    }

    pub fn column(&self, column: ParamColumn) -> Vec<f64> {
        self.rows.iter().map(|r| column.value_of(r)).collect()
    }
}

/// A closed threshold interval `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StableRegion {
    pub start: f64,
    pub end: f64,
}

impl StableRegion {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn midpoint(&self) -> f64 {
        (self.start + self.end) / 2.0
    }

    pub fn width(&self) -> f64 {
        self.end - self.start
    }

    pub fn contains(&self, value: f64) -> bool {
        self.start <= value && value <= self.end
    }
}

/// Per-row agreement signal between the two return-value predictions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgreementCurve {
    pub thresholds: Vec<f64>,
    pub abs_diff: Vec<f64>,
    pub normalized_abs_diff: Vec<f64>,
    pub smoothed: Vec<f64>,
}

/// Which resolver branch produced the final threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionRule {
    /// No agreement point: nothing to resolve.
    Unavailable,
    /// Agreement before the first overlap; crossover inside it.
    OverlapWithCrossover,
    /// Agreement before the first overlap; crossover past it.
    OverlapCenter,
    /// Agreement inside or past the first overlap.
    OverlapWithAgreement,
    /// A stable region lies fully between agreement and crossover.
    RegionBetweenMarkers,
    /// A stable region midpoint at or after the agreement point.
    RegionAfterAgreement,
    /// Average of the agreement point and the nearest region midpoint.
    NearestRegion,
    /// No stable regions at all: the agreement point itself.
    AgreementOnly,
}

impl ResolutionRule {
    pub fn description(self) -> &'static str {
        match self {
            ResolutionRule::Unavailable => "no agreement threshold",
            ResolutionRule::OverlapWithCrossover => "overlap centre averaged with crossover",
            ResolutionRule::OverlapCenter => "overlap centre",
            ResolutionRule::OverlapWithAgreement => "overlap centre averaged with agreement",
            ResolutionRule::RegionBetweenMarkers => "stable region between agreement and crossover",
            ResolutionRule::RegionAfterAgreement => "nearest stable region after agreement",
            ResolutionRule::NearestRegion => "agreement averaged with nearest stable region",
            ResolutionRule::AgreementOnly => "agreement threshold (no stable regions)",
        }
    }
}

/// Everything the presentation layer needs to explain a final threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdReport {
    pub stable_shape: Vec<StableRegion>,
    pub stable_scale: Vec<StableRegion>,
    /// First agreement threshold.
    pub xx: Option<f64>,
    /// Crossover threshold.
    pub yy: Option<f64>,
    pub overlaps: Vec<StableRegion>,
    pub final_threshold: Option<f64>,
    pub rule: ResolutionRule,
}

impl ThresholdReport {
    pub fn overlap_exists(&self) -> bool {
        !self.overlaps.is_empty()
    }
}

/// Descriptive statistics of the input values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; undefined for a single observation.
    pub std: Option<f64>,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub q90: f64,
    pub max: f64,
}

/// One row of the batch threshold export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdRow {
    pub file_name: String,
    pub final_threshold: Option<f64>,
}

/// Analysis configuration.
///
/// Defaults reproduce the standard methodology; every knob is exposed on the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Quantile of the values where the threshold grid starts.
    pub grid_quantile: f64,
    /// Rank (from the top) of the value where the grid stops.
    pub grid_top_rank: usize,
    pub n_thresholds: usize,
    pub min_exceedances: usize,
    pub return_period: f64,
    pub return_period_size: f64,

    /// Fraction of the row count used as stability window length.
    pub segment_fraction: f64,
    pub segment_min: usize,
    pub segment_max: usize,
    /// Number of flattest windows kept as stable-region candidates.
    pub top_segments: usize,

    pub smoothing_window: usize,
    /// Smoothed normalized difference below which the models agree.
    pub agreement_cutoff: f64,

    /// Iteration cap for the likelihood optimiser.
    pub max_fit_iters: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            grid_quantile: 0.8,
            grid_top_rank: 10,
            n_thresholds: DEFAULT_N_THRESHOLDS,
            min_exceedances: DEFAULT_MIN_EXCEEDANCES,
            return_period: DEFAULT_RETURN_PERIOD,
            return_period_size: DEFAULT_RETURN_PERIOD_SIZE,
            segment_fraction: 0.1,
            segment_min: 5,
            segment_max: 10,
            top_segments: 3,
            smoothing_window: 5,
            agreement_cutoff: 0.1,
            max_fit_iters: 2_000,
        }
    }
}

impl AnalysisConfig {
    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), AppError> {
        if !(self.grid_quantile.is_finite() && (0.0..=1.0).contains(&self.grid_quantile)) {
            return Err(AppError::new(
                EXIT_USAGE,
                format!("Invalid grid quantile {} (must be within [0, 1]).", self.grid_quantile),
            ));
        }
        if self.grid_top_rank == 0 {
            return Err(AppError::new(EXIT_USAGE, "Grid top rank must be >= 1."));
        }
        if self.n_thresholds < 2 {
            return Err(AppError::new(EXIT_USAGE, "Number of thresholds must be >= 2."));
        }
        // AICc of the two-parameter model needs n > 3.
        if self.min_exceedances < 4 {
            return Err(AppError::new(EXIT_USAGE, "Minimum exceedances must be >= 4."));
        }
        if !(self.return_period.is_finite() && self.return_period > 0.0) {
            return Err(AppError::new(EXIT_USAGE, "Return period must be finite and > 0."));
        }
        if !(self.return_period_size.is_finite() && self.return_period_size > 0.0) {
            return Err(AppError::new(EXIT_USAGE, "Return period size must be finite and > 0."));
        }
        if !(self.segment_fraction.is_finite() && self.segment_fraction > 0.0) {
            return Err(AppError::new(EXIT_USAGE, "Segment fraction must be finite and > 0."));
        }
        if self.segment_min < 2 || self.segment_max < self.segment_min {
            return Err(AppError::new(
                EXIT_USAGE,
                format!(
                    "Invalid segment bounds {}..={} (need 2 <= min <= max).",
                    self.segment_min, self.segment_max
                ),
            ));
        }
        if self.top_segments == 0 {
            return Err(AppError::new(EXIT_USAGE, "Top segments must be >= 1."));
        }
        if self.smoothing_window == 0 {
            return Err(AppError::new(EXIT_USAGE, "Smoothing window must be >= 1."));
        }
        if !(self.agreement_cutoff.is_finite() && self.agreement_cutoff > 0.0) {
            return Err(AppError::new(EXIT_USAGE, "Agreement cutoff must be finite and > 0."));
        }
        if self.max_fit_iters == 0 {
            return Err(AppError::new(EXIT_USAGE, "Fit iteration cap must be >= 1."));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.n_thresholds, 100);
        assert_eq!(config.min_exceedances, 10);
        assert_eq!(config.return_period_size, 365.2425);
    }

    #[test]
    fn validate_rejects_inverted_segment_bounds() {
        let config = AnalysisConfig {
            segment_min: 8,
            segment_max: 4,
            ..AnalysisConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(err.exit_code(), EXIT_USAGE);
    }

    #[test]
    fn series_from_values_uses_daily_timestamps() {
        let series = Series::from_values("s", &[1.0, 2.0, 3.0]);
        assert_eq!(series.len(), 3);
        let step = series.observations[1].timestamp - series.observations[0].timestamp;
        assert_eq!(step, chrono::Duration::days(1));
        assert_eq!(series.values(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn region_midpoint_and_width() {
        let r = StableRegion::new(10.0, 20.0);
        assert_eq!(r.midpoint(), 15.0);
        assert_eq!(r.width(), 10.0);
        assert!(r.contains(10.0) && r.contains(20.0) && !r.contains(20.5));
    }
}
