//! Shared analysis pipeline used by the CLI, the batch driver and the session cache.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! values -> threshold sweep -> stability + agreement -> resolution
//!
//! Front-ends only decide where series come from and how results are presented.

use serde::{Deserialize, Serialize};

use crate::analysis::{Agreement, build_report};
use crate::domain::{AnalysisConfig, AnalysisResultSet, Series, SummaryStats, ThresholdReport};
use crate::fit::analyze_thresholds;
use crate::math::summary_stats;

/// All computed outputs for one series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesAnalysis {
    pub name: String,
    /// `None` only for an empty series.
    pub summary: Option<SummaryStats>,
    pub results: AnalysisResultSet,
    pub agreement: Agreement,
    pub report: ThresholdReport,
}

impl SeriesAnalysis {
    pub fn final_threshold(&self) -> Option<f64> {
        self.report.final_threshold
    }
}

/// Run the full pipeline on one series. Pure: the same input always yields the same output.
pub fn analyze_series(series: &Series, config: &AnalysisConfig) -> SeriesAnalysis {
    let values = series.values();
    analyze_values(&series.name, &values, config)
}

/// Run the full pipeline on bare values.
pub fn analyze_values(name: &str, values: &[f64], config: &AnalysisConfig) -> SeriesAnalysis {
    let results = analyze_thresholds(values, config);
    let (agreement, report) = build_report(&results, config);
    SeriesAnalysis {
        name: name.to_string(),
        summary: summary_stats(values),
        results,
        agreement,
        report,
    }
}
