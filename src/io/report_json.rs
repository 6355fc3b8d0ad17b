//! Read/write per-series report JSON files.
//!
//! A report file is the portable summary of one analysed series: input
//! statistics, fit diagnostics and the threshold report (stable regions,
//! markers, overlaps, final threshold and the rule that produced it).

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::app::pipeline::SeriesAnalysis;
use crate::domain::{FitDiagnostics, SummaryStats, ThresholdReport};
use crate::error::{AppError, EXIT_USAGE};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportFile {
    pub tool: String,
    pub series: String,
    pub summary: Option<SummaryStats>,
    pub diagnostics: FitDiagnostics,
    pub report: ThresholdReport,
}

impl ReportFile {
    pub fn from_analysis(analysis: &SeriesAnalysis) -> Self {
        Self {
            tool: "evt".to_string(),
            series: analysis.name.clone(),
            summary: analysis.summary.clone(),
            diagnostics: analysis.results.diagnostics.clone(),
            report: analysis.report.clone(),
        }
    }
}

/// Path of the report for the export stem `stem` inside `dir`.
pub fn report_path(dir: &Path, stem: &str) -> PathBuf {
    dir.join(format!("{stem}_report.json"))
}

pub fn write_report<W: Write>(writer: W, analysis: &SeriesAnalysis) -> Result<(), AppError> {
    serde_json::to_writer_pretty(writer, &ReportFile::from_analysis(analysis))
        .map_err(|e| AppError::new(EXIT_USAGE, format!("Failed to write report JSON: {e}")))
}

pub fn write_report_json(path: &Path, analysis: &SeriesAnalysis) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(EXIT_USAGE, format!("Failed to create report JSON '{}': {e}", path.display())))?;
    write_report(file, analysis)
}

pub fn read_report<R: Read>(reader: R) -> Result<ReportFile, AppError> {
    serde_json::from_reader(reader).map_err(|e| AppError::new(EXIT_USAGE, format!("Invalid report JSON: {e}")))
}

pub fn read_report_json(path: &Path) -> Result<ReportFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(EXIT_USAGE, format!("Failed to open report JSON '{}': {e}", path.display())))?;
    read_report(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::analyze_values;
    use crate::domain::{AnalysisConfig, ResolutionRule};

    #[test]
    fn report_survives_json() {
        let analysis = analyze_values("flat.csv", &[5.0; 30], &AnalysisConfig::default());
        let mut buf = Vec::new();
        write_report(&mut buf, &analysis).unwrap();
        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.contains("\"rule\": \"unavailable\""));

        let back = read_report(buf.as_slice()).unwrap();
        assert_eq!(back, ReportFile::from_analysis(&analysis));
        assert_eq!(back.report.rule, ResolutionRule::Unavailable);
        assert!(back.diagnostics.degenerate_grid);
    }

    #[test]
    fn rejects_malformed_json() {
        let err = read_report("{".as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_USAGE);
    }
}
