//! Delimited-text exports: per-series results tables and the batch threshold list.
//!
//! Both tables are meant to be easy to consume in spreadsheets or downstream scripts.

use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::domain::{AnalysisResultSet, ThresholdRow};
use crate::error::{AppError, EXIT_USAGE};

/// Column headers of the per-series results table.
pub const RESULTS_HEADER: [&str; 7] = [
    "Threshold",
    "Shape",
    "Scale",
    "Return value (GPD)",
    "Return value (ED)",
    "AIC_GPD",
    "AIC_ED",
];

/// Column headers of the batch threshold export.
pub const THRESHOLDS_HEADER: [&str; 2] = ["file_name", "final_threshold"];

fn write_err(what: &str, e: impl std::fmt::Display) -> AppError {
    AppError::new(EXIT_USAGE, format!("Failed to write {what}: {e}"))
}

/// Write one series' results table. NaN cells are written as `NaN`.
pub fn write_results_table<W: Write>(writer: W, results: &AnalysisResultSet) -> Result<(), AppError> {
    let mut w = csv::Writer::from_writer(writer);
    w.write_record(RESULTS_HEADER)
        .map_err(|e| write_err("results header", e))?;
    for r in &results.rows {
        w.write_record([
            r.threshold.to_string(),
            r.shape.to_string(),
            r.scale.to_string(),
            r.return_value_gpd.to_string(),
            r.return_value_exponential.to_string(),
            r.aic_gpd.to_string(),
            r.aic_exponential.to_string(),
        ])
        .map_err(|e| write_err("results row", e))?;
    }
    w.flush().map_err(|e| write_err("results table", e))
}

/// Write one series' results table to `path`.
pub fn write_results_csv(path: &Path, results: &AnalysisResultSet) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(EXIT_USAGE, format!("Failed to create results CSV '{}': {e}", path.display())))?;
    write_results_table(file, results)
}

/// File stem used to name a series' exports.
pub fn output_stem(series_name: &str) -> String {
    Path::new(series_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| series_name.to_string())
}

/// One export stem per series name, in input order.
///
/// Stems shared by several series get the 1-based input index appended
/// (`x_1`, `x_3`), so no two series write to the same file.
pub fn unique_output_stems(series_names: &[&str]) -> Vec<String> {
    let stems: Vec<String> = series_names.iter().map(|n| output_stem(n)).collect();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for stem in &stems {
        *counts.entry(stem.as_str()).or_default() += 1;
    }
    stems
        .iter()
        .enumerate()
        .map(|(i, stem)| {
            if counts[stem.as_str()] > 1 {
                format!("{stem}_{}", i + 1)
            } else {
                stem.clone()
            }
        })
        .collect()
}

/// Path of the results table for the export stem `stem` inside `dir`.
pub fn results_path(dir: &Path, stem: &str) -> PathBuf {
    dir.join(format!("{stem}_results.csv"))
}

/// Write `(file_name, final_threshold)` rows; unavailable thresholds are empty cells.
pub fn write_thresholds_table<W: Write>(writer: W, rows: &[ThresholdRow]) -> Result<(), AppError> {
    let mut w = csv::Writer::from_writer(writer);
    w.write_record(THRESHOLDS_HEADER)
        .map_err(|e| write_err("thresholds header", e))?;
    for row in rows {
        let t = row.final_threshold.map(|t| t.to_string()).unwrap_or_default();
        w.write_record([row.file_name.as_str(), t.as_str()])
            .map_err(|e| write_err("thresholds row", e))?;
    }
    w.flush().map_err(|e| write_err("thresholds table", e))
}

/// Write the batch threshold export to `path`.
pub fn write_thresholds_csv(path: &Path, rows: &[ThresholdRow]) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::new(EXIT_USAGE, format!("Failed to create thresholds CSV '{}': {e}", path.display()))
    })?;
    write_thresholds_table(file, rows)
}
