//! Terminal output for series analyses and batches.
//!
//! We keep formatting code in one place so:
//! - the numerical code stays clean and testable
//! - output changes are localized

use crate::app::batch::{BatchOutcome, SeriesStatus};
use crate::app::pipeline::SeriesAnalysis;
use crate::domain::{AnalysisResultSet, ParamColumn, StableRegion, SummaryStats};
use crate::models::ModelKind;

const MISSING: &str = "-";

/// Ranges `a - b`, `items_per_line` per line joined by ` || `, values at 2 decimals.
pub fn format_ranges_multiline(ranges: &[StableRegion], items_per_line: usize) -> String {
    if ranges.is_empty() {
        return "No stable ranges identified".to_string();
    }
    ranges
        .chunks(items_per_line.max(1))
        .map(|chunk| {
            chunk
                .iter()
                .map(|r| format!("{:.2} - {:.2}", r.start, r.end))
                .collect::<Vec<_>>()
                .join(" || ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.4}")).unwrap_or_else(|| MISSING.to_string())
}

fn format_summary(stats: &SummaryStats) -> String {
    format!(
        "Count: {} | Min: {:.2} | Max: {:.2}\n\
         Mean: {:.2} | Median: {:.2} | Std Dev: {}\n\
         25th Percentile: {:.2} | 75th Percentile: {:.2} | 90th Percentile: {:.2}\n",
        stats.count,
        stats.min,
        stats.max,
        stats.mean,
        stats.median,
        stats.std.map(|s| format!("{s:.2}")).unwrap_or_else(|| MISSING.to_string()),
        stats.q25,
        stats.q75,
        stats.q90,
    )
}

/// Full per-series report: input statistics, fit diagnostics and the threshold decision.
pub fn format_series_report(analysis: &SeriesAnalysis) -> String {
    let mut out = String::new();
    let report = &analysis.report;
    let diag = &analysis.results.diagnostics;

    out.push_str(&format!("=== {} ===\n", analysis.name));
    match &analysis.summary {
        Some(stats) => out.push_str(&format_summary(stats)),
        None => out.push_str("No observations.\n"),
    }

    out.push_str("\nFit:\n");
    if diag.degenerate_grid {
        out.push_str("- degenerate threshold grid, nothing fitted\n");
    } else {
        out.push_str(&format!(
            "- thresholds fitted: {}/{} (skipped: {} too few exceedances, {} non-converged)\n",
            diag.fitted, diag.grid_len, diag.skipped_insufficient, diag.skipped_nonconvergence
        ));
    }

    out.push('\n');
    for (column, regions) in [
        (ParamColumn::Shape, &report.stable_shape),
        (ParamColumn::Scale, &report.stable_scale),
    ] {
        out.push_str(&format!(
            "Stable Ranges ({}):\n{}\n",
            column.display_name(),
            format_ranges_multiline(regions, 2)
        ));
    }
    out.push_str(&format!("XX (First agreement threshold): {}\n", fmt_opt(report.xx)));
    out.push_str(&format!("YY (Crossover point): {}\n", fmt_opt(report.yy)));
    out.push_str(&format!(
        "Overlapping Stable Regions Exist: {}\n",
        report.overlap_exists()
    ));
    if report.overlap_exists() {
        out.push_str(&format!(
            "Overlapping Ranges:\n{}\n",
            format_ranges_multiline(&report.overlaps, 2)
        ));
    }
    out.push_str(&format!(
        "Final Threshold (T): {} [{}]\n",
        fmt_opt(report.final_threshold),
        report.rule.description()
    ));

    out
}

/// Fixed-width results table for terminal display.
pub fn format_results_table(results: &AnalysisResultSet) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:>12} {:>10} {:>10} {:>14} {:>14} {:>12} {:>12}",
            "threshold",
            "shape",
            "scale",
            format!("rv_{}", ModelKind::Gpd.display_name()),
            format!("rv_{}", ModelKind::Exponential.display_name()),
            format!("aic_{}", ModelKind::Gpd.display_name()),
            format!("aic_{}", ModelKind::Exponential.display_name()),
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(&format!(
        "{:-<12} {:-<10} {:-<10} {:-<14} {:-<14} {:-<12} {:-<12}\n",
        "", "", "", "", "", "", ""
    ));
    for r in &results.rows {
        out.push_str(&format!(
            "{:>12.4} {:>10.4} {:>10.4} {:>14.4} {:>14.4} {:>12.3} {:>12.3}\n",
            r.threshold,
            r.shape,
            r.scale,
            r.return_value_gpd,
            r.return_value_exponential,
            r.aic_gpd,
            r.aic_exponential,
        ));
    }
    out
}

/// One line per series plus totals.
pub fn format_batch_summary(batch: &BatchOutcome) -> String {
    let mut out = String::new();
    out.push_str(format!("{:<32} {:>14} {:<}", "series", "threshold", "status").trim_end());
    out.push('\n');
    out.push_str(&format!("{:-<32} {:-<14} {:-<10}\n", "", "", ""));

    for o in &batch.outcomes {
        let (t, status) = match &o.status {
            SeriesStatus::Completed(a) => (fmt_opt(a.final_threshold()), "ok".to_string()),
            SeriesStatus::Failed(msg) => (MISSING.to_string(), format!("failed: {msg}")),
            SeriesStatus::Cancelled => (MISSING.to_string(), "cancelled".to_string()),
        };
        out.push_str(&format!("{:<32} {:>14} {}\n", truncate(&o.name, 32), t, status));
    }
    out.push_str(&format!(
        "\n{} completed, {} failed, {} cancelled\n",
        batch.completed(),
        batch.failed(),
        batch.cancelled()
    ));
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::batch::SeriesOutcome;
    use crate::app::pipeline::analyze_values;
    use crate::domain::AnalysisConfig;

    #[test]
    fn ranges_two_per_line() {
        let ranges = [
            StableRegion::new(1.0, 2.5),
            StableRegion::new(3.333, 4.0),
            StableRegion::new(10.0, 12.126),
        ];
        assert_eq!(
            format_ranges_multiline(&ranges, 2),
            "1.00 - 2.50 || 3.33 - 4.00\n10.00 - 12.13"
        );
        assert_eq!(format_ranges_multiline(&[], 2), "No stable ranges identified");
    }

    #[test]
    fn series_report_names_missing_threshold() {
        let a = analyze_values("flat.csv", &[2.0; 25], &AnalysisConfig::default());
        let text = format_series_report(&a);
        assert!(text.starts_with("=== flat.csv ===\n"));
        assert!(text.contains("degenerate threshold grid"));
        assert!(text.contains("Final Threshold (T): - [no agreement threshold]"));
        assert!(!text.contains("Overlapping Ranges"));
        assert!(text.contains("Stable Ranges (Scale):\nNo stable ranges identified\n"));
    }

    #[test]
    fn batch_summary_counts_statuses() {
        let batch = BatchOutcome {
            outcomes: vec![
                SeriesOutcome {
                    name: "a.csv".into(),
                    status: SeriesStatus::Failed("bad".into()),
                },
                SeriesOutcome {
                    name: "b.csv".into(),
                    status: SeriesStatus::Cancelled,
                },
            ],
        };
        let text = format_batch_summary(&batch);
        assert!(text.contains("failed: bad"));
        assert!(text.ends_with("0 completed, 1 failed, 1 cancelled\n"));
    }

    #[test]
    fn results_table_labels_both_models() {
        let header = format_results_table(&AnalysisResultSet::default());
        assert!(header.lines().next().unwrap().ends_with("rv_GPD          rv_ED      aic_GPD       aic_ED"));
    }

    #[test]
    fn truncate_marks_cut() {
        assert_eq!(truncate("abcdef", 4), "abc.");
        assert_eq!(truncate("abc", 4), "abc");
    }
}
