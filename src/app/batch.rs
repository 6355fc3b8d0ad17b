//! Batch driver: run the pipeline over many series in parallel.
//!
//! Each series is independent. Outcomes are collected in input order, one slot
//! per source. A per-series failure never aborts the batch, and cancellation is
//! checked before each series starts; series already completed are kept as-is.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use tracing::{info, warn};

use crate::app::pipeline::{SeriesAnalysis, analyze_series};
use crate::domain::{AnalysisConfig, Series, ThresholdRow};
use crate::error::{AppError, EXIT_USAGE};
use crate::io::series::{read_series_csv, series_name};

/// Shared cooperative cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Where a batch gets its series from.
pub trait SeriesSource: Sync {
    /// Display name, also used as `file_name` in the threshold export.
    fn name(&self) -> String;
    fn load(&self) -> Result<Series, AppError>;
}

impl SeriesSource for PathBuf {
    fn name(&self) -> String {
        series_name(self)
    }

    fn load(&self) -> Result<Series, AppError> {
        read_series_csv(self)
    }
}

impl SeriesSource for Series {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn load(&self) -> Result<Series, AppError> {
        Ok(self.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SeriesStatus {
    Completed(Box<SeriesAnalysis>),
    Failed(String),
    Cancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesOutcome {
    pub name: String,
    pub status: SeriesStatus,
}

impl SeriesOutcome {
    pub fn analysis(&self) -> Option<&SeriesAnalysis> {
        match &self.status {
            SeriesStatus::Completed(a) => Some(a),
            _ => None,
        }
    }
}

/// Per-series outcomes, in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    pub outcomes: Vec<SeriesOutcome>,
}

impl BatchOutcome {
    pub fn completed(&self) -> usize {
        self.count(|s| matches!(s, SeriesStatus::Completed(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, SeriesStatus::Failed(_)))
    }

    pub fn cancelled(&self) -> usize {
        self.count(|s| matches!(s, SeriesStatus::Cancelled))
    }

    fn count(&self, pred: impl Fn(&SeriesStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }

    /// Rows for the threshold export. Failed series get an empty threshold;
    /// cancelled series were never processed and are left out.
    pub fn threshold_rows(&self) -> Vec<ThresholdRow> {
        self.outcomes
            .iter()
            .filter_map(|o| match &o.status {
                SeriesStatus::Completed(a) => Some(ThresholdRow {
                    file_name: o.name.clone(),
                    final_threshold: a.final_threshold(),
                }),
                SeriesStatus::Failed(_) => Some(ThresholdRow {
                    file_name: o.name.clone(),
                    final_threshold: None,
                }),
                SeriesStatus::Cancelled => None,
            })
            .collect()
    }
}

fn process_one<S: SeriesSource>(source: &S, config: &AnalysisConfig, cancel: &CancellationToken) -> SeriesOutcome {
    let name = source.name();
    if cancel.is_cancelled() {
        return SeriesOutcome {
            name,
            status: SeriesStatus::Cancelled,
        };
    }

    let status = match source.load() {
        Ok(series) if series.is_empty() => {
            warn!(series = %name, "no observations");
            SeriesStatus::Failed("no observations".to_string())
        }
        Ok(series) => SeriesStatus::Completed(Box::new(analyze_series(&series, config))),
        Err(e) => {
            warn!(series = %name, "{e}");
            SeriesStatus::Failed(e.message().to_string())
        }
    };
    SeriesOutcome { name, status }
}

/// Run the pipeline over every source on the current rayon pool.
pub fn run_batch<S: SeriesSource>(
    sources: &[S],
    config: &AnalysisConfig,
    cancel: &CancellationToken,
) -> BatchOutcome {
    let outcomes: Vec<SeriesOutcome> = sources
        .par_iter()
        .map(|s| process_one(s, config, cancel))
        .collect();
    let batch = BatchOutcome { outcomes };
    info!(
        completed = batch.completed(),
        failed = batch.failed(),
        cancelled = batch.cancelled(),
        "batch finished"
    );
    batch
}

/// Like [`run_batch`], on a dedicated pool of `threads` workers when given.
pub fn run_batch_with_threads<S: SeriesSource>(
    sources: &[S],
    config: &AnalysisConfig,
    cancel: &CancellationToken,
    threads: Option<usize>,
) -> Result<BatchOutcome, AppError> {
    let Some(threads) = threads else {
        return Ok(run_batch(sources, config, cancel));
    };
    if threads == 0 {
        return Err(AppError::new(EXIT_USAGE, "Thread count must be >= 1."));
    }
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| AppError::new(EXIT_USAGE, format!("Failed to build thread pool: {e}")))?;
    Ok(pool.install(|| run_batch(sources, config, cancel)))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Broken;

    impl SeriesSource for Broken {
        fn name(&self) -> String {
            "broken.csv".to_string()
        }

        fn load(&self) -> Result<Series, AppError> {
            Err(AppError::new(EXIT_USAGE, "unreadable"))
        }
    }

    #[test]
    fn failures_do_not_abort_the_batch() {
        let sources = vec![
            Series::from_values("flat.csv", &[1.0; 50]),
            Series::from_values("empty.csv", &[]),
        ];
        let batch = run_batch(&sources, &AnalysisConfig::default(), &CancellationToken::new());
        assert_eq!(batch.outcomes.len(), 2);
        assert_eq!(batch.completed(), 1);
        assert_eq!(batch.failed(), 1);
        assert_eq!(batch.outcomes[0].name, "flat.csv");
        assert_eq!(
            batch.threshold_rows(),
            vec![
                ThresholdRow {
                    file_name: "flat.csv".into(),
                    final_threshold: None
                },
                ThresholdRow {
                    file_name: "empty.csv".into(),
                    final_threshold: None
                },
            ]
        );

        let batch = run_batch(&[Broken], &AnalysisConfig::default(), &CancellationToken::new());
        assert_eq!(batch.outcomes[0].status, SeriesStatus::Failed("unreadable".into()));
    }

    #[test]
    fn cancelled_batch_marks_every_series() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let sources = vec![Series::from_values("a", &[1.0, 2.0, 3.0])];
        let batch = run_batch(&sources, &AnalysisConfig::default(), &cancel);
        assert_eq!(batch.cancelled(), 1);
        assert!(batch.threshold_rows().is_empty());
    }

    /// Cancels the batch while being loaded.
    struct CancelOnLoad {
        series: Series,
        cancel: CancellationToken,
    }

    impl SeriesSource for CancelOnLoad {
        fn name(&self) -> String {
            self.series.name.clone()
        }

        fn load(&self) -> Result<Series, AppError> {
            self.cancel.cancel();
            Ok(self.series.clone())
        }
    }

    fn ramp(name: &str, n: usize) -> Series {
        let values: Vec<f64> = (1..=n).map(|i| i as f64).collect();
        Series::from_values(name, &values)
    }

    #[test]
    fn cancelling_midway_keeps_completed_series() {
        let config = AnalysisConfig::default();
        let cancel = CancellationToken::new();
        let sources: Vec<CancelOnLoad> = [("a.csv", false), ("b.csv", true), ("c.csv", false), ("d.csv", false)]
            .into_iter()
            .map(|(name, trips)| CancelOnLoad {
                series: ramp(name, 60),
                cancel: if trips { cancel.clone() } else { CancellationToken::new() },
            })
            .collect();

        let batch = run_batch_with_threads(&sources, &config, &cancel, Some(1)).unwrap();
        assert_eq!(batch.completed(), 2);
        assert_eq!(batch.cancelled(), 2);
        for (outcome, source) in batch.outcomes.iter().zip(&sources).take(2) {
            assert_eq!(outcome.analysis(), Some(&analyze_series(&source.series, &config)));
        }
        assert!(batch.outcomes[2..].iter().all(|o| o.status == SeriesStatus::Cancelled));

        let rows = batch.threshold_rows();
        let names: Vec<&str> = rows.iter().map(|r| r.file_name.as_str()).collect();
        assert_eq!(names, ["a.csv", "b.csv"]);
        assert_eq!(rows[0].final_threshold, batch.outcomes[0].analysis().unwrap().final_threshold());
    }

    #[test]
    fn dedicated_pool_matches_default_pool() {
        let sources = vec![Series::from_values("a", &[2.0; 30])];
        let config = AnalysisConfig::default();
        let cancel = CancellationToken::new();
        let a = run_batch(&sources, &config, &cancel);
        let b = run_batch_with_threads(&sources, &config, &cancel, Some(2)).unwrap();
        assert_eq!(a, b);
        assert!(run_batch_with_threads(&sources, &config, &cancel, Some(0)).is_err());
    }
}
