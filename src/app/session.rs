//! In-memory session over many series with per-series result caching.
//!
//! Each record keeps a content fingerprint of its series. Analyses are computed
//! on demand and reused until the series content (or the session config)
//! changes.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rayon::prelude::*;

use crate::app::batch::CancellationToken;
use crate::app::pipeline::{SeriesAnalysis, analyze_series};
use crate::domain::{AnalysisConfig, Series, ThresholdRow};
use crate::error::{AppError, EXIT_USAGE};

/// Index of a series inside a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SeriesId(usize);

#[derive(Debug, Clone)]
pub struct SeriesRecord {
    pub series: Series,
    fingerprint: u64,
    analysis: Option<SeriesAnalysis>,
}

impl SeriesRecord {
    fn new(series: Series) -> Self {
        Self {
            fingerprint: fingerprint(&series),
            series,
            analysis: None,
        }
    }

    pub fn cached(&self) -> Option<&SeriesAnalysis> {
        self.analysis.as_ref()
    }
}

/// Content hash of a series (name, timestamps and value bits).
pub fn fingerprint(series: &Series) -> u64 {
    let mut hasher = DefaultHasher::new();
    series.name.hash(&mut hasher);
    for obs in &series.observations {
        obs.timestamp.hash(&mut hasher);
        obs.value.to_bits().hash(&mut hasher);
    }
    hasher.finish()
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    config: AnalysisConfig,
    records: Vec<SeriesRecord>,
}

impl Session {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            records: Vec::new(),
        }
    }

    /// Swap the config; every cached analysis is dropped if it differs.
    pub fn set_config(&mut self, config: AnalysisConfig) {
        if config != self.config {
            self.config = config;
            for record in &mut self.records {
                record.analysis = None;
            }
        }
    }

    pub fn add_series(&mut self, series: Series) -> SeriesId {
        self.records.push(SeriesRecord::new(series));
        SeriesId(self.records.len() - 1)
    }

    pub fn record(&self, id: SeriesId) -> Option<&SeriesRecord> {
        self.records.get(id.0)
    }

    pub fn records(&self) -> &[SeriesRecord] {
        &self.records
    }

    /// Replace a series. Returns `true` when the content changed and the cached
    /// analysis was discarded.
    pub fn replace_series(&mut self, id: SeriesId, series: Series) -> Result<bool, AppError> {
        let record = self
            .records
            .get_mut(id.0)
            .ok_or_else(|| AppError::new(EXIT_USAGE, format!("Unknown series index {}", id.0)))?;
        let fp = fingerprint(&series);
        record.series = series;
        if fp == record.fingerprint {
            return Ok(false);
        }
        record.fingerprint = fp;
        record.analysis = None;
        Ok(true)
    }

    /// Analysis for `id`, computed on first access.
    pub fn analysis(&mut self, id: SeriesId) -> Option<&SeriesAnalysis> {
        let config = &self.config;
        let record = self.records.get_mut(id.0)?;
        if record.analysis.is_none() {
            record.analysis = Some(analyze_series(&record.series, config));
        }
        record.analysis.as_ref()
    }

    /// Analyse every record without a cached result, in parallel.
    ///
    /// Returns how many records were analysed. Records reached after
    /// cancellation stay pending.
    pub fn analyze_pending(&mut self, cancel: &CancellationToken) -> usize {
        self.analyze_pending_with_progress(cancel, |_| {})
    }

    /// [`Session::analyze_pending`], calling `progress` after each finished analysis.
    pub fn analyze_pending_with_progress<F>(&mut self, cancel: &CancellationToken, progress: F) -> usize
    where
        F: Fn(&SeriesAnalysis) + Sync,
    {
        let config = &self.config;
        self.records
            .par_iter_mut()
            .filter(|r| r.analysis.is_none())
            .map(|r| {
                if cancel.is_cancelled() {
                    return 0;
                }
                let analysis = r.analysis.insert(analyze_series(&r.series, config));
                progress(&*analysis);
                1
            })
            .sum()
    }

    /// `(file_name, final_threshold)` for every record; pending records have no threshold.
    pub fn thresholds(&self) -> Vec<ThresholdRow> {
        self.records
            .iter()
            .map(|r| ThresholdRow {
                file_name: r.series.name.clone(),
                final_threshold: r.analysis.as_ref().and_then(SeriesAnalysis::final_threshold),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_is_cached_until_content_changes() {
        let mut session = Session::new(AnalysisConfig::default());
        let id = session.add_series(Series::from_values("a", &[1.0; 40]));
        assert!(session.record(id).unwrap().cached().is_none());
        assert!(session.analysis(id).is_some());
        assert!(session.record(id).unwrap().cached().is_some());

        let same = Series::from_values("a", &[1.0; 40]);
        assert!(!session.replace_series(id, same).unwrap());
        assert!(session.record(id).unwrap().cached().is_some());

        let changed = Series::from_values("a", &[2.0; 40]);
        assert!(session.replace_series(id, changed).unwrap());
        assert!(session.record(id).unwrap().cached().is_none());
    }

    #[test]
    fn analyze_pending_fills_every_record_once() {
        let mut session = Session::new(AnalysisConfig::default());
        session.add_series(Series::from_values("a", &[1.0; 20]));
        session.add_series(Series::from_values("b", &[2.0; 20]));
        let cancel = CancellationToken::new();
        assert_eq!(session.analyze_pending(&cancel), 2);
        assert_eq!(session.analyze_pending(&cancel), 0);
        let rows = session.thresholds();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].file_name, "b");
    }

    #[test]
    fn cancelled_session_leaves_records_pending() {
        let mut session = Session::new(AnalysisConfig::default());
        session.add_series(Series::from_values("a", &[1.0; 20]));
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert_eq!(session.analyze_pending(&cancel), 0);
        assert!(session.records()[0].cached().is_none());
    }

    #[test]
    fn cancelling_midway_keeps_finished_and_cached_records() {
        let config = AnalysisConfig::default();
        let mut session = Session::new(config.clone());
        let cached = session.add_series(Series::from_values("cached", &[3.0; 20]));
        let first = session.add_series(Series::from_values("first", &[1.0; 20]));
        let second = session.add_series(Series::from_values("second", &[2.0; 20]));
        let before = session.analysis(cached).cloned().unwrap();

        let cancel = CancellationToken::new();
        let pool = rayon::ThreadPoolBuilder::new().num_threads(1).build().unwrap();
        let analysed = pool.install(|| session.analyze_pending_with_progress(&cancel, |_| cancel.cancel()));

        assert_eq!(analysed, 1);
        assert_eq!(session.record(cached).unwrap().cached(), Some(&before));
        assert_eq!(
            session.record(first).unwrap().cached(),
            Some(&analyze_series(&Series::from_values("first", &[1.0; 20]), &config))
        );
        assert!(session.record(second).unwrap().cached().is_none());
        let rows = session.thresholds();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].final_threshold, None);
    }

    #[test]
    fn config_change_invalidates_cache() {
        let mut session = Session::new(AnalysisConfig::default());
        let id = session.add_series(Series::from_values("a", &[1.0; 20]));
        session.analysis(id);
        session.set_config(AnalysisConfig {
            n_thresholds: 50,
            ..AnalysisConfig::default()
        });
        assert!(session.record(id).unwrap().cached().is_none());
        assert!(session.replace_series(SeriesId(9), Series::from_values("x", &[])).is_err());
    }
}
