//! Run statistics for quantisation passes.
//!
//! Counters are atomic so one log can be shared by the ingestion thread,
//! the quantiser and the output writer. Totals can be persisted as JSON and
//! accumulate across runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters for one process lifetime (plus any loaded totals).
#[derive(Debug)]
pub struct RunLog {
    /// Events handed to the indexer
    events_indexed: AtomicU64,
    /// Windows emitted by the sampler
    windows_emitted: AtomicU64,
    /// Feature vectors written to an output file
    vectors_written: AtomicU64,
    /// Bookmark/session pairs that produced vectors
    sessions_quantised: AtomicU64,
    /// Bookmark/session pairs that produced nothing
    sessions_skipped: AtomicU64,
    /// Distinct sensors seen in data but missing from the registry
    unknown_sensors: AtomicU64,
    run_start: DateTime<Utc>,
    persist_path: Option<PathBuf>,
}

impl RunLog {
    pub fn new() -> Self {
        Self {
            events_indexed: AtomicU64::new(0),
            windows_emitted: AtomicU64::new(0),
            vectors_written: AtomicU64::new(0),
            sessions_quantised: AtomicU64::new(0),
            sessions_skipped: AtomicU64::new(0),
            unknown_sensors: AtomicU64::new(0),
            run_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create a log backed by a JSON file, loading earlier totals if present.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut log = Self::new();
        log.persist_path = Some(path);

        if let Err(e) = log.load() {
            tracing::warn!("Could not load previous run statistics: {e}");
        }

        log
    }

    pub fn record_events_indexed(&self, count: u64) {
        self.events_indexed.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_windows_emitted(&self, count: u64) {
        self.windows_emitted.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_vectors_written(&self, count: u64) {
        self.vectors_written.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_session_quantised(&self) {
        self.sessions_quantised.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_session_skipped(&self) {
        self.sessions_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unknown_sensor(&self) {
        self.unknown_sensors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stats(&self) -> RunStats {
        RunStats {
            events_indexed: self.events_indexed.load(Ordering::Relaxed),
            windows_emitted: self.windows_emitted.load(Ordering::Relaxed),
            vectors_written: self.vectors_written.load(Ordering::Relaxed),
            sessions_quantised: self.sessions_quantised.load(Ordering::Relaxed),
            sessions_skipped: self.sessions_skipped.load(Ordering::Relaxed),
            unknown_sensors: self.unknown_sensors.load(Ordering::Relaxed),
            run_start: self.run_start,
            run_duration_secs: (Utc::now() - self.run_start).num_seconds().max(0) as u64,
        }
    }

    /// Summary for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Quantisation Statistics:\n\
             - Events indexed: {}\n\
             - Windows emitted: {}\n\
             - Feature vectors written: {}\n\
             - Sessions quantised: {}\n\
             - Sessions skipped: {}\n\
             - Unregistered sensors: {}\n\
             - Run duration: {} seconds",
            stats.events_indexed,
            stats.windows_emitted,
            stats.vectors_written,
            stats.sessions_quantised,
            stats.sessions_skipped,
            stats.unknown_sensors,
            stats.run_duration_secs
        )
    }

    /// Save totals to disk (no-op without a persistence path).
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.stats();
            let persisted = PersistedStats {
                events_indexed: stats.events_indexed,
                windows_emitted: stats.windows_emitted,
                vectors_written: stats.vectors_written,
                sessions_quantised: stats.sessions_quantised,
                sessions_skipped: stats.sessions_skipped,
                unknown_sensors: stats.unknown_sensors,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;
            std::fs::write(path, json)?;
        }
        Ok(())
    }

    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedStats =
                    serde_json::from_str(&content).map_err(std::io::Error::other)?;

                self.events_indexed
                    .store(persisted.events_indexed, Ordering::Relaxed);
                self.windows_emitted
                    .store(persisted.windows_emitted, Ordering::Relaxed);
                self.vectors_written
                    .store(persisted.vectors_written, Ordering::Relaxed);
                self.sessions_quantised
                    .store(persisted.sessions_quantised, Ordering::Relaxed);
                self.sessions_skipped
                    .store(persisted.sessions_skipped, Ordering::Relaxed);
                self.unknown_sensors
                    .store(persisted.unknown_sensors, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    pub fn reset(&self) {
        self.events_indexed.store(0, Ordering::Relaxed);
        self.windows_emitted.store(0, Ordering::Relaxed);
        self.vectors_written.store(0, Ordering::Relaxed);
        self.sessions_quantised.store(0, Ordering::Relaxed);
        self.sessions_skipped.store(0, Ordering::Relaxed);
        self.unknown_sensors.store(0, Ordering::Relaxed);
    }
}

impl Default for RunLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of run statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStats {
    pub events_indexed: u64,
    pub windows_emitted: u64,
    pub vectors_written: u64,
    pub sessions_quantised: u64,
    pub sessions_skipped: u64,
    pub unknown_sensors: u64,
    pub run_start: DateTime<Utc>,
    pub run_duration_secs: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedStats {
    events_indexed: u64,
    windows_emitted: u64,
    vectors_written: u64,
    sessions_quantised: u64,
    sessions_skipped: u64,
    unknown_sensors: u64,
    last_updated: DateTime<Utc>,
}

/// Thread-safe shared run log.
pub type SharedRunLog = Arc<RunLog>;

pub fn create_shared_log() -> SharedRunLog {
    Arc::new(RunLog::new())
}

pub fn create_shared_log_with_persistence(path: PathBuf) -> SharedRunLog {
    Arc::new(RunLog::with_persistence(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_log_counting() {
        let log = RunLog::new();

        log.record_windows_emitted(3);
        log.record_windows_emitted(2);
        log.record_session_quantised();
        log.record_session_skipped();

        let stats = log.stats();
        assert_eq!(stats.windows_emitted, 5);
        assert_eq!(stats.sessions_quantised, 1);
        assert_eq!(stats.sessions_skipped, 1);
    }

    #[test]
    fn test_run_log_reset() {
        let log = RunLog::new();
        log.record_events_indexed(100);
        log.record_vectors_written(10);
        log.reset();

        let stats = log.stats();
        assert_eq!(stats.events_indexed, 0);
        assert_eq!(stats.vectors_written, 0);
    }

    #[test]
    fn test_persistence_accumulates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats").join("run.json");

        let log = RunLog::with_persistence(path.clone());
        log.record_vectors_written(7);
        log.save().unwrap();

        let reloaded = RunLog::with_persistence(path);
        reloaded.record_vectors_written(1);
        assert_eq!(reloaded.stats().vectors_written, 8);
    }

    #[test]
    fn test_summary_format() {
        let summary = RunLog::new().summary();
        assert!(summary.contains("Windows emitted"));
        assert!(summary.contains("Feature vectors written"));
        assert!(summary.contains("Unregistered sensors"));
    }
}
