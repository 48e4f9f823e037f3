//! End-to-end quantisation of indexed sessions into feature vectors.
//!
//! A pass walks bookmark/session pairs one at a time. Each pair's events
//! are sorted, split into windows anchored at the pair's earliest reading
//! and reduced window by window in chronological order.

use crate::collector::types::SensorEvent;
use crate::core::index::EventIndex;
use crate::core::reducer::ReducerTable;
use crate::core::registry::SensorRegistry;
use crate::core::vector::{assemble_vectors, FeatureVector};
use crate::core::windowing::{sample_windows, WindowDuration};
use crate::session::store::Session;
use crate::stats::{create_shared_log, SharedRunLog};
use std::collections::HashSet;
use std::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Vectors produced for one bookmark/session pair.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantisedSession {
    pub bookmark: String,
    pub session_id: i64,
    pub vectors: Vec<FeatureVector>,
}

/// Holds everything a quantisation pass needs. Construct one per run.
#[derive(Debug)]
pub struct Quantiser {
    registry: SensorRegistry,
    reducers: ReducerTable,
    window: WindowDuration,
    stats: SharedRunLog,
    /// Unregistered sensors already reported during this run
    warned: Mutex<HashSet<String>>,
}

impl Quantiser {
    pub fn new(registry: SensorRegistry, reducers: ReducerTable, window: WindowDuration) -> Self {
        Self {
            registry,
            reducers,
            window,
            stats: create_shared_log(),
            warned: Mutex::new(HashSet::new()),
        }
    }

    /// Report counters into an existing (possibly persisted) log.
    pub fn with_stats(mut self, stats: SharedRunLog) -> Self {
        self.stats = stats;
        self
    }

    pub fn registry(&self) -> &SensorRegistry {
        &self.registry
    }

    pub fn reducers(&self) -> &ReducerTable {
        &self.reducers
    }

    pub fn window(&self) -> WindowDuration {
        self.window
    }

    pub fn stats(&self) -> &SharedRunLog {
        &self.stats
    }

    /// Build an index over `events` and count them in the run statistics.
    pub fn index(&self, events: Vec<SensorEvent>) -> EventIndex {
        let index = EventIndex::from_events(events);
        self.stats.record_events_indexed(index.event_count() as u64);
        index
    }

    /// Quantise one bookmark/session pair.
    ///
    /// An unknown pair or an unbuilt index yields no vectors and a warning.
    pub fn quantise_selected(
        &self,
        index: &EventIndex,
        bookmark: &str,
        session_id: i64,
    ) -> Vec<FeatureVector> {
        if !index.is_indexed() {
            warn!("Quantise requested before the index was built");
            return Vec::new();
        }

        let Some(events) = index.events_for_bookmark_and_session(bookmark, session_id) else {
            warn!(bookmark, session_id, "No events recorded for bookmark and session");
            self.stats.record_session_skipped();
            return Vec::new();
        };

        let vectors = self.quantise_events(events.iter());
        if vectors.is_empty() {
            self.stats.record_session_skipped();
        } else {
            self.stats.record_session_quantised();
            debug!(bookmark, session_id, vectors = vectors.len(), "Session quantised");
        }
        vectors
    }

    /// Quantise every bookmark/session pair in the index.
    ///
    /// Pairs come out with bookmark names and session ids in first-seen
    /// order. Pairs that produce nothing are left out.
    pub fn quantise_all(&self, index: &EventIndex) -> Vec<QuantisedSession> {
        let mut results = Vec::new();

        for bookmark in index.bookmark_names() {
            let sessions = index.sessions_for_bookmark(bookmark).unwrap_or_default();
            for &session_id in sessions {
                let vectors = self.quantise_selected(index, bookmark, session_id);
                if !vectors.is_empty() {
                    results.push(QuantisedSession {
                        bookmark: bookmark.clone(),
                        session_id,
                        vectors,
                    });
                }
            }
        }

        info!(
            pairs = results.len(),
            vectors = results.iter().map(|r| r.vectors.len()).sum::<usize>(),
            "Quantisation pass complete"
        );
        results
    }

    /// Index a finished session's tagged events and quantise all of it.
    ///
    /// Readings are tagged from the session's closed bookmarks and its id;
    /// readings outside every bookmark are left out.
    pub fn quantise_session(&self, session: &Session) -> Vec<QuantisedSession> {
        let index = self.index(session.tagged_events());
        self.quantise_all(&index)
    }

    /// Window and reduce an arbitrary set of events as one sequence.
    ///
    /// Events are sorted by timestamp (stable, so ties keep their input
    /// order) and anchored at the earliest one.
    pub fn quantise_events<'a>(
        &self,
        events: impl IntoIterator<Item = &'a SensorEvent>,
    ) -> Vec<FeatureVector> {
        if self.window.is_zero() {
            error!("Window duration is zero; no windows can be produced");
            return Vec::new();
        }

        let mut events: Vec<&SensorEvent> = events.into_iter().collect();
        if events.is_empty() {
            return Vec::new();
        }
        events.sort_by_key(|e| e.timestamp);

        let anchor = events[0].timestamp;
        let windows = sample_windows(events.iter().copied(), anchor, self.window);
        if windows.is_empty() {
            error!(events = events.len(), %anchor, "Zero windows emitted for a non-empty event set");
            return Vec::new();
        }
        self.stats.record_windows_emitted(windows.len() as u64);

        let assembled = assemble_vectors(&windows, &self.registry, &self.reducers);
        self.report_unknown(assembled.unknown_sensors);
        assembled.vectors
    }

    fn report_unknown(&self, names: impl IntoIterator<Item = String>) {
        let mut warned = match self.warned.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        for name in names {
            if !warned.contains(&name) {
                warn!(sensor = %name, "Sensor not in registry; its readings are ignored");
                self.stats.record_unknown_sensor();
                warned.insert(name);
            }
        }
    }
}
