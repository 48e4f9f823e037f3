//! Per-session event accumulation and bookmark annotation.
//!
//! The store is a best-effort logger: events arriving while no session is
//! active are dropped, and bookmark misuse is logged and reported through a
//! `false` return rather than an error. All methods take `&self` so a single
//! store can be shared between producer threads behind an `Arc`.

use crate::collector::types::SensorEvent;
use crate::error::{Error, Result};
use crate::session::clock::{Clock, SystemClock};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};

/// A named annotation marking when an activity was performed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    pub name: String,
    pub start_time: NaiveDateTime,
    /// Unset while the bookmark is still open
    pub end_time: Option<NaiveDateTime>,
}

impl Bookmark {
    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }

    /// Whether `timestamp` lies inside `[start_time, end_time]`.
    ///
    /// Open bookmarks contain nothing.
    pub fn contains(&self, timestamp: NaiveDateTime) -> bool {
        match self.end_time {
            Some(end) => self.start_time <= timestamp && timestamp <= end,
            None => false,
        }
    }
}

/// A completed recording: events sorted by timestamp plus bookmarks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: i64,
    pub events: Vec<SensorEvent>,
    pub bookmarks: Vec<Bookmark>,
}

impl Session {
    /// Build a session, sorting events ascending by timestamp.
    ///
    /// The sort is stable so readings sharing a timestamp keep arrival order.
    pub fn new(id: i64, mut events: Vec<SensorEvent>, bookmarks: Vec<Bookmark>) -> Self {
        events.sort_by_key(|e| e.timestamp);
        Self {
            id,
            events,
            bookmarks,
        }
    }

    pub fn bookmark(&self, name: &str) -> Option<&Bookmark> {
        self.bookmarks.iter().find(|b| b.name == name)
    }

    /// Events falling inside a bookmark's time range, in session order.
    pub fn events_within(&self, bookmark: &Bookmark) -> Vec<&SensorEvent> {
        self.events
            .iter()
            .filter(|e| bookmark.contains(e.timestamp))
            .collect()
    }

    /// Events re-tagged by time-range membership.
    ///
    /// Every closed bookmark contributes the readings inside its range,
    /// tagged with the bookmark name and this session's id. A reading inside
    /// two bookmarks is emitted once for each.
    pub fn tagged_events(&self) -> Vec<SensorEvent> {
        let mut tagged = Vec::new();
        for bookmark in &self.bookmarks {
            if bookmark.is_open() {
                tracing::warn!(
                    session_id = self.id,
                    bookmark = %bookmark.name,
                    "Skipping bookmark that was never closed"
                );
                continue;
            }
            tagged.extend(
                self.events_within(bookmark)
                    .into_iter()
                    .map(|e| e.tagged(&bookmark.name, self.id)),
            );
        }
        tagged
    }
}

/// Recording state of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreState {
    Idle,
    Active,
}

#[derive(Debug)]
struct StoreInner {
    state: StoreState,
    session_id: i64,
    next_session_id: i64,
    events: Vec<SensorEvent>,
    bookmarks: Vec<Bookmark>,
}

/// Accumulates events and bookmarks for the current recording session.
pub struct EventStore {
    inner: Mutex<StoreInner>,
    clock: Arc<dyn Clock>,
}

impl EventStore {
    /// Create an idle store using wall-clock time for bookmarks.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an idle store using the given time source for bookmarks.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Mutex::new(StoreInner {
                state: StoreState::Idle,
                session_id: 0,
                next_session_id: 0,
                events: Vec::new(),
                bookmarks: Vec::new(),
            }),
            clock,
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Start recording `session_id`.
    ///
    /// Always discards buffered events and bookmarks, including those of a
    /// session that is still active.
    pub fn start_session(&self, session_id: i64) {
        let mut inner = self.lock();
        if inner.state == StoreState::Active && !inner.events.is_empty() {
            tracing::warn!(
                session_id = inner.session_id,
                discarded = inner.events.len(),
                "Restarting an active session; buffered events discarded"
            );
        }
        inner.events.clear();
        inner.bookmarks.clear();
        inner.session_id = session_id;
        inner.next_session_id = session_id.saturating_add(1);
        inner.state = StoreState::Active;
        tracing::debug!(session_id, "Session started");
    }

    /// Start a session using the store's own id sequence. Returns the id.
    pub fn start_next_session(&self) -> i64 {
        let id = self.lock().next_session_id;
        self.start_session(id);
        id
    }

    /// Stop recording. Buffered data stays available until the next start.
    pub fn end_session(&self) {
        let mut inner = self.lock();
        inner.state = StoreState::Idle;
        tracing::debug!(
            session_id = inner.session_id,
            events = inner.events.len(),
            "Session ended"
        );
    }

    pub fn state(&self) -> StoreState {
        self.lock().state
    }

    pub fn is_active(&self) -> bool {
        self.state() == StoreState::Active
    }

    pub fn session_id(&self) -> i64 {
        self.lock().session_id
    }

    pub fn event_count(&self) -> usize {
        self.lock().events.len()
    }

    /// Append an event. Ignored (returns `false`) while idle.
    pub fn add_event(&self, event: SensorEvent) -> bool {
        let mut inner = self.lock();
        if inner.state != StoreState::Active {
            return false;
        }
        inner.events.push(event);
        true
    }

    /// Open a bookmark at the current time.
    ///
    /// Fails while idle or when a bookmark with this name is already open.
    pub fn add_bookmark(&self, name: &str) -> bool {
        let now = self.clock.now();
        let mut inner = self.lock();
        if inner.state != StoreState::Active {
            tracing::warn!(bookmark = name, "Cannot open bookmark while idle");
            return false;
        }
        if inner.bookmarks.iter().any(|b| b.name == name && b.is_open()) {
            tracing::warn!(bookmark = name, "Bookmark is already open");
            return false;
        }
        inner.bookmarks.push(Bookmark {
            name: name.to_string(),
            start_time: now,
            end_time: None,
        });
        true
    }

    /// Close the open bookmark called `name` at the current time.
    pub fn close_bookmark(&self, name: &str) -> bool {
        let now = self.clock.now();
        let mut inner = self.lock();
        if inner.state != StoreState::Active {
            tracing::warn!(bookmark = name, "Cannot close bookmark while idle");
            return false;
        }
        match inner
            .bookmarks
            .iter_mut()
            .find(|b| b.name == name && b.is_open())
        {
            Some(bookmark) => {
                // The clock may be rewound in simulations.
                bookmark.end_time = Some(now.max(bookmark.start_time));
                true
            }
            None => {
                tracing::warn!(bookmark = name, "No open bookmark with this name");
                false
            }
        }
    }

    /// Copy out the recorded session.
    ///
    /// Refused while the session is still active: indexing must not start
    /// before ingestion has finished.
    pub fn snapshot(&self) -> Result<Session> {
        let inner = self.lock();
        if inner.state == StoreState::Active {
            return Err(Error::SessionActive(inner.session_id));
        }
        Ok(Session::new(
            inner.session_id,
            inner.events.clone(),
            inner.bookmarks.clone(),
        ))
    }
}

impl Default for EventStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Thread-safe shared event store.
pub type SharedEventStore = Arc<EventStore>;
