//! Time sources for bookmark annotation.
//!
//! Recording sessions may run against wall-clock time or a simulated clock
//! that the caller advances explicitly.

use chrono::{Duration, Local, NaiveDateTime};
use std::sync::{Arc, Mutex};

/// Source of the "current time" used when bookmarks open and close.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Local wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    current: Arc<Mutex<NaiveDateTime>>,
}

impl ManualClock {
    pub fn new(start: NaiveDateTime) -> Self {
        Self {
            current: Arc::new(Mutex::new(start)),
        }
    }

    pub fn set(&self, time: NaiveDateTime) {
        let mut guard = self.current.lock().unwrap_or_else(|p| p.into_inner());
        *guard = time;
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self.current.lock().unwrap_or_else(|p| p.into_inner());
        *guard += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.current.lock().unwrap_or_else(|p| p.into_inner())
    }
}
