//! ADL Quantiser - time-windowed feature extraction for smart-home sensor logs.
//!
//! This library turns timestamped sensor readings recorded during
//! activity-of-daily-living sessions into fixed-width feature vectors with
//! multi-hot activity labels, ready for training an activity classifier.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       ADL Quantiser                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │  Collector  │──▶│ EventStore  │──▶│    Index    │       │
//! │  │  (channel)  │   │ (sessions)  │   │  (lookups)  │       │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! │                                              │              │
//! │                                              ▼              │
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │   Output    │◀──│  Reducer +  │◀──│  Windowing  │       │
//! │  │   (CSV)     │   │  Assembler  │   │ (fixed grid)│       │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Ingestion and quantisation are separate phases: a session must be ended
//! before its events can be snapshotted and indexed.
//!
//! # Example
//!
//! ```no_run
//! use adl_quantiser::{EventStore, Quantiser, ReducerTable, SensorRegistry, WindowDuration};
//!
//! let store = EventStore::new();
//! store.start_session(1);
//! // ... producers call store.add_event(..), store.add_bookmark(..) ...
//! store.end_session();
//!
//! let session = store.snapshot().expect("session ended");
//! let quantiser = Quantiser::new(
//!     SensorRegistry::default(),
//!     ReducerTable::default(),
//!     WindowDuration::from_secs(60),
//! );
//! let index = quantiser.index(session.tagged_events());
//! let results = quantiser.quantise_all(&index);
//! ```

pub mod collector;
pub mod config;
pub mod core;
pub mod error;
pub mod io;
pub mod session;
pub mod stats;

// Re-export key types at crate root for convenience
pub use collector::{
    ActivityLabel, CollectorError, EventCollector, EventSender, SensorCategory, SensorEvent,
};
pub use config::{Config, ConfigError, OutputConfig};
pub use core::{
    assemble_vectors, sample_windows, ActivityLabels, EventIndex, FeatureVector, QuantisedSession,
    Quantiser, ReducerTable, ReductionRule, SensorRegistry, SensorSpec, Window, WindowDuration,
};
pub use error::{Error, Result};
pub use io::{VectorTable, WriteOptions};
pub use session::{Bookmark, Clock, EventStore, ManualClock, Session, SharedEventStore, SystemClock};
pub use stats::{RunLog, RunStats, SharedRunLog};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
