//! Error types for the quantiser.

use thiserror::Error;

/// Errors surfaced to callers.
///
/// Lookup misses, degenerate windows and out-of-state store calls are not
/// errors; they are logged and produce empty results. Only malformed
/// persisted data and I/O failures end up here.
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed record at row {row}: {reason}")]
    MalformedRecord { row: usize, reason: String },

    #[error("Unknown sensor category: {0}")]
    UnknownCategory(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Session {0} is still active; end it before indexing")]
    SessionActive(i64),

    #[cfg(feature = "sqlite")]
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
