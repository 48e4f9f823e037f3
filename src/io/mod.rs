//! File and database adapters around the core pipeline.
//!
//! - `records`: event rows in and out of CSV, plus bookmark files
//! - `vectors`: feature-vector output and re-parsing by column name
//! - `sqlite`: event table in SQLite (feature `sqlite`)

pub mod records;
pub mod vectors;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use records::{
    read_bookmarks_csv, read_events, read_events_csv, write_events, write_events_csv, SensorRecord,
    EVENT_COLUMNS,
};
pub use vectors::{header, write_vectors, write_vectors_to_path, VectorTable, WriteOptions};
