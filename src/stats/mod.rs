//! Statistics about indexing and quantisation runs.

pub mod log;

pub use log::{create_shared_log, create_shared_log_with_persistence, RunLog, RunStats, SharedRunLog};
