//! Sensor event types and the ingestion channel.
//!
//! Sensor sources push readings through an [`EventSender`]; the collector
//! drains them into the active recording session.

pub mod channel;
pub mod types;

// Re-export commonly used types
pub use channel::{CollectorError, EventCollector, EventSender, DEFAULT_CAPACITY};
pub use types::{ActivityLabel, SensorCategory, SensorEvent};
