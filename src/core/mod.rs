//! Core quantisation pipeline.
//!
//! This module contains:
//! - The sensor registry that fixes output column order
//! - The event index over completed sessions
//! - Window sampling on a fixed time grid
//! - Per-category reduction and feature vector assembly

pub mod index;
pub mod quantise;
pub mod reducer;
pub mod registry;
pub mod vector;
pub mod windowing;

// Re-export commonly used types
pub use index::{EventIndex, EventRefs};
pub use quantise::{QuantisedSession, Quantiser};
pub use reducer::{ReducerTable, ReductionRule};
pub use registry::{SensorRegistry, SensorSpec};
pub use vector::{assemble_vectors, ActivityLabels, Assembled, FeatureVector};
pub use windowing::{sample_windows, Window, WindowDuration};
