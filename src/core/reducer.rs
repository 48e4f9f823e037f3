//! Per-category reduction of a window's readings to one scalar.
//!
//! Each rule is a pure function of the readings of one sensor inside one
//! window and the value that sensor had in the previous window.

use crate::collector::types::{SensorCategory, SensorEvent};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How one sensor's readings inside a window collapse to a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReductionRule {
    /// Largest value; 0.0 when the window has no readings
    Max,
    /// Smallest value; 0.0 when the window has no readings
    Min,
    /// Arithmetic mean; 0.0 when the window has no readings
    Mean,
    /// First value, else the previous window's value
    First,
    /// Last value, else the previous window's value
    Last,
    /// 1.0 if the window holds at least one reading
    AnyEvent,
    /// 1.0 if any reading has value 1.0
    OnActivation,
    /// Number of readings with value 1.0
    ActivationCount,
    /// Number of readings
    EventCount,
    /// Always 0.0
    Zero,
}

impl ReductionRule {
    /// Whether the rule carries the previous window's value through
    /// windows with no readings.
    pub fn carries_forward(&self) -> bool {
        matches!(self, ReductionRule::First | ReductionRule::Last)
    }

    /// Reduce `events` (one sensor, one window, ascending order).
    pub fn reduce(&self, events: &[&SensorEvent], previous: f64) -> f64 {
        match self {
            ReductionRule::Max => events
                .iter()
                .map(|e| e.value)
                .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))
                .unwrap_or(0.0),
            ReductionRule::Min => events
                .iter()
                .map(|e| e.value)
                .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.min(v))))
                .unwrap_or(0.0),
            ReductionRule::Mean => {
                if events.is_empty() {
                    0.0
                } else {
                    events.iter().map(|e| e.value).sum::<f64>() / events.len() as f64
                }
            }
            ReductionRule::First => events.first().map_or(previous, |e| e.value),
            ReductionRule::Last => events.last().map_or(previous, |e| e.value),
            ReductionRule::AnyEvent => {
                if events.is_empty() {
                    0.0
                } else {
                    1.0
                }
            }
            ReductionRule::OnActivation => {
                if events.iter().any(|e| e.value == 1.0) {
                    1.0
                } else {
                    0.0
                }
            }
            ReductionRule::ActivationCount => {
                events.iter().filter(|e| e.value == 1.0).count() as f64
            }
            ReductionRule::EventCount => events.len() as f64,
            ReductionRule::Zero => 0.0,
        }
    }
}

/// Category-keyed rule table.
///
/// Defaults: temperature and light take the window maximum, presence and
/// toggle take the first reading with carry-forward, interaction records
/// whether anything happened, property changes are not summarised. A
/// deserialised table lists only the categories it overrides; the rest keep
/// their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "HashMap<SensorCategory, ReductionRule>",
    into = "HashMap<SensorCategory, ReductionRule>"
)]
pub struct ReducerTable {
    rules: HashMap<SensorCategory, ReductionRule>,
}

impl Default for ReducerTable {
    fn default() -> Self {
        let rules = HashMap::from([
            (SensorCategory::Temperature, ReductionRule::Max),
            (SensorCategory::Light, ReductionRule::Max),
            (SensorCategory::Presence, ReductionRule::First),
            (SensorCategory::Toggle, ReductionRule::First),
            (SensorCategory::Interaction, ReductionRule::AnyEvent),
            (SensorCategory::PropertyChange, ReductionRule::Zero),
        ]);
        Self { rules }
    }
}

impl From<HashMap<SensorCategory, ReductionRule>> for ReducerTable {
    fn from(overrides: HashMap<SensorCategory, ReductionRule>) -> Self {
        let mut table = Self::default();
        table.rules.extend(overrides);
        table
    }
}

impl From<ReducerTable> for HashMap<SensorCategory, ReductionRule> {
    fn from(table: ReducerTable) -> Self {
        table.rules
    }
}

impl ReducerTable {
    /// Rule for `category`. Categories missing from the table reduce to 0.0.
    pub fn rule(&self, category: SensorCategory) -> ReductionRule {
        self.rules
            .get(&category)
            .copied()
            .unwrap_or(ReductionRule::Zero)
    }

    /// Replace the rule for one category.
    pub fn with_rule(mut self, category: SensorCategory, rule: ReductionRule) -> Self {
        self.rules.insert(category, rule);
        self
    }

    pub fn set_rule(&mut self, category: SensorCategory, rule: ReductionRule) {
        self.rules.insert(category, rule);
    }

    pub fn reduce(&self, category: SensorCategory, events: &[&SensorEvent], previous: f64) -> f64 {
        self.rule(category).reduce(events, previous)
    }
}
