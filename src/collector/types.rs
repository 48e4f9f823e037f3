//! Sensor event types shared by ingestion, indexing and quantisation.

use crate::error::Error;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sensor category. Decides the value domain and the reduction rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SensorCategory {
    /// Continuous temperature reading
    Temperature,
    /// Occupancy / motion, 0 or 1
    Presence,
    /// A tracked object property changed
    PropertyChange,
    /// Continuous light intensity
    Light,
    /// Discrete interaction with an object
    Interaction,
    /// On/off state, 0 or 1
    Toggle,
}

impl SensorCategory {
    /// All categories in declaration order.
    pub const ALL: [SensorCategory; 6] = [
        SensorCategory::Temperature,
        SensorCategory::Presence,
        SensorCategory::PropertyChange,
        SensorCategory::Light,
        SensorCategory::Interaction,
        SensorCategory::Toggle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SensorCategory::Temperature => "Temperature",
            SensorCategory::Presence => "Presence",
            SensorCategory::PropertyChange => "PropertyChange",
            SensorCategory::Light => "Light",
            SensorCategory::Interaction => "Interaction",
            SensorCategory::Toggle => "Toggle",
        }
    }

    /// Whether values of this category are booleans stored as 0.0 / 1.0.
    pub fn is_boolean(&self) -> bool {
        matches!(
            self,
            SensorCategory::Presence | SensorCategory::Interaction | SensorCategory::Toggle
        )
    }
}

impl fmt::Display for SensorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SensorCategory {
    type Err = Error;

    /// Parses canonical names plus the storage aliases `Motion` and `Pressure`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Temperature" => Ok(SensorCategory::Temperature),
            "Presence" | "Motion" => Ok(SensorCategory::Presence),
            "PropertyChange" => Ok(SensorCategory::PropertyChange),
            "Light" => Ok(SensorCategory::Light),
            "Interaction" => Ok(SensorCategory::Interaction),
            "Toggle" | "Pressure" => Ok(SensorCategory::Toggle),
            other => Err(Error::UnknownCategory(other.to_string())),
        }
    }
}

/// A single sensor reading.
///
/// Created once when the reading is generated and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorEvent {
    pub sensor_name: String,
    pub category: SensorCategory,
    pub area_name: String,
    pub timestamp: NaiveDateTime,
    pub value: f64,
    /// Activity bookmark this reading was recorded under (may be empty)
    pub bookmark_name: String,
    pub session_id: i64,
}

impl SensorEvent {
    /// Create an untagged reading (no bookmark, session 0).
    pub fn new(
        sensor_name: impl Into<String>,
        category: SensorCategory,
        area_name: impl Into<String>,
        timestamp: NaiveDateTime,
        value: f64,
    ) -> Self {
        Self {
            sensor_name: sensor_name.into(),
            category,
            area_name: area_name.into(),
            timestamp,
            value,
            bookmark_name: String::new(),
            session_id: 0,
        }
    }

    /// Copy of this reading carrying a bookmark tag and session id.
    pub fn tagged(&self, bookmark_name: &str, session_id: i64) -> Self {
        Self {
            bookmark_name: bookmark_name.to_string(),
            session_id,
            ..self.clone()
        }
    }

    /// Activity label derived from this reading's own bookmark tag.
    pub fn activity(&self) -> ActivityLabel {
        ActivityLabel::from_bookmark_name(&self.bookmark_name)
    }
}

/// Closed set of activity labels attached to feature vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityLabel {
    Dressing,
    Cooking,
    WashDishes,
    Sleeping,
    Other,
}

impl ActivityLabel {
    /// Labels in output column order.
    pub const ALL: [ActivityLabel; 5] = [
        ActivityLabel::Dressing,
        ActivityLabel::Cooking,
        ActivityLabel::WashDishes,
        ActivityLabel::Sleeping,
        ActivityLabel::Other,
    ];

    /// Map a bookmark name to a label. Unrecognised or empty names are `Other`.
    pub fn from_bookmark_name(name: &str) -> Self {
        match name {
            "dressing" => ActivityLabel::Dressing,
            "cooking" => ActivityLabel::Cooking,
            "washdishes" => ActivityLabel::WashDishes,
            "sleeping" => ActivityLabel::Sleeping,
            _ => ActivityLabel::Other,
        }
    }

    /// Column header used in the delimited output.
    pub fn column_name(&self) -> &'static str {
        match self {
            ActivityLabel::Dressing => "output_dressing",
            ActivityLabel::Cooking => "output_cooking",
            ActivityLabel::WashDishes => "output_wash_dishes",
            ActivityLabel::Sleeping => "output_sleeping",
            ActivityLabel::Other => "output_other",
        }
    }

    /// Position of this label within [`ActivityLabel::ALL`].
    pub fn index(&self) -> usize {
        match self {
            ActivityLabel::Dressing => 0,
            ActivityLabel::Cooking => 1,
            ActivityLabel::WashDishes => 2,
            ActivityLabel::Sleeping => 3,
            ActivityLabel::Other => 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2018, 3, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_category_aliases() {
        assert_eq!(
            "Motion".parse::<SensorCategory>().unwrap(),
            SensorCategory::Presence
        );
        assert_eq!(
            "Pressure".parse::<SensorCategory>().unwrap(),
            SensorCategory::Toggle
        );
        assert_eq!(
            "Light".parse::<SensorCategory>().unwrap(),
            SensorCategory::Light
        );
        assert!("Humidity".parse::<SensorCategory>().is_err());
    }

    #[test]
    fn test_category_display_round_trips() {
        for category in SensorCategory::ALL {
            assert_eq!(category.to_string().parse::<SensorCategory>().unwrap(), category);
        }
    }

    #[test]
    fn test_label_from_bookmark_name() {
        assert_eq!(ActivityLabel::from_bookmark_name("cooking"), ActivityLabel::Cooking);
        assert_eq!(
            ActivityLabel::from_bookmark_name("washdishes"),
            ActivityLabel::WashDishes
        );
        assert_eq!(ActivityLabel::from_bookmark_name(""), ActivityLabel::Other);
        assert_eq!(ActivityLabel::from_bookmark_name("Cooking"), ActivityLabel::Other);
    }

    #[test]
    fn test_tagged_copy_keeps_reading() {
        let event = SensorEvent::new("stove", SensorCategory::Toggle, "kitchen", ts(), 1.0);
        let tagged = event.tagged("cooking", 7);

        assert_eq!(tagged.bookmark_name, "cooking");
        assert_eq!(tagged.session_id, 7);
        assert_eq!(tagged.timestamp, event.timestamp);
        assert_eq!(event.bookmark_name, "");
    }
}
