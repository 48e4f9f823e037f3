//! The fixed, ordered sensor list that defines output vector columns.

use crate::collector::types::SensorCategory;
use crate::core::index::EventIndex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One registry column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorSpec {
    pub name: String,
    pub category: SensorCategory,
}

impl SensorSpec {
    pub fn new(name: impl Into<String>, category: SensorCategory) -> Self {
        Self {
            name: name.into(),
            category,
        }
    }
}

/// Ordered set of sensors. Column `i` of every feature vector belongs to
/// `sensors()[i]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<SensorSpec>", into = "Vec<SensorSpec>")]
pub struct SensorRegistry {
    sensors: Vec<SensorSpec>,
    positions: HashMap<String, usize>,
}

impl SensorRegistry {
    /// Build a registry. Later duplicates of a sensor name are ignored.
    pub fn new(specs: impl IntoIterator<Item = SensorSpec>) -> Self {
        let mut registry = Self::default();
        for spec in specs {
            registry.push(spec);
        }
        registry
    }

    /// Derive a registry from indexed data: categories in declaration
    /// order, sensor names in first-seen order within each category.
    pub fn from_index(index: &EventIndex) -> Self {
        Self::new(SensorCategory::ALL.iter().flat_map(|&category| {
            index
                .sensor_names_for_category(category)
                .unwrap_or_default()
                .iter()
                .map(move |name| SensorSpec::new(name.clone(), category))
                .collect::<Vec<_>>()
        }))
    }

    /// Append a sensor. Returns `false` if the name is already registered.
    pub fn push(&mut self, spec: SensorSpec) -> bool {
        if self.positions.contains_key(&spec.name) {
            tracing::warn!(sensor = %spec.name, "Duplicate sensor in registry ignored");
            return false;
        }
        self.positions.insert(spec.name.clone(), self.sensors.len());
        self.sensors.push(spec);
        true
    }

    pub fn sensors(&self) -> &[SensorSpec] {
        &self.sensors
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    /// Column position of a sensor.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    pub fn category_of(&self, name: &str) -> Option<SensorCategory> {
        self.position(name).map(|i| self.sensors[i].category)
    }

    /// Sensor names in column order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sensors.iter().map(|s| s.name.as_str())
    }
}

impl From<Vec<SensorSpec>> for SensorRegistry {
    fn from(specs: Vec<SensorSpec>) -> Self {
        Self::new(specs)
    }
}

impl From<SensorRegistry> for Vec<SensorSpec> {
    fn from(registry: SensorRegistry) -> Self {
        registry.sensors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::types::SensorEvent;
    use chrono::{Duration, NaiveDate};

    #[test]
    fn test_registry_order_and_lookup() {
        let registry = SensorRegistry::new([
            SensorSpec::new("kitchen_temp", SensorCategory::Temperature),
            SensorSpec::new("stove", SensorCategory::Toggle),
            SensorSpec::new("kitchen_temp", SensorCategory::Light),
        ]);

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.position("stove"), Some(1));
        assert_eq!(
            registry.category_of("kitchen_temp"),
            Some(SensorCategory::Temperature)
        );
        assert_eq!(registry.position("fridge"), None);
        assert_eq!(
            registry.names().collect::<Vec<_>>(),
            vec!["kitchen_temp", "stove"]
        );
    }

    #[test]
    fn test_registry_serde_as_list() {
        let registry = SensorRegistry::new([SensorSpec::new("bed", SensorCategory::Presence)]);
        let json = serde_json::to_string(&registry).unwrap();
        assert_eq!(json, r#"[{"name":"bed","category":"Presence"}]"#);

        let parsed: SensorRegistry = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, registry);
        assert_eq!(parsed.position("bed"), Some(0));
    }

    #[test]
    fn test_registry_from_index() {
        let t0 = NaiveDate::from_ymd_opt(2018, 3, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let events = vec![
            SensorEvent::new("stove", SensorCategory::Toggle, "kitchen", t0, 1.0),
            SensorEvent::new(
                "kitchen_temp",
                SensorCategory::Temperature,
                "kitchen",
                t0 + Duration::seconds(1),
                21.0,
            ),
            SensorEvent::new(
                "tap",
                SensorCategory::Toggle,
                "kitchen",
                t0 + Duration::seconds(2),
                1.0,
            ),
        ];
        let index = EventIndex::from_events(events);
        let registry = SensorRegistry::from_index(&index);

        assert_eq!(
            registry.names().collect::<Vec<_>>(),
            vec!["kitchen_temp", "stove", "tap"]
        );
    }
}
