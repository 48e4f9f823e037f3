//! Feature vector assembly.
//!
//! Every emitted window becomes one dense vector ordered by the sensor
//! registry, plus a multi-hot activity annotation.
//!
//! Labels come from each reading's own bookmark tag, not from bookmark time
//! ranges. A window whose readings carry different tags therefore gets more
//! than one label set; that is kept as-is and left for downstream cleaning.

use crate::collector::types::{ActivityLabel, SensorEvent};
use crate::core::reducer::ReducerTable;
use crate::core::registry::SensorRegistry;
use crate::core::windowing::Window;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Multi-hot activity flags in [`ActivityLabel::ALL`] order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityLabels([u8; 5]);

impl ActivityLabels {
    pub fn from_flags(flags: [u8; 5]) -> Self {
        Self(flags.map(|f| u8::from(f != 0)))
    }

    pub fn set(&mut self, label: ActivityLabel) {
        self.0[label.index()] = 1;
    }

    pub fn is_set(&self, label: ActivityLabel) -> bool {
        self.0[label.index()] == 1
    }

    /// Number of labels set. More than one indicates mixed bookmark tags.
    pub fn count(&self) -> usize {
        self.0.iter().filter(|&&f| f == 1).count()
    }

    pub fn flags(&self) -> [u8; 5] {
        self.0
    }

    /// Labels currently set, in column order.
    pub fn labels(&self) -> Vec<ActivityLabel> {
        ActivityLabel::ALL
            .iter()
            .copied()
            .filter(|l| self.is_set(*l))
            .collect()
    }
}

/// One output row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// One value per registry sensor, in registry order
    pub values: Vec<f64>,
    pub labels: ActivityLabels,
}

impl FeatureVector {
    /// Value of the named sensor column.
    pub fn value(&self, registry: &SensorRegistry, sensor_name: &str) -> Option<f64> {
        registry
            .position(sensor_name)
            .and_then(|i| self.values.get(i).copied())
    }
}

/// Result of assembling one sequence of windows.
#[derive(Debug, Clone, Default)]
pub struct Assembled {
    pub vectors: Vec<FeatureVector>,
    /// Sensors that produced readings but have no registry column
    pub unknown_sensors: BTreeSet<String>,
}

/// Reduce each window to a feature vector.
///
/// Windows must be in chronological order: each sensor's value in window
/// `k` may depend on its value in window `k - 1`. The first window sees 0.0
/// as the previous value of every sensor.
pub fn assemble_vectors(
    windows: &[Window<'_>],
    registry: &SensorRegistry,
    reducers: &ReducerTable,
) -> Assembled {
    let mut assembled = Assembled::default();
    let mut previous = vec![0.0; registry.len()];

    for window in windows {
        let mut per_sensor: Vec<Vec<&SensorEvent>> = vec![Vec::new(); registry.len()];
        let mut labels = ActivityLabels::default();

        for &event in &window.events {
            labels.set(event.activity());
            match registry.position(&event.sensor_name) {
                Some(i) => per_sensor[i].push(event),
                None => {
                    assembled.unknown_sensors.insert(event.sensor_name.clone());
                }
            }
        }

        let values: Vec<f64> = registry
            .sensors()
            .iter()
            .zip(per_sensor.iter().zip(previous.iter()))
            .map(|(spec, (events, &prev))| reducers.reduce(spec.category, events, prev))
            .collect();

        previous.clone_from(&values);
        assembled.vectors.push(FeatureVector { values, labels });
    }

    assembled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::types::SensorCategory;
    use crate::core::registry::SensorSpec;
    use crate::core::windowing::{sample_windows, WindowDuration};
    use chrono::{Duration, NaiveDate, NaiveDateTime};
    use pretty_assertions::assert_eq;

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2018, 3, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    fn event(name: &str, category: SensorCategory, offset: i64, value: f64, tag: &str) -> SensorEvent {
        SensorEvent::new(name, category, "kitchen", t0() + Duration::seconds(offset), value)
            .tagged(tag, 1)
    }

    fn registry() -> SensorRegistry {
        SensorRegistry::new([
            SensorSpec::new("kitchen_temp", SensorCategory::Temperature),
            SensorSpec::new("kitchen_motion", SensorCategory::Presence),
            SensorSpec::new("kettle", SensorCategory::Interaction),
        ])
    }

    fn assemble(events: &[SensorEvent], secs: u32) -> Assembled {
        let windows = sample_windows(events, t0(), WindowDuration::from_secs(secs));
        assemble_vectors(&windows, &registry(), &ReducerTable::default())
    }

    #[test]
    fn test_labels_flags() {
        let mut labels = ActivityLabels::default();
        labels.set(ActivityLabel::Cooking);
        labels.set(ActivityLabel::Cooking);
        labels.set(ActivityLabel::Other);

        assert_eq!(labels.flags(), [0, 1, 0, 0, 1]);
        assert_eq!(labels.count(), 2);
        assert_eq!(labels.labels(), vec![ActivityLabel::Cooking, ActivityLabel::Other]);
        assert_eq!(ActivityLabels::from_flags([0, 3, 0, 0, 0]).flags(), [0, 1, 0, 0, 0]);
    }

    #[test]
    fn test_presence_carries_forward() {
        let events = vec![
            event("kitchen_motion", SensorCategory::Presence, 0, 1.0, "cooking"),
            event("kitchen_temp", SensorCategory::Temperature, 15, 22.0, "cooking"),
            event("kitchen_temp", SensorCategory::Temperature, 25, 23.0, "cooking"),
            event("kitchen_motion", SensorCategory::Presence, 35, 0.0, "cooking"),
        ];
        let vectors = assemble(&events, 10).vectors;

        let motion: Vec<f64> = vectors.iter().map(|v| v.values[1]).collect();
        assert_eq!(motion, vec![1.0, 1.0, 1.0, 0.0]);

        let temp: Vec<f64> = vectors.iter().map(|v| v.values[0]).collect();
        assert_eq!(temp, vec![0.0, 22.0, 23.0, 0.0]);
    }

    #[test]
    fn test_absent_sensor_is_zero() {
        let events = vec![
            event("kitchen_motion", SensorCategory::Presence, 0, 1.0, "cooking"),
            event("kitchen_motion", SensorCategory::Presence, 40, 1.0, "cooking"),
        ];
        let vectors = assemble(&events, 10).vectors;
        assert_eq!(vectors.len(), 2);
        assert!(vectors.iter().all(|v| v.values[2] == 0.0 && v.values[0] == 0.0));
    }

    #[test]
    fn test_interaction_marks_activity() {
        let events = vec![
            event("kettle", SensorCategory::Interaction, 0, 0.0, "cooking"),
            event("kitchen_motion", SensorCategory::Presence, 12, 1.0, "cooking"),
        ];
        let vectors = assemble(&events, 10).vectors;
        assert_eq!(vectors[0].values[2], 1.0);
        assert_eq!(vectors[1].values[2], 0.0);
    }

    #[test]
    fn test_mixed_tags_set_several_labels() {
        let events = vec![
            event("kitchen_motion", SensorCategory::Presence, 0, 1.0, "cooking"),
            event("kitchen_motion", SensorCategory::Presence, 2, 1.0, "dressing"),
            event("kitchen_motion", SensorCategory::Presence, 4, 1.0, ""),
        ];
        let vectors = assemble(&events, 10).vectors;
        assert_eq!(vectors.len(), 1);
        assert_eq!(vectors[0].labels.flags(), [1, 1, 0, 0, 1]);
    }

    #[test]
    fn test_unknown_sensors_reported() {
        let events = vec![
            event("fridge", SensorCategory::Toggle, 0, 1.0, "cooking"),
            event("kitchen_temp", SensorCategory::Temperature, 1, 20.0, "cooking"),
        ];
        let assembled = assemble(&events, 10);

        assert_eq!(assembled.vectors[0].values, vec![20.0, 0.0, 0.0]);
        assert!(assembled.vectors[0].labels.is_set(ActivityLabel::Cooking));
        assert_eq!(
            assembled.unknown_sensors.into_iter().collect::<Vec<_>>(),
            vec!["fridge".to_string()]
        );
    }

    #[test]
    fn test_value_lookup_by_name() {
        let events = vec![event("kitchen_temp", SensorCategory::Temperature, 0, 19.5, "")];
        let vectors = assemble(&events, 10).vectors;
        assert_eq!(vectors[0].value(&registry(), "kitchen_temp"), Some(19.5));
        assert_eq!(vectors[0].value(&registry(), "fridge"), None);
    }
}
