//! Lookup structures over a completed set of sensor events.
//!
//! The index owns the events it was built from and answers queries with
//! borrowed views ([`EventRefs`]) so lookups stay O(1) and nothing is
//! copied. Building is not incremental: every call to [`EventIndex::build`]
//! clears all maps and recomputes them from the events passed in. Callers
//! that want several sessions in one index must pass all of their events to
//! a single `build` call.

use crate::collector::types::{SensorCategory, SensorEvent};
use crate::session::store::Session;
use std::collections::{HashMap, HashSet};

/// Borrowed, ordered view over a subset of the indexed events.
#[derive(Debug, Clone, Copy)]
pub struct EventRefs<'a> {
    events: &'a [SensorEvent],
    positions: &'a [usize],
}

impl<'a> EventRefs<'a> {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&'a SensorEvent> {
        self.positions.get(i).map(|&p| &self.events[p])
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a SensorEvent> + 'a {
        let events = self.events;
        self.positions.iter().map(move |&p| &events[p])
    }

    pub fn to_vec(&self) -> Vec<&'a SensorEvent> {
        self.iter().collect()
    }
}

/// Query structures over indexed events.
#[derive(Debug, Default)]
pub struct EventIndex {
    events: Vec<SensorEvent>,
    indexed: bool,
    /// Bookmark names in first-seen order
    bookmark_names: Vec<String>,
    /// Bookmark name -> session ids in first-seen order
    bookmark_sessions: HashMap<String, Vec<i64>>,
    /// Bookmark name -> session id -> event positions
    bookmark_session_events: HashMap<String, HashMap<i64, Vec<usize>>>,
    /// Category -> sensor names in first-seen order
    category_sensors: HashMap<SensorCategory, Vec<String>>,
    /// Sensor name -> event positions
    sensor_events: HashMap<String, Vec<usize>>,
}

impl EventIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index over `events` in one call.
    pub fn from_events(events: Vec<SensorEvent>) -> Self {
        let mut index = Self::new();
        index.build(events);
        index
    }

    /// Clear and rebuild every lookup structure from `events`, in one pass.
    ///
    /// Event order is preserved in every list the index hands out.
    pub fn build(&mut self, events: Vec<SensorEvent>) {
        self.clear();
        self.events = events;

        let mut seen_sensors: HashSet<(SensorCategory, &str)> = HashSet::new();

        for (pos, event) in self.events.iter().enumerate() {
            let sessions = self
                .bookmark_session_events
                .entry(event.bookmark_name.clone())
                .or_insert_with(|| {
                    self.bookmark_names.push(event.bookmark_name.clone());
                    HashMap::new()
                });
            sessions
                .entry(event.session_id)
                .or_insert_with(|| {
                    self.bookmark_sessions
                        .entry(event.bookmark_name.clone())
                        .or_default()
                        .push(event.session_id);
                    Vec::new()
                })
                .push(pos);

            if seen_sensors.insert((event.category, event.sensor_name.as_str())) {
                self.category_sensors
                    .entry(event.category)
                    .or_default()
                    .push(event.sensor_name.clone());
            }

            self.sensor_events
                .entry(event.sensor_name.clone())
                .or_default()
                .push(pos);
        }

        self.indexed = true;
        tracing::debug!(
            events = self.events.len(),
            bookmarks = self.bookmark_names.len(),
            sensors = self.sensor_events.len(),
            "Index built"
        );
    }

    /// Clear and rebuild from one or more recorded sessions.
    pub fn build_sessions<'s>(&mut self, sessions: impl IntoIterator<Item = &'s Session>) {
        let events = sessions
            .into_iter()
            .flat_map(|s| s.events.iter().cloned())
            .collect();
        self.build(events);
    }

    /// Drop all events and lookup structures.
    pub fn clear(&mut self) {
        self.events.clear();
        self.bookmark_names.clear();
        self.bookmark_sessions.clear();
        self.bookmark_session_events.clear();
        self.category_sensors.clear();
        self.sensor_events.clear();
        self.indexed = false;
    }

    /// Whether `build` has been called since creation or the last `clear`.
    pub fn is_indexed(&self) -> bool {
        self.indexed
    }

    pub fn events(&self) -> &[SensorEvent] {
        &self.events
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Bookmark names in first-seen order.
    pub fn bookmark_names(&self) -> &[String] {
        &self.bookmark_names
    }

    /// Session ids that recorded events under `bookmark`.
    pub fn sessions_for_bookmark(&self, bookmark: &str) -> Option<&[i64]> {
        self.bookmark_sessions.get(bookmark).map(Vec::as_slice)
    }

    /// Events tagged with `bookmark` in session `session_id`.
    pub fn events_for_bookmark_and_session(
        &self,
        bookmark: &str,
        session_id: i64,
    ) -> Option<EventRefs<'_>> {
        self.bookmark_session_events
            .get(bookmark)?
            .get(&session_id)
            .map(|positions| self.refs(positions))
    }

    /// Sensor names observed for `category`, in first-seen order.
    pub fn sensor_names_for_category(&self, category: SensorCategory) -> Option<&[String]> {
        self.category_sensors.get(&category).map(Vec::as_slice)
    }

    /// All events of one sensor.
    pub fn events_for_sensor(&self, sensor_name: &str) -> Option<EventRefs<'_>> {
        self.sensor_events
            .get(sensor_name)
            .map(|positions| self.refs(positions))
    }

    /// Number of distinct sensors observed for `category`.
    pub fn sensor_count_for_category(&self, category: SensorCategory) -> usize {
        self.sensor_names_for_category(category)
            .map_or(0, |names| names.len())
    }

    /// Number of events recorded by sensors of `category`.
    pub fn event_count_for_category(&self, category: SensorCategory) -> usize {
        self.sensor_names_for_category(category)
            .unwrap_or_default()
            .iter()
            .filter_map(|name| self.sensor_events.get(name))
            .map(Vec::len)
            .sum()
    }

    fn refs<'a>(&'a self, positions: &'a [usize]) -> EventRefs<'a> {
        EventRefs {
            events: &self.events,
            positions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2018, 3, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    fn event(
        name: &str,
        category: SensorCategory,
        offset: i64,
        bookmark: &str,
        session: i64,
    ) -> SensorEvent {
        SensorEvent::new(name, category, "kitchen", t0() + Duration::seconds(offset), 1.0)
            .tagged(bookmark, session)
    }

    fn sample_events() -> Vec<SensorEvent> {
        vec![
            event("stove", SensorCategory::Toggle, 0, "cooking", 1),
            event("kitchen_temp", SensorCategory::Temperature, 5, "cooking", 1),
            event("stove", SensorCategory::Toggle, 10, "cooking", 2),
            event("bed", SensorCategory::Presence, 20, "sleeping", 2),
            event("stove", SensorCategory::Toggle, 30, "cooking", 1),
        ]
    }

    #[test]
    fn test_bookmark_and_session_maps() {
        let index = EventIndex::from_events(sample_events());

        assert_eq!(index.bookmark_names(), ["cooking", "sleeping"]);
        assert_eq!(index.sessions_for_bookmark("cooking"), Some(&[1, 2][..]));
        assert_eq!(index.sessions_for_bookmark("sleeping"), Some(&[2][..]));

        let cooking_1 = index.events_for_bookmark_and_session("cooking", 1).unwrap();
        let offsets: Vec<i64> = cooking_1
            .iter()
            .map(|e| (e.timestamp - t0()).num_seconds())
            .collect();
        assert_eq!(offsets, vec![0, 5, 30]);
    }

    #[test]
    fn test_sensor_and_category_maps() {
        let index = EventIndex::from_events(sample_events());

        assert_eq!(
            index.sensor_names_for_category(SensorCategory::Toggle),
            Some(&["stove".to_string()][..])
        );
        assert_eq!(index.events_for_sensor("stove").unwrap().len(), 3);
        assert_eq!(index.sensor_count_for_category(SensorCategory::Toggle), 1);
        assert_eq!(index.event_count_for_category(SensorCategory::Toggle), 3);
        assert_eq!(index.event_count_for_category(SensorCategory::Light), 0);
    }

    #[test]
    fn test_missing_lookups_are_none() {
        let index = EventIndex::from_events(sample_events());

        assert!(index.sessions_for_bookmark("dressing").is_none());
        assert!(index.events_for_bookmark_and_session("cooking", 99).is_none());
        assert!(index.events_for_bookmark_and_session("dressing", 1).is_none());
        assert!(index.sensor_names_for_category(SensorCategory::Light).is_none());
        assert!(index.events_for_sensor("fridge").is_none());
    }

    #[test]
    fn test_rebuild_replaces_previous_contents() {
        let mut index = EventIndex::new();
        assert!(!index.is_indexed());

        index.build(sample_events());
        index.build(vec![event("wardrobe", SensorCategory::Interaction, 0, "dressing", 3)]);

        assert!(index.is_indexed());
        assert_eq!(index.bookmark_names(), ["dressing"]);
        assert!(index.sessions_for_bookmark("cooking").is_none());
        assert!(index.events_for_sensor("stove").is_none());
        assert_eq!(index.event_count(), 1);
    }

    #[test]
    fn test_build_is_idempotent() {
        let mut index = EventIndex::new();
        index.build(sample_events());
        let first: Vec<SensorEvent> = index
            .events_for_bookmark_and_session("cooking", 1)
            .unwrap()
            .iter()
            .cloned()
            .collect();
        let first_sessions = index.sessions_for_bookmark("cooking").unwrap().to_vec();

        index.build(sample_events());
        let second: Vec<SensorEvent> = index
            .events_for_bookmark_and_session("cooking", 1)
            .unwrap()
            .iter()
            .cloned()
            .collect();

        assert_eq!(first, second);
        assert_eq!(first_sessions, index.sessions_for_bookmark("cooking").unwrap());
        assert_eq!(index.bookmark_names(), ["cooking", "sleeping"]);
    }

    #[test]
    fn test_empty_bookmark_name_is_indexed() {
        let index = EventIndex::from_events(vec![event("tap", SensorCategory::Toggle, 0, "", 0)]);
        assert_eq!(index.bookmark_names(), [""]);
        assert_eq!(index.events_for_bookmark_and_session("", 0).unwrap().len(), 1);
    }
}
