//! Splitting a chronologically ordered event list into fixed time windows.
//!
//! Boundaries step along a fixed grid anchored at the start time. The first
//! boundary is `start + d`. Each event past the current boundary closes the
//! open window and moves the boundary on by exactly one step, so after a
//! gap the boundary lags behind the data and every following event opens
//! its own window until the grid catches up. Only windows holding at least
//! one event are emitted.

use crate::collector::types::SensorEvent;
use chrono::{Duration, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Window length expressed as hours, minutes and seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WindowDuration {
    #[serde(default)]
    pub hours: u32,
    #[serde(default)]
    pub minutes: u32,
    #[serde(default)]
    pub seconds: u32,
}

impl WindowDuration {
    pub fn new(hours: u32, minutes: u32, seconds: u32) -> Self {
        Self {
            hours,
            minutes,
            seconds,
        }
    }

    pub fn from_secs(seconds: u32) -> Self {
        Self::new(0, 0, seconds)
    }

    pub fn total_seconds(&self) -> i64 {
        i64::from(self.hours) * 3600 + i64::from(self.minutes) * 60 + i64::from(self.seconds)
    }

    pub fn is_zero(&self) -> bool {
        self.total_seconds() == 0
    }

    pub fn as_duration(&self) -> Duration {
        Duration::seconds(self.total_seconds())
    }
}

impl fmt::Display for WindowDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }
}

/// One emitted window: its grid end and the events inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct Window<'a> {
    /// Grid boundary in force when the window closed. Every event after
    /// the first is at or before it; the first may lie past it after a gap.
    pub end: NaiveDateTime,
    /// Events in ascending timestamp order, never empty
    pub events: Vec<&'a SensorEvent>,
}

impl<'a> Window<'a> {
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn first_timestamp(&self) -> Option<NaiveDateTime> {
        self.events.first().map(|e| e.timestamp)
    }
}

/// Partition `events` (ascending by timestamp) into grid windows anchored
/// at `start`.
///
/// The anchor is truncated to whole seconds. A zero duration yields no
/// windows; reporting that is the caller's job.
pub fn sample_windows<'a, I>(events: I, start: NaiveDateTime, duration: WindowDuration) -> Vec<Window<'a>>
where
    I: IntoIterator<Item = &'a SensorEvent>,
{
    if duration.is_zero() {
        return Vec::new();
    }
    let step = duration.as_duration();
    let anchor = start.with_nanosecond(0).unwrap_or(start);

    let mut windows = Vec::new();
    let mut boundary = anchor + step;
    let mut bucket: Vec<&'a SensorEvent> = Vec::new();

    for event in events {
        if event.timestamp > boundary {
            if !bucket.is_empty() {
                windows.push(Window {
                    end: boundary,
                    events: std::mem::take(&mut bucket),
                });
            }
            boundary += step;
        }
        bucket.push(event);
    }

    if !bucket.is_empty() {
        windows.push(Window {
            end: boundary,
            events: bucket,
        });
    }

    windows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::types::SensorCategory;
    use chrono::NaiveDate;

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2018, 3, 1)
            .unwrap()
            .and_hms_opt(23, 59, 0)
            .unwrap()
    }

    fn events_at(offsets: &[i64]) -> Vec<SensorEvent> {
        offsets
            .iter()
            .map(|&o| {
                SensorEvent::new(
                    "tap",
                    SensorCategory::Toggle,
                    "kitchen",
                    t0() + Duration::seconds(o),
                    1.0,
                )
            })
            .collect()
    }

    fn offsets(window: &Window<'_>) -> Vec<i64> {
        window
            .events
            .iter()
            .map(|e| (e.timestamp - t0()).num_seconds())
            .collect()
    }

    #[test]
    fn test_duration_conversions() {
        let d = WindowDuration::new(1, 2, 3);
        assert_eq!(d.total_seconds(), 3723);
        assert_eq!(d.to_string(), "01:02:03");
        assert!(WindowDuration::default().is_zero());
    }

    #[test]
    fn test_zero_duration_yields_nothing() {
        let events = events_at(&[0, 1, 2]);
        assert!(sample_windows(&events, t0(), WindowDuration::default()).is_empty());
    }

    #[test]
    fn test_empty_input_yields_nothing() {
        let events: Vec<SensorEvent> = Vec::new();
        assert!(sample_windows(&events, t0(), WindowDuration::from_secs(10)).is_empty());
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let events = events_at(&[0, 60, 61]);
        let windows = sample_windows(&events, t0(), WindowDuration::from_secs(60));

        assert_eq!(windows.len(), 2);
        assert_eq!(offsets(&windows[0]), vec![0, 60]);
        assert_eq!(offsets(&windows[1]), vec![61]);
        assert_eq!(windows[1].end, t0() + Duration::seconds(120));
    }

    #[test]
    fn test_gap_advances_one_step_per_overflow() {
        let events = events_at(&[0, 90]);
        let windows = sample_windows(&events, t0(), WindowDuration::from_secs(60));
        assert_eq!(windows.len(), 2);
        assert_eq!(offsets(&windows[0]), vec![0]);
        assert_eq!(offsets(&windows[1]), vec![90]);
        assert_eq!(windows[1].end, t0() + Duration::seconds(120));

        // After the gap the boundary sits at 120s, then 180s: 200s and 210s
        // each overflow it and land in separate windows
        let events = events_at(&[0, 200, 210]);
        let windows = sample_windows(&events, t0(), WindowDuration::from_secs(60));
        let sizes: Vec<usize> = windows.iter().map(Window::len).collect();
        assert_eq!(sizes, vec![1, 1, 1]);
        assert_eq!(windows[1].end, t0() + Duration::seconds(120));
        assert_eq!(windows[2].end, t0() + Duration::seconds(180));
    }

    #[test]
    fn test_boundary_catches_up_after_gap() {
        // Boundary steps 60 -> 120 -> 180 -> 240; 230 and 235 share the last
        let events = events_at(&[0, 200, 210, 230, 235]);
        let windows = sample_windows(&events, t0(), WindowDuration::from_secs(60));
        assert_eq!(windows.len(), 4);
        assert_eq!(offsets(&windows[3]), vec![230, 235]);
        assert_eq!(windows[3].end, t0() + Duration::seconds(240));
    }

    #[test]
    fn test_grid_crosses_midnight() {
        let events = events_at(&[0, 45, 75]);
        let windows = sample_windows(&events, t0(), WindowDuration::from_secs(30));
        assert_eq!(windows.len(), 3);
        assert_eq!(
            windows[2].end,
            NaiveDate::from_ymd_opt(2018, 3, 2)
                .unwrap()
                .and_hms_opt(0, 0, 30)
                .unwrap()
        );
    }

    #[test]
    fn test_anchor_truncated_to_whole_seconds() {
        let events = events_at(&[10]);
        let start = t0() + Duration::milliseconds(500);
        let windows = sample_windows(&events, start, WindowDuration::from_secs(10));
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].end, t0() + Duration::seconds(10));
    }

    #[test]
    fn test_partition_preserves_every_event() {
        let raw = [0, 3, 3, 9, 14, 15, 31, 32, 100, 101, 250];
        let events = events_at(&raw);
        let windows = sample_windows(&events, t0(), WindowDuration::from_secs(7));

        let flattened: Vec<i64> = windows.iter().flat_map(offsets).collect();
        assert_eq!(flattened, raw.to_vec());
        assert!(windows.iter().all(|w| !w.is_empty()));
        for w in &windows {
            assert!(w.events[1..].iter().all(|e| e.timestamp <= w.end));
        }
        for pair in windows.windows(2) {
            assert!(pair[1].first_timestamp().unwrap() > pair[0].end);
        }
    }
}
