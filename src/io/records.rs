//! Persisted event rows.
//!
//! One row per reading with the columns
//! `sensor_type, sensor_area, sensor_name, year, month, day, hours, minutes,
//! seconds, value, bookmark_name, session_id`. Timestamps are stored to
//! whole-second precision.

use crate::collector::types::{SensorCategory, SensorEvent};
use crate::error::{Error, Result};
use crate::session::store::Bookmark;
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::Path;

/// Column names in storage order.
pub const EVENT_COLUMNS: [&str; 12] = [
    "sensor_type",
    "sensor_area",
    "sensor_name",
    "year",
    "month",
    "day",
    "hours",
    "minutes",
    "seconds",
    "value",
    "bookmark_name",
    "session_id",
];

/// One stored reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorRecord {
    pub sensor_type: String,
    pub sensor_area: String,
    pub sensor_name: String,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
    pub value: f64,
    pub bookmark_name: String,
    pub session_id: i64,
}

impl SensorRecord {
    pub fn from_event(event: &SensorEvent) -> Self {
        let ts = event.timestamp;
        Self {
            sensor_type: event.category.as_str().to_string(),
            sensor_area: event.area_name.clone(),
            sensor_name: event.sensor_name.clone(),
            year: ts.year(),
            month: ts.month(),
            day: ts.day(),
            hours: ts.hour(),
            minutes: ts.minute(),
            seconds: ts.second(),
            value: event.value,
            bookmark_name: event.bookmark_name.clone(),
            session_id: event.session_id,
        }
    }

    /// Rebuild the event. Fails on an unknown category or impossible date.
    pub fn to_event(&self) -> Result<SensorEvent> {
        let category: SensorCategory = self.sensor_type.parse()?;
        let timestamp = self.timestamp()?;
        Ok(
            SensorEvent::new(&self.sensor_name, category, &self.sensor_area, timestamp, self.value)
                .tagged(&self.bookmark_name, self.session_id),
        )
    }

    fn timestamp(&self) -> Result<NaiveDateTime> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
            .and_then(|d| d.and_hms_opt(self.hours, self.minutes, self.seconds))
            .ok_or_else(|| {
                Error::InvalidTimestamp(format!(
                    "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                    self.year, self.month, self.day, self.hours, self.minutes, self.seconds
                ))
            })
    }
}

/// Read events from CSV with a header row.
///
/// Rows are numbered from 1 (the first data row). A row with the wrong
/// number of fields, a non-numeric field, an impossible date or an unknown
/// category fails the whole read.
pub fn read_events<R: Read>(reader: R) -> Result<Vec<SensorEvent>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut events = Vec::new();
    for (i, row) in csv_reader.deserialize::<SensorRecord>().enumerate() {
        let row_number = i + 1;
        let record = row.map_err(|e| malformed(row_number, e))?;
        let event = record.to_event().map_err(|e| Error::MalformedRecord {
            row: row_number,
            reason: e.to_string(),
        })?;
        events.push(event);
    }

    tracing::debug!(events = events.len(), "Read sensor events");
    Ok(events)
}

pub fn read_events_csv(path: &Path) -> Result<Vec<SensorEvent>> {
    let file = std::fs::File::open(path)?;
    read_events(file)
}

/// Write events as CSV with a header row.
pub fn write_events<'a, W: Write>(
    writer: W,
    events: impl IntoIterator<Item = &'a SensorEvent>,
) -> Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    let mut count = 0;
    for event in events {
        csv_writer.serialize(SensorRecord::from_event(event))?;
        count += 1;
    }
    // An empty file still gets its header
    if count == 0 {
        csv_writer.write_record(EVENT_COLUMNS)?;
    }
    csv_writer.flush()?;
    Ok(count)
}

pub fn write_events_csv<'a>(
    path: &Path,
    events: impl IntoIterator<Item = &'a SensorEvent>,
) -> Result<usize> {
    let file = std::fs::File::create(path)?;
    write_events(file, events)
}

/// Bookmark file row: `name,start_time,end_time` with ISO-8601 timestamps.
/// An empty `end_time` leaves the bookmark open.
pub fn read_bookmarks<R: Read>(reader: R) -> Result<Vec<Bookmark>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    csv_reader
        .deserialize::<Bookmark>()
        .enumerate()
        .map(|(i, row)| row.map_err(|e| malformed(i + 1, e)))
        .collect()
}

pub fn read_bookmarks_csv(path: &Path) -> Result<Vec<Bookmark>> {
    let file = std::fs::File::open(path)?;
    read_bookmarks(file)
}

fn malformed(row: usize, err: csv::Error) -> Error {
    match err.kind() {
        csv::ErrorKind::Io(_) => Error::Csv(err),
        _ => Error::MalformedRecord {
            row,
            reason: err.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const HEADER: &str = "sensor_type,sensor_area,sensor_name,year,month,day,hours,minutes,seconds,value,bookmark_name,session_id\n";

    fn parse(body: &str) -> Result<Vec<SensorEvent>> {
        read_events(format!("{HEADER}{body}").as_bytes())
    }

    #[test]
    fn test_read_with_aliases() {
        let events = parse(
            "Motion,kitchen,kitchen_pir,2018,3,1,8,0,5,1,cooking,2\n\
             Pressure,bedroom,bed,2018,3,1,8,0,6,0,,2\n",
        )
        .unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].category, SensorCategory::Presence);
        assert_eq!(events[0].bookmark_name, "cooking");
        assert_eq!(events[0].session_id, 2);
        assert_eq!(events[1].category, SensorCategory::Toggle);
        assert_eq!(events[1].bookmark_name, "");
        assert_eq!(
            events[1].timestamp,
            NaiveDate::from_ymd_opt(2018, 3, 1)
                .unwrap()
                .and_hms_opt(8, 0, 6)
                .unwrap()
        );
    }

    #[test]
    fn test_wrong_column_count_is_malformed() {
        let err = parse("Light,hall,hall_lux,2018,3,1,8,0,5,120\n").unwrap_err();
        assert!(matches!(err, Error::MalformedRecord { row: 1, .. }));
    }

    #[test]
    fn test_non_numeric_field_is_malformed() {
        let err = parse(
            "Light,hall,hall_lux,2018,3,1,8,0,5,120,,1\n\
             Light,hall,hall_lux,2018,3,1,8,0,x,120,,1\n",
        )
        .unwrap_err();
        assert!(matches!(err, Error::MalformedRecord { row: 2, .. }));
    }

    #[test]
    fn test_impossible_date_and_unknown_category() {
        let err = parse("Light,hall,hall_lux,2018,2,30,8,0,5,120,,1\n").unwrap_err();
        assert!(matches!(err, Error::MalformedRecord { row: 1, .. }));

        let err = parse("Humidity,hall,hall_rh,2018,3,1,8,0,5,40,,1\n").unwrap_err();
        match err {
            Error::MalformedRecord { reason, .. } => assert!(reason.contains("Humidity")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_write_then_read() {
        let ts = NaiveDate::from_ymd_opt(2018, 3, 1)
            .unwrap()
            .and_hms_opt(23, 59, 59)
            .unwrap();
        let events = vec![
            SensorEvent::new("stove", SensorCategory::Toggle, "kitchen", ts, 1.0).tagged("cooking", 3),
            SensorEvent::new("hall_lux", SensorCategory::Light, "hall", ts, 87.5),
        ];

        let mut buf = Vec::new();
        assert_eq!(write_events(&mut buf, &events).unwrap(), 2);
        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.starts_with(&EVENT_COLUMNS.join(",")));

        assert_eq!(read_events(buf.as_slice()).unwrap(), events);
    }

    #[test]
    fn test_empty_write_keeps_header() {
        let mut buf = Vec::new();
        write_events(&mut buf, &Vec::<SensorEvent>::new()).unwrap();
        assert!(read_events(buf.as_slice()).unwrap().is_empty());
    }

    #[test]
    fn test_read_bookmarks() {
        let csv = "name,start_time,end_time\n\
                   cooking,2018-03-01T08:00:00,2018-03-01T08:30:00\n\
                   sleeping,2018-03-01T22:00:00,\n";
        let bookmarks = read_bookmarks(csv.as_bytes()).unwrap();
        assert_eq!(bookmarks.len(), 2);
        assert!(!bookmarks[0].is_open());
        assert!(bookmarks[1].is_open());
    }
}
