//! Relational event table.
//!
//! Same columns as the CSV rows, one table per database. Category names
//! are stored canonically; the `Motion` and `Pressure` aliases are
//! accepted when loading.

use crate::collector::types::SensorEvent;
use crate::error::{Error, Result};
use crate::io::records::SensorRecord;
use rusqlite::{params, Connection};

/// Create the event table if it does not exist yet.
pub fn create_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS sensor_events (
            sensor_type   TEXT NOT NULL,
            sensor_area   TEXT NOT NULL,
            sensor_name   TEXT NOT NULL,
            year          INTEGER NOT NULL,
            month         INTEGER NOT NULL,
            day           INTEGER NOT NULL,
            hours         INTEGER NOT NULL,
            minutes       INTEGER NOT NULL,
            seconds       INTEGER NOT NULL,
            value         REAL NOT NULL,
            bookmark_name TEXT NOT NULL,
            session_id    INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_sensor_events_session
            ON sensor_events(session_id);",
    )?;
    Ok(())
}

/// Insert events in one transaction.
pub fn insert_events<'a>(
    conn: &mut Connection,
    events: impl IntoIterator<Item = &'a SensorEvent>,
) -> Result<usize> {
    let tx = conn.transaction()?;
    let mut count = 0;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO sensor_events (
                sensor_type, sensor_area, sensor_name,
                year, month, day, hours, minutes, seconds,
                value, bookmark_name, session_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        )?;
        for event in events {
            let r = SensorRecord::from_event(event);
            stmt.execute(params![
                r.sensor_type,
                r.sensor_area,
                r.sensor_name,
                r.year,
                r.month,
                r.day,
                r.hours,
                r.minutes,
                r.seconds,
                r.value,
                r.bookmark_name,
                r.session_id,
            ])?;
            count += 1;
        }
    }
    tx.commit()?;
    tracing::debug!(events = count, "Inserted sensor events");
    Ok(count)
}

/// Load events in insertion order, optionally restricted to one session.
pub fn load_events(conn: &Connection, session_id: Option<i64>) -> Result<Vec<SensorEvent>> {
    let mut stmt = conn.prepare(
        "SELECT sensor_type, sensor_area, sensor_name,
                year, month, day, hours, minutes, seconds,
                value, bookmark_name, session_id
         FROM sensor_events
         WHERE ?1 IS NULL OR session_id = ?1
         ORDER BY rowid ASC",
    )?;

    let rows = stmt.query_map(params![session_id], |row| {
        Ok(SensorRecord {
            sensor_type: row.get(0)?,
            sensor_area: row.get(1)?,
            sensor_name: row.get(2)?,
            year: row.get(3)?,
            month: row.get(4)?,
            day: row.get(5)?,
            hours: row.get(6)?,
            minutes: row.get(7)?,
            seconds: row.get(8)?,
            value: row.get(9)?,
            bookmark_name: row.get(10)?,
            session_id: row.get(11)?,
        })
    })?;

    let mut events = Vec::new();
    for (i, row) in rows.enumerate() {
        let record = row?;
        let event = record.to_event().map_err(|e| Error::MalformedRecord {
            row: i + 1,
            reason: e.to_string(),
        })?;
        events.push(event);
    }
    Ok(events)
}

/// Smallest and largest stored session id, or `None` for an empty table.
pub fn session_id_range(conn: &Connection) -> Result<Option<(i64, i64)>> {
    let range = conn.query_row(
        "SELECT MIN(session_id), MAX(session_id) FROM sensor_events",
        [],
        |row| Ok((row.get::<_, Option<i64>>(0)?, row.get::<_, Option<i64>>(1)?)),
    )?;
    Ok(match range {
        (Some(min), Some(max)) => Some((min, max)),
        _ => None,
    })
}
