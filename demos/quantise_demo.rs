//! Demonstration of a simulated recording session being quantised.
//!
//! This example shows how to:
//! 1. Drive bookmarks from a simulated clock
//! 2. Feed readings from several producer threads through the collector
//! 3. End the session and tag readings by bookmark time range
//! 4. Quantise the tagged readings and print the feature vectors
//!
//! Run with: cargo run --example quantise_demo

use std::sync::Arc;
use std::thread;
use std::time::Duration as StdDuration;

use adl_quantiser::{
    collector::{EventCollector, SensorCategory, SensorEvent, DEFAULT_CAPACITY},
    core::{Quantiser, ReducerTable, SensorRegistry, SensorSpec, WindowDuration},
    io::write_vectors,
    session::{EventStore, ManualClock},
};
use chrono::{Duration, NaiveDate, NaiveDateTime};

fn start_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2018, 3, 1)
        .and_then(|d| d.and_hms_opt(7, 0, 0))
        .unwrap_or_default()
}

fn main() {
    println!("ADL Quantiser - Simulated Session Demo");
    println!("======================================");
    println!();

    let t0 = start_time();
    let clock = ManualClock::new(t0);
    let store = Arc::new(EventStore::with_clock(Arc::new(clock.clone())));

    let mut collector = EventCollector::new(DEFAULT_CAPACITY);
    if let Err(e) = collector.start() {
        eprintln!("Failed to start collector: {e}");
        return;
    }

    let session_id = store.start_next_session();
    println!("Recording session {session_id}");

    // Activities performed back to back on the simulated clock
    store.add_bookmark("dressing");
    clock.advance(Duration::minutes(2));
    store.close_bookmark("dressing");
    store.add_bookmark("cooking");
    clock.advance(Duration::minutes(3));
    store.close_bookmark("cooking");

    // Bedroom sensors: motion while dressing, wardrobe door opened twice
    let bedroom = collector.sender();
    let bedroom_thread = thread::spawn(move || {
        let mut sent = 0;
        for secs in (0..120).step_by(15) {
            let ts = t0 + Duration::seconds(secs);
            let motion = if secs < 90 { 1.0 } else { 0.0 };
            sent += usize::from(bedroom.send_blocking(SensorEvent::new(
                "bedroom_motion",
                SensorCategory::Presence,
                "bedroom",
                ts,
                motion,
            )));
            if secs == 30 || secs == 75 {
                sent += usize::from(bedroom.send_blocking(SensorEvent::new(
                    "wardrobe",
                    SensorCategory::Interaction,
                    "bedroom",
                    ts,
                    1.0,
                )));
            }
        }
        sent
    });

    // Kitchen sensors: stove on while cooking, temperature rising
    let kitchen = collector.sender();
    let kitchen_thread = thread::spawn(move || {
        let mut sent = 0;
        for secs in (120..300).step_by(20) {
            let ts = t0 + Duration::seconds(secs);
            sent += usize::from(kitchen.send_blocking(SensorEvent::new(
                "kitchen_temp",
                SensorCategory::Temperature,
                "kitchen",
                ts,
                19.0 + (secs - 120) as f64 / 30.0,
            )));
            if secs == 140 || secs == 260 {
                sent += usize::from(kitchen.send_blocking(SensorEvent::new(
                    "stove",
                    SensorCategory::Toggle,
                    "kitchen",
                    ts,
                    if secs == 140 { 1.0 } else { 0.0 },
                )));
            }
        }
        sent
    });

    // The consumer finishes once both producers drop their senders
    let consumer_store = Arc::clone(&store);
    let consumer =
        thread::spawn(move || collector.run_into(&consumer_store, StdDuration::from_millis(50)));

    let produced = bedroom_thread.join().unwrap_or(0) + kitchen_thread.join().unwrap_or(0);
    let stored = consumer.join().unwrap_or(0);
    store.end_session();
    println!("Produced {produced} readings, stored {stored}");

    let session = match store.snapshot() {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Snapshot failed: {e}");
            return;
        }
    };

    let registry = SensorRegistry::new([
        SensorSpec::new("kitchen_temp", SensorCategory::Temperature),
        SensorSpec::new("bedroom_motion", SensorCategory::Presence),
        SensorSpec::new("wardrobe", SensorCategory::Interaction),
        SensorSpec::new("stove", SensorCategory::Toggle),
    ]);
    let quantiser = Quantiser::new(
        registry,
        ReducerTable::default(),
        WindowDuration::from_secs(30),
    );

    let index = quantiser.index(session.tagged_events());
    let results = quantiser.quantise_all(&index);

    for result in &results {
        println!();
        println!(
            "Bookmark '{}' (session {}): {} windows",
            result.bookmark,
            result.session_id,
            result.vectors.len()
        );
        if let Err(e) = write_vectors(std::io::stdout(), quantiser.registry(), &result.vectors, true) {
            eprintln!("Failed to print vectors: {e}");
        }
    }

    println!();
    println!("{}", quantiser.stats().summary());
}
