//! Channel-based ingestion from asynchronous sensor sources.
//!
//! Producers hold an [`EventSender`] and push readings from any thread. A
//! single consumer drains the channel into an [`EventStore`] in arrival
//! order. Readings that arrive while the store is idle are dropped by the
//! store, matching its best-effort logging policy.

use crate::collector::types::SensorEvent;
use crate::session::store::EventStore;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Default channel capacity.
pub const DEFAULT_CAPACITY: usize = 10_000;

/// Producer handle. Cheap to clone; one per sensor source is typical.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: Sender<SensorEvent>,
    running: Arc<AtomicBool>,
}

impl EventSender {
    /// Queue a reading. Returns `false` when the collector is stopped,
    /// the queue is full, or the consumer has gone away.
    pub fn send(&self, event: SensorEvent) -> bool {
        if !self.running.load(Ordering::SeqCst) {
            return false;
        }
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::warn!("Event queue full; reading dropped");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Queue a reading, waiting for space if the queue is full.
    pub fn send_blocking(&self, event: SensorEvent) -> bool {
        if !self.running.load(Ordering::SeqCst) {
            return false;
        }
        self.sender.send(event).is_ok()
    }
}

/// Errors that can occur while controlling the collector.
#[derive(Debug)]
pub enum CollectorError {
    AlreadyRunning,
}

impl std::fmt::Display for CollectorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectorError::AlreadyRunning => write!(f, "Collector is already running"),
        }
    }
}

impl std::error::Error for CollectorError {}

/// Multi-producer, single-consumer event queue.
pub struct EventCollector {
    sender: Sender<SensorEvent>,
    receiver: Receiver<SensorEvent>,
    running: Arc<AtomicBool>,
}

impl EventCollector {
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start accepting readings from producers.
    pub fn start(&mut self) -> Result<(), CollectorError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(CollectorError::AlreadyRunning);
        }
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Stop accepting readings. Already queued readings can still be drained.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// A new producer handle.
    pub fn sender(&self) -> EventSender {
        EventSender {
            sender: self.sender.clone(),
            running: Arc::clone(&self.running),
        }
    }

    /// Number of readings waiting in the queue.
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    /// Move every queued reading into `store` without blocking.
    ///
    /// Returns how many readings the store accepted.
    pub fn drain_into(&self, store: &EventStore) -> usize {
        let mut accepted = 0;
        while let Ok(event) = self.receiver.try_recv() {
            if store.add_event(event) {
                accepted += 1;
            }
        }
        accepted
    }

    /// Pump readings into `store` until the collector is stopped and the
    /// queue is empty, or every producer has been dropped.
    ///
    /// Consumes the collector so its own sender does not keep the channel
    /// alive. Returns how many readings the store accepted.
    pub fn run_into(self, store: &EventStore, poll: Duration) -> usize {
        let EventCollector {
            sender,
            receiver,
            running,
        } = self;
        drop(sender);

        let mut accepted = 0;
        loop {
            match receiver.recv_timeout(poll) {
                Ok(event) => {
                    if store.add_event(event) {
                        accepted += 1;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    if !running.load(Ordering::SeqCst) && receiver.is_empty() {
                        break;
                    }
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        accepted
    }
}

impl Default for EventCollector {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
