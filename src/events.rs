//! Sensor event pipeline.
//!
//! Events are produced by:
//! - GPIO edge callbacks (interrupt mode)
//! - The polling thread (polling mode)
//!
//! Events are consumed by a single consumer thread, which dispatches them
//! to the emotion engine one at a time in enqueue order.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ Edge ISR    │────▶│  Event Queue │────▶│  Consumer    │
//! │ Poll thread │────▶│  (bounded)   │     │  (single)    │
//! └─────────────┘     └──────────────┘     └──────────────┘
//! ```
//!
//! Producers never block: a full queue drops the event.  Physical sensors
//! fire faster than animations play, so liveness of the producer wins over
//! completeness.

use core::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};

/// Physical input that produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorSource {
    Touch,
    Vibration,
}

impl SensorSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Touch => "touch",
            Self::Vibration => "vibration",
        }
    }
}

impl fmt::Display for SensorSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One stimulus occurrence, consumed exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorEvent {
    pub source: SensorSource,
    pub emotion: &'static str,
    pub enqueued_at: Instant,
}

impl SensorEvent {
    pub fn new(source: SensorSource, emotion: &'static str) -> Self {
        Self {
            source,
            emotion,
            enqueued_at: Instant::now(),
        }
    }
}

/// Bounded FIFO of [`SensorEvent`]s.
///
/// Cloning yields another handle onto the same queue, so producers and the
/// consumer can each hold one.
#[derive(Clone)]
pub struct EventQueue {
    tx: Sender<SensorEvent>,
    rx: Receiver<SensorEvent>,
    capacity: usize,
    dropped: Arc<AtomicU64>,
}

impl EventQueue {
    /// Create a queue holding at most `capacity` pending events.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        Self {
            tx,
            rx,
            capacity,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Push an event without blocking.
    /// Returns `false` if the queue is full (event dropped).
    pub fn push(&self, event: SensorEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(ev)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                log::debug!("event queue full, dropping {} -> {}", ev.source, ev.emotion);
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Wait up to `timeout` for the next event.
    pub fn pop_timeout(&self, timeout: Duration) -> Option<SensorEvent> {
        match self.rx.recv_timeout(timeout) {
            Ok(ev) => Some(ev),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Pop the next event if one is pending.
    pub fn try_pop(&self) -> Option<SensorEvent> {
        self.rx.try_recv().ok()
    }

    /// Drain all pending events into a callback, in FIFO order.
    pub fn drain(&self, mut handler: impl FnMut(SensorEvent)) {
        while let Some(event) = self.try_pop() {
            handler(event);
        }
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Events dropped because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
