//! Timestamp debounce and falling-edge detection for digital inputs.
//!
//! Active-low inputs with pull-ups: a stimulus is a high → low transition.
//! Edges arriving less than `interval` after the last accepted edge are
//! ignored.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct Debouncer {
    interval: Duration,
    last: Option<Instant>,
    prev_high: bool,
}

impl Debouncer {
    /// `initial_high` is the level sampled at configuration time.
    pub fn new(interval: Duration, initial_high: bool) -> Self {
        Self {
            interval,
            last: None,
            prev_high: initial_high,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Accept an already-detected edge if it is outside the debounce window.
    pub fn accept(&mut self, now: Instant) -> bool {
        match self.last {
            Some(t) if now.saturating_duration_since(t) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }

    /// Feed one polled sample.  Returns `true` on an accepted falling edge.
    pub fn sample(&mut self, high: bool, now: Instant) -> bool {
        let falling = self.prev_high && !high;
        self.prev_high = high;
        falling && self.accept(now)
    }
}
