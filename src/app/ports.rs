//! Port traits: the hexagonal boundary between the emotion engine and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ EmotionEngine / SensorMonitor (domain)
//! ```
//!
//! Driven adapters (display, servos, GPIO edge detection, persistence,
//! time) implement these traits.  The engine consumes them via generics or
//! trait objects, so the domain core never touches hardware directly.

use std::time::{Duration, Instant};

use crate::error::{ActuatorError, DisplayError, SensorError};
use crate::frames::Frame;

use super::outcome::StateRecord;

// ───────────────────────────────────────────────────────────────
// Display port (domain → panel)
// ───────────────────────────────────────────────────────────────

/// A monochrome framebuffer-style display.
pub trait DisplayPort {
    /// Push one full frame to the panel.
    fn show(&mut self, frame: &Frame) -> Result<(), DisplayError>;

    /// Blank the panel.
    fn clear(&mut self) -> Result<(), DisplayError>;

    /// Panel size in pixels, `(width, height)`.
    fn size(&self) -> (u32, u32);
}

impl<T: DisplayPort + ?Sized> DisplayPort for Box<T> {
    fn show(&mut self, frame: &Frame) -> Result<(), DisplayError> {
        (**self).show(frame)
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        (**self).clear()
    }

    fn size(&self) -> (u32, u32) {
        (**self).size()
    }
}

// ───────────────────────────────────────────────────────────────
// Servo bus (domain → actuators)
// ───────────────────────────────────────────────────────────────

/// The two angular joints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Joint {
    Left,
    Right,
}

/// Two angular servos plus one continuous-rotation servo.
pub trait ServoBus {
    /// Command an angular joint, degrees 0–180.
    fn set_angle(&mut self, joint: Joint, degrees: f32) -> Result<(), ActuatorError>;

    /// Command the continuous servo, throttle −1.0 … 1.0.
    fn set_throttle(&mut self, throttle: f32) -> Result<(), ActuatorError>;

    /// De-energise every channel.
    fn release(&mut self) -> Result<(), ActuatorError>;
}

// ───────────────────────────────────────────────────────────────
// Edge detector (hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Callback invoked on each detected falling edge.
pub type EdgeCallback = Box<dyn FnMut() + Send>;

/// Interrupt-style falling-edge registration for digital inputs.
///
/// Platforms without edge support return
/// [`SensorError::InterruptUnavailable`] and the sensor monitor falls back
/// to polling.
pub trait EdgeDetector {
    /// Invoke `callback` on every falling edge of `pin`.  `debounce` is the
    /// minimum spacing the platform should enforce, if it can.
    fn watch_falling(
        &mut self,
        pin: u8,
        debounce: Duration,
        callback: EdgeCallback,
    ) -> Result<(), SensorError>;

    /// Remove a registration.  Unknown pins are ignored.
    fn unwatch(&mut self, pin: u8);
}

// ───────────────────────────────────────────────────────────────
// Persistence (domain → history store)
// ───────────────────────────────────────────────────────────────

/// Fire-and-forget sink for emotion history and statistics.
///
/// Failures are reported to the caller, which only logs them; nothing in
/// the trigger path waits on or retries persistence.
pub trait PersistencePort {
    /// Append one completed cycle to the history.
    fn record_state(&mut self, record: &StateRecord) -> Result<(), PersistenceError>;

    /// Bump the per-emotion counter and last-triggered time.
    fn increment_stat(&mut self, emotion: &str) -> Result<(), PersistenceError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistenceError {
    /// The backing store is not reachable.
    Unavailable,
    /// A write was attempted and failed.
    WriteFailed,
    /// A buffered writer had no room for the record.
    QueueFull,
}

impl core::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Unavailable => write!(f, "persistence unavailable"),
            Self::WriteFailed => write!(f, "persistence write failed"),
            Self::QueueFull => write!(f, "persistence queue full"),
        }
    }
}

impl std::error::Error for PersistenceError {}

// ───────────────────────────────────────────────────────────────
// Clock
// ───────────────────────────────────────────────────────────────

/// Monotonic time source.  Every delay in the engine goes through this so
/// tests can run timing logic without wall-clock waits.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;

    fn sleep(&self, duration: Duration);
}
