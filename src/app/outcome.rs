//! Results of an emotion cycle and the records reported to persistence.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::drivers::actuators::MotionOutcome;
use crate::emotion::triggers::TriggerKind;
use crate::events::SensorSource;

/// What started a cycle.  Recorded alongside every state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// A semantic trigger from the command layer.
    Trigger(TriggerKind),
    /// A queued sensor event.
    Sensor(SensorSource),
    /// A self-chained transition-graph step.
    Transition,
    /// The consumer's forced return to the idle emotion.
    Recovery,
    /// Part of the startup or shutdown sequence.
    Sequence,
}

impl Origin {
    pub fn label(self) -> &'static str {
        match self {
            Self::Trigger(kind) => kind.as_str(),
            Self::Sensor(source) => source.as_str(),
            Self::Transition => "transition",
            Self::Recovery => "recovery",
            Self::Sequence => "sequence",
        }
    }
}

/// Outcome of one trigger attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TriggerOutcome {
    /// The animation played to the end.
    Played {
        emotion: &'static str,
        frames: usize,
        duration: Duration,
        /// `None` if the actuator thread missed its join deadline.
        motion: Option<MotionOutcome>,
    },
    /// Refused by policy before any side effect.
    Rejected(RejectReason),
    /// Attempted but nothing could be shown.
    Failed(FailReason),
}

impl TriggerOutcome {
    pub fn is_played(&self) -> bool {
        matches!(self, Self::Played { .. })
    }

    /// Emotion that played, if any.
    pub fn emotion(&self) -> Option<&'static str> {
        match self {
            Self::Played { emotion, .. } => Some(emotion),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The previous cycle finished less than the cooldown ago.
    Cooldown { remaining: Duration },
    /// Another cycle holds the display.
    Busy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailReason {
    /// No display was initialised at startup.
    DisplayUnavailable,
    /// The emotion (and the idle fallback, if tried) had no frames.
    NoFrames { emotion: &'static str },
}

/// One row of emotion history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateRecord {
    pub emotion: String,
    pub trigger: String,
    pub duration_ms: u64,
    /// Wall-clock time the cycle finished, milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
}

impl StateRecord {
    pub fn new(emotion: &str, origin: Origin, duration: Duration) -> Self {
        Self {
            emotion: emotion.to_owned(),
            trigger: origin.label().to_owned(),
            duration_ms: duration.as_millis() as u64,
            timestamp_ms: unix_millis(),
        }
    }
}

/// Milliseconds since the Unix epoch (0 if the wall clock is before it).
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
