//! Application core: the emotion engine and its boundaries.
//!
//! The engine turns triggers and sensor events into display + motion
//! cycles.  All interaction with hardware happens through **port traits**
//! defined in [`ports`], keeping this layer testable without real
//! peripherals.

pub mod consumer;
pub mod engine;
pub mod outcome;
pub mod ports;

pub use engine::{EmotionEngine, EngineState, EngineStatus};
pub use outcome::{FailReason, Origin, RejectReason, StateRecord, TriggerOutcome};
