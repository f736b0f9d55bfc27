//! Beemo core library.
//!
//! Sensor-driven emotion animation and servo coordination for the Beemo
//! companion robot.  Hardware is reached only through the port traits in
//! [`app::ports`]; the [`adapters`] module ships simulation and journal
//! implementations so the whole core runs on a host.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod emotion;
pub mod error;
pub mod events;
pub mod frames;
pub mod pins;
pub mod sensors;

pub use app::{EmotionEngine, TriggerOutcome};
pub use config::EngineConfig;
pub use emotion::triggers::TriggerKind;
pub use error::{Error, Result};
