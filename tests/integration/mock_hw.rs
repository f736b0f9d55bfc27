//! Mock hardware adapters for integration tests.
//!
//! Records every display, servo and clock call into one shared step log
//! so tests can assert on ordering across subsystems.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use beemo::adapters::time::ManualClock;
use crossbeam_channel::Receiver;
use beemo::app::ports::{Clock, DisplayPort, Joint, ServoBus};
use beemo::config::EngineConfig;
use beemo::error::{ActuatorError, DisplayError};
use beemo::frames::Frame;

// ── Step record ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Show { index: u32 },
    Clear,
    Throttle(f32),
    Angle(Joint, f32),
    Release,
    Sleep(Duration),
}

#[derive(Clone, Default)]
pub struct StepLog(Arc<Mutex<Vec<Step>>>);

#[allow(dead_code)]
impl StepLog {
    pub fn push(&self, step: Step) {
        self.0.lock().unwrap().push(step);
    }

    pub fn steps(&self) -> Vec<Step> {
        self.0.lock().unwrap().clone()
    }

    pub fn servo_steps(&self) -> Vec<Step> {
        self.steps()
            .into_iter()
            .filter(|s| matches!(s, Step::Throttle(_) | Step::Angle(..) | Step::Release))
            .collect()
    }

    pub fn frames_shown(&self) -> usize {
        self.steps()
            .iter()
            .filter(|s| matches!(s, Step::Show { .. }))
            .count()
    }
}

// ── MockDisplay ───────────────────────────────────────────────

pub struct MockDisplay {
    pub log: StepLog,
}

impl DisplayPort for MockDisplay {
    fn show(&mut self, frame: &Frame) -> Result<(), DisplayError> {
        self.log.push(Step::Show { index: frame.index });
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        self.log.push(Step::Clear);
        Ok(())
    }

    fn size(&self) -> (u32, u32) {
        (128, 64)
    }
}

// ── MockServos ────────────────────────────────────────────────

pub struct MockServos {
    pub log: StepLog,
}

impl ServoBus for MockServos {
    fn set_angle(&mut self, joint: Joint, degrees: f32) -> Result<(), ActuatorError> {
        self.log.push(Step::Angle(joint, degrees));
        Ok(())
    }

    fn set_throttle(&mut self, throttle: f32) -> Result<(), ActuatorError> {
        self.log.push(Step::Throttle(throttle));
        Ok(())
    }

    fn release(&mut self) -> Result<(), ActuatorError> {
        self.log.push(Step::Release);
        Ok(())
    }
}

/// Servo bus whose joint writes block until every sender of `gate` is
/// dropped, like a stalled actuator.
pub struct HangingServos {
    pub log: StepLog,
    pub gate: Receiver<()>,
}

impl ServoBus for HangingServos {
    fn set_angle(&mut self, joint: Joint, degrees: f32) -> Result<(), ActuatorError> {
        self.log.push(Step::Angle(joint, degrees));
        let _ = self.gate.recv();
        Ok(())
    }

    fn set_throttle(&mut self, throttle: f32) -> Result<(), ActuatorError> {
        self.log.push(Step::Throttle(throttle));
        Ok(())
    }

    fn release(&mut self) -> Result<(), ActuatorError> {
        self.log.push(Step::Release);
        Ok(())
    }
}

// ── RecordingClock ────────────────────────────────────────────

/// Virtual clock that also records each sleep in the step log.
pub struct RecordingClock {
    pub inner: ManualClock,
    pub log: StepLog,
}

#[allow(dead_code)]
impl RecordingClock {
    pub fn new(log: StepLog) -> Self {
        Self {
            inner: ManualClock::new(),
            log,
        }
    }

    pub fn advance(&self, by: Duration) {
        self.inner.advance(by);
    }
}

impl Clock for RecordingClock {
    fn now(&self) -> Instant {
        self.inner.now()
    }

    fn sleep(&self, duration: Duration) {
        self.log.push(Step::Sleep(duration));
        self.inner.sleep(duration);
    }
}

// ── Assets ────────────────────────────────────────────────────

/// Write `count` solid-white 16×16 frames for `emotion` under `root`.
pub fn write_frames(root: &Path, emotion: &str, count: u32) {
    let dir = root.join(emotion);
    std::fs::create_dir_all(&dir).unwrap();
    for i in 1..=count {
        image::GrayImage::from_pixel(16, 16, image::Luma([255]))
            .save(dir.join(format!("frame{i}.png")))
            .unwrap();
    }
}

/// Frames for every built-in emotion.
#[allow(dead_code)]
pub fn write_all_frames(root: &Path, count: u32) {
    for profile in beemo::emotion::EmotionCatalog::builtin().iter() {
        write_frames(root, profile.name, count);
    }
}

/// Defaults pointed at `root`, with short sensor-path delays.
#[allow(dead_code)]
pub fn test_config(root: &Path) -> EngineConfig {
    EngineConfig {
        asset_root: root.to_path_buf(),
        ..EngineConfig::default()
    }
}
