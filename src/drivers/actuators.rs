//! Actuator coordinator: emotion profile → servo motion.
//!
//! ## Motion modes
//!
//! | Mode          | When                                  | Behaviour |
//! |---------------|---------------------------------------|-----------|
//! | Synchronized  | Both joints have an angle             | Throttle + both angles in one step, hold, stop throttle |
//! | Oscillation   | Either joint is `Oscillate`           | Both joints sweep centre ± amplitude while spinning |
//! | Individual    | Only one joint specified              | Throttle, then each joint in turn with its own hold |
//!
//! Every mode ends with an unconditional return to neutral (both joints
//! 90°, throttle 0) and a short settle.  Faults are logged and reported in
//! the [`MotionOutcome`]; they never propagate.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};

use crate::app::ports::{Clock, Joint, ServoBus};
use crate::config::EngineConfig;
use crate::emotion::{EmotionProfile, JointTarget, Pose};
use crate::error::ActuatorError;

/// Centre angle of both joints.
pub const NEUTRAL_ANGLE: f32 = 90.0;
/// Nominal full-speed value on the degrees scale.
const FULL_SPEED_DEG: f32 = 180.0;
/// Individual moves only hold the throttle for spins faster than this.
const INDIVIDUAL_SPIN_HOLD_DEG: f32 = 30.0;

/// Map a degrees-scale speed onto a −1.0 … 1.0 throttle.
pub fn normalize_throttle(speed_deg: f32) -> f32 {
    (speed_deg / FULL_SPEED_DEG).clamp(-1.0, 1.0)
}

/// Clamp an angle into the servo's 0–180° range.
pub fn clamp_angle(degrees: f32) -> f32 {
    degrees.clamp(0.0, 180.0)
}

/// A discrete (non-oscillating) actuator goal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActuatorTarget {
    pub left_deg: Option<f32>,
    pub right_deg: Option<f32>,
    pub throttle: f32,
}

impl ActuatorTarget {
    /// Build from a pose.  Returns `None` if the pose oscillates.
    pub fn from_pose(pose: &Pose) -> Option<Self> {
        let angle = |t: Option<JointTarget>| match t {
            Some(JointTarget::Angle(deg)) => Ok(Some(clamp_angle(deg))),
            Some(JointTarget::Oscillate) => Err(()),
            None => Ok(None),
        };
        Some(Self {
            left_deg: angle(pose.left).ok()?,
            right_deg: angle(pose.right).ok()?,
            throttle: normalize_throttle(pose.spin),
        })
    }

    pub fn neutral() -> Self {
        Self {
            left_deg: Some(NEUTRAL_ANGLE),
            right_deg: Some(NEUTRAL_ANGLE),
            throttle: 0.0,
        }
    }

    /// Both joints specified.
    pub fn is_complete(&self) -> bool {
        self.left_deg.is_some() && self.right_deg.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionMode {
    Synchronized,
    Oscillation,
    Individual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionOutcome {
    /// The move ran and the joints returned to neutral.
    Completed(MotionMode),
    /// The profile defines no motion.
    Skipped,
    /// No servo bus is attached.
    Disabled,
    /// Another motion still owned the bus.
    Busy,
    /// A servo write failed; the coordinator still attempted neutral.
    Faulted(ActuatorError),
}

/// Fixed timing constants shared by every profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionTiming {
    pub settle: Duration,
    pub oscillation: Duration,
    pub oscillation_step: Duration,
    pub amplitude_deg: f32,
    pub neutral_settle: Duration,
}

impl MotionTiming {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            settle: Duration::from_millis(config.settle_ms),
            oscillation: Duration::from_millis(config.oscillation_ms),
            oscillation_step: Duration::from_millis(config.oscillation_step_ms),
            amplitude_deg: config.oscillation_amplitude_deg,
            neutral_settle: Duration::from_millis(config.neutral_settle_ms),
        }
    }
}

impl Default for MotionTiming {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

pub struct ActuatorCoordinator<S> {
    bus: Option<S>,
    clock: Arc<dyn Clock>,
    timing: MotionTiming,
}

impl<S: ServoBus> ActuatorCoordinator<S> {
    /// `bus = None` builds a coordinator whose every call is a logged no-op.
    pub fn new(bus: Option<S>, clock: Arc<dyn Clock>, timing: MotionTiming) -> Self {
        if bus.is_none() {
            warn!("ACT | servo bus absent, motion disabled");
        }
        Self { bus, clock, timing }
    }

    pub fn is_available(&self) -> bool {
        self.bus.is_some()
    }

    pub fn timing(&self) -> &MotionTiming {
        &self.timing
    }

    /// Run the profile's motion, then return to neutral.
    pub fn move_to(&mut self, profile: &EmotionProfile) -> MotionOutcome {
        if self.bus.is_none() {
            debug!("ACT | emotion={} skipped, no servo bus", profile.name);
            return MotionOutcome::Disabled;
        }
        let Some(pose) = profile.motion else {
            debug!("ACT | emotion={} has no motion", profile.name);
            return MotionOutcome::Skipped;
        };

        let (mode, result) = match ActuatorTarget::from_pose(&pose) {
            None => (MotionMode::Oscillation, self.oscillate(normalize_throttle(pose.spin))),
            Some(target) if target.is_complete() => {
                (MotionMode::Synchronized, self.synchronized(&target))
            }
            Some(target) => (MotionMode::Individual, self.individual(&target, pose.spin)),
        };
        info!("ACT | emotion={} mode={:?}", profile.name, mode);

        let neutral = self.neutral();
        match result.and(neutral) {
            Ok(()) => MotionOutcome::Completed(mode),
            Err(e) => {
                warn!("ACT | emotion={} fault: {}", profile.name, e);
                MotionOutcome::Faulted(e)
            }
        }
    }

    /// Both joints to centre, throttle to zero, then settle.
    pub fn neutral(&mut self) -> Result<(), ActuatorError> {
        let result = self.apply(&ActuatorTarget::neutral());
        self.clock.sleep(self.timing.neutral_settle);
        result
    }

    /// Neutral pose followed by de-energising every channel.
    pub fn park(&mut self) -> Result<(), ActuatorError> {
        let neutral = self.neutral();
        let released = match self.bus.as_mut() {
            Some(bus) => bus.release(),
            None => Ok(()),
        };
        neutral.and(released)
    }

    /// All writes for one control step, no delays in between.
    fn apply(&mut self, target: &ActuatorTarget) -> Result<(), ActuatorError> {
        let Some(bus) = self.bus.as_mut() else {
            return Err(ActuatorError::Unavailable);
        };
        bus.set_throttle(target.throttle)?;
        if let Some(deg) = target.left_deg {
            bus.set_angle(Joint::Left, deg)?;
        }
        if let Some(deg) = target.right_deg {
            bus.set_angle(Joint::Right, deg)?;
        }
        Ok(())
    }

    fn set_throttle(&mut self, throttle: f32) -> Result<(), ActuatorError> {
        self.bus
            .as_mut()
            .ok_or(ActuatorError::Unavailable)?
            .set_throttle(throttle)
    }

    fn set_angle(&mut self, joint: Joint, degrees: f32) -> Result<(), ActuatorError> {
        self.bus
            .as_mut()
            .ok_or(ActuatorError::Unavailable)?
            .set_angle(joint, degrees)
    }

    fn synchronized(&mut self, target: &ActuatorTarget) -> Result<(), ActuatorError> {
        self.apply(target)?;
        self.clock.sleep(self.timing.settle);
        self.set_throttle(0.0)
    }

    fn oscillate(&mut self, throttle: f32) -> Result<(), ActuatorError> {
        let amplitude = self.timing.amplitude_deg;
        let high = clamp_angle(NEUTRAL_ANGLE + amplitude);
        let low = clamp_angle(NEUTRAL_ANGLE - amplitude);

        self.set_throttle(throttle)?;
        let deadline = self.clock.now() + self.timing.oscillation;
        let mut up = true;
        while self.clock.now() < deadline {
            let angle = if up { high } else { low };
            self.set_angle(Joint::Left, angle)?;
            self.set_angle(Joint::Right, angle)?;
            self.clock.sleep(self.timing.oscillation_step);
            up = !up;
        }
        self.set_throttle(0.0)
    }

    fn individual(&mut self, target: &ActuatorTarget, spin_deg: f32) -> Result<(), ActuatorError> {
        self.set_throttle(target.throttle)?;
        if spin_deg.abs() > INDIVIDUAL_SPIN_HOLD_DEG {
            self.clock.sleep(self.timing.settle);
            self.set_throttle(0.0)?;
        }
        for (joint, angle) in [(Joint::Left, target.left_deg), (Joint::Right, target.right_deg)] {
            if let Some(deg) = angle {
                self.set_angle(joint, deg)?;
                self.clock.sleep(self.timing.settle);
            }
        }
        Ok(())
    }
}
