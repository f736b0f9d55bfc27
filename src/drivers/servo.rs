//! PWM servo bus over three `embedded-hal` duty-cycle channels.
//!
//! ## Pulse mapping
//!
//! | Servo       | Input           | Pulse width          |
//! |-------------|-----------------|----------------------|
//! | Angular     | 0 … 180°        | 750 … 2250 µs        |
//! | Continuous  | −1.0 … 1.0      | 750 … 2250 µs (1500 = stop) |
//!
//! The duty cycle is the pulse width as a fraction of the PWM period
//! (20 ms at 50 Hz).  `release()` drives every channel to 0 % so the
//! servos go limp.

use embedded_hal::pwm::SetDutyCycle;
use log::debug;

use crate::app::ports::{Joint, ServoBus};
use crate::error::ActuatorError;

const MIN_PULSE_US: u32 = 750;
const MAX_PULSE_US: u32 = 2250;
const CENTER_PULSE_US: u32 = (MIN_PULSE_US + MAX_PULSE_US) / 2;

/// Pulse width for an angle, clamped to 0–180°.
pub fn angle_pulse_us(degrees: f32) -> u32 {
    let span = (MAX_PULSE_US - MIN_PULSE_US) as f32;
    MIN_PULSE_US + (degrees.clamp(0.0, 180.0) / 180.0 * span).round() as u32
}

/// Pulse width for a continuous-rotation throttle, clamped to ±1.
pub fn throttle_pulse_us(throttle: f32) -> u32 {
    let half_span = (MAX_PULSE_US - CENTER_PULSE_US) as f32;
    let offset = (throttle.clamp(-1.0, 1.0) * half_span).round() as i32;
    (CENTER_PULSE_US as i32 + offset) as u32
}

pub struct PwmServoBus<L, R, C> {
    left: L,
    right: R,
    continuous: C,
    period_us: u32,
}

impl<L, R, C> PwmServoBus<L, R, C>
where
    L: SetDutyCycle,
    R: SetDutyCycle,
    C: SetDutyCycle,
{
    pub fn new(left: L, right: R, continuous: C, freq_hz: u32) -> Self {
        Self {
            left,
            right,
            continuous,
            period_us: 1_000_000 / freq_hz.max(1),
        }
    }

    fn duty_for<P: SetDutyCycle>(channel: &P, pulse_us: u32, period_us: u32) -> u16 {
        let max = u32::from(channel.max_duty_cycle());
        (pulse_us.min(period_us) * max / period_us) as u16
    }

    fn write<P: SetDutyCycle>(channel: &mut P, pulse_us: u32, period_us: u32) -> Result<(), ActuatorError> {
        let duty = Self::duty_for(channel, pulse_us, period_us);
        channel
            .set_duty_cycle(duty)
            .map_err(|_| ActuatorError::PwmWriteFailed)
    }
}

impl<L, R, C> ServoBus for PwmServoBus<L, R, C>
where
    L: SetDutyCycle,
    R: SetDutyCycle,
    C: SetDutyCycle,
{
    fn set_angle(&mut self, joint: Joint, degrees: f32) -> Result<(), ActuatorError> {
        let pulse = angle_pulse_us(degrees);
        debug!("servo {:?} -> {:.0}° ({} µs)", joint, degrees, pulse);
        match joint {
            Joint::Left => Self::write(&mut self.left, pulse, self.period_us),
            Joint::Right => Self::write(&mut self.right, pulse, self.period_us),
        }
    }

    fn set_throttle(&mut self, throttle: f32) -> Result<(), ActuatorError> {
        let pulse = throttle_pulse_us(throttle);
        Self::write(&mut self.continuous, pulse, self.period_us)
    }

    fn release(&mut self) -> Result<(), ActuatorError> {
        // Attempt every channel even if one fails.
        let left = self.left.set_duty_cycle_fully_off().is_ok();
        let right = self.right.set_duty_cycle_fully_off().is_ok();
        let continuous = self.continuous.set_duty_cycle_fully_off().is_ok();
        if left && right && continuous {
            Ok(())
        } else {
            Err(ActuatorError::PwmWriteFailed)
        }
    }
}
