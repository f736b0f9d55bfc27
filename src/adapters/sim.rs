//! Simulation adapters for host runs and tests.
//!
//! - [`SimGpio`]: shared pin levels (pull-up, so idle high), optional
//!   edge detection, and [`SimInputPin`] handles implementing
//!   `embedded_hal::digital::InputPin`.
//! - [`SimPwmChannel`]: a 12-bit `SetDutyCycle` channel whose duty can be
//!   read back.
//! - [`SimDisplay`]: a [`DisplayPort`] that counts frames and keeps the
//!   last one.
//!
//! Every type is a cheap clonable handle onto shared state, so a test can
//! keep one handle while the engine owns another.

use std::collections::{HashMap, HashSet};
use std::convert::Infallible;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use embedded_hal::digital::{self, ErrorKind, ErrorType, InputPin};
use embedded_hal::pwm::{self, SetDutyCycle};
use log::debug;

use crate::app::ports::{DisplayPort, EdgeCallback, EdgeDetector};
use crate::error::{DisplayError, SensorError};
use crate::frames::Frame;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── GPIO ──────────────────────────────────────────────────────

#[derive(Default)]
struct GpioState {
    /// Pins never written read high (pull-up).
    levels: HashMap<u8, bool>,
    callbacks: HashMap<u8, EdgeCallback>,
    no_interrupts: bool,
    refused: HashSet<u8>,
    failing: HashSet<u8>,
}

#[derive(Clone, Default)]
pub struct SimGpio {
    state: Arc<Mutex<GpioState>>,
}

impl SimGpio {
    /// GPIO bank with edge detection on every pin.
    pub fn new() -> Self {
        Self::default()
    }

    /// GPIO bank that refuses every edge registration.
    pub fn without_interrupts() -> Self {
        let gpio = Self::default();
        lock(&gpio.state).no_interrupts = true;
        gpio
    }

    /// Refuse edge registration on one pin only.
    pub fn refuse_interrupts_on(&self, pin: u8) {
        lock(&self.state).refused.insert(pin);
    }

    /// Make reads of `pin` fail.
    pub fn fail_reads_on(&self, pin: u8) {
        lock(&self.state).failing.insert(pin);
    }

    pub fn input(&self, pin: u8) -> SimInputPin {
        SimInputPin {
            gpio: self.clone(),
            pin,
        }
    }

    pub fn level(&self, pin: u8) -> bool {
        lock(&self.state).levels.get(&pin).copied().unwrap_or(true)
    }

    /// Drive `pin`; a high → low change fires its edge callback.
    pub fn set_level(&self, pin: u8, high: bool) {
        let callback = {
            let mut state = lock(&self.state);
            let was_high = state.levels.insert(pin, high).unwrap_or(true);
            if was_high && !high {
                state.callbacks.remove(&pin)
            } else {
                None
            }
        };
        // Run outside the lock so the callback may touch the bank.
        if let Some(mut cb) = callback {
            cb();
            lock(&self.state).callbacks.entry(pin).or_insert(cb);
        }
    }

    /// One press-and-release.
    pub fn pulse(&self, pin: u8) {
        self.set_level(pin, false);
        self.set_level(pin, true);
    }

    pub fn is_watched(&self, pin: u8) -> bool {
        lock(&self.state).callbacks.contains_key(&pin)
    }
}

impl EdgeDetector for SimGpio {
    fn watch_falling(
        &mut self,
        pin: u8,
        _debounce: Duration,
        callback: EdgeCallback,
    ) -> Result<(), SensorError> {
        let mut state = lock(&self.state);
        if state.no_interrupts || state.refused.contains(&pin) {
            return Err(SensorError::InterruptUnavailable(pin));
        }
        state.callbacks.insert(pin, callback);
        debug!("sim gpio {} watching falling edges", pin);
        Ok(())
    }

    fn unwatch(&mut self, pin: u8) {
        lock(&self.state).callbacks.remove(&pin);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimPinError(pub u8);

impl digital::Error for SimPinError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

#[derive(Clone)]
pub struct SimInputPin {
    gpio: SimGpio,
    pin: u8,
}

impl ErrorType for SimInputPin {
    type Error = SimPinError;
}

impl InputPin for SimInputPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        if lock(&self.gpio.state).failing.contains(&self.pin) {
            return Err(SimPinError(self.pin));
        }
        Ok(self.gpio.level(self.pin))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

// ── PWM ───────────────────────────────────────────────────────

/// 12-bit resolution, as on a PCA9685.
const SIM_PWM_MAX_DUTY: u16 = 4095;

#[derive(Clone, Default)]
pub struct SimPwmChannel {
    duty: Arc<AtomicU16>,
}

impl SimPwmChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn duty(&self) -> u16 {
        self.duty.load(Ordering::Relaxed)
    }
}

impl pwm::ErrorType for SimPwmChannel {
    type Error = Infallible;
}

impl SetDutyCycle for SimPwmChannel {
    fn max_duty_cycle(&self) -> u16 {
        SIM_PWM_MAX_DUTY
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        self.duty.store(duty.min(SIM_PWM_MAX_DUTY), Ordering::Relaxed);
        Ok(())
    }
}

// ── Display ───────────────────────────────────────────────────

#[derive(Default)]
struct DisplayState {
    shown: usize,
    clears: usize,
    last: Option<Frame>,
    fail_writes: bool,
}

#[derive(Clone)]
pub struct SimDisplay {
    width: u32,
    height: u32,
    state: Arc<Mutex<DisplayState>>,
}

impl SimDisplay {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            state: Arc::new(Mutex::new(DisplayState::default())),
        }
    }

    /// Frames successfully shown.
    pub fn frames_shown(&self) -> usize {
        lock(&self.state).shown
    }

    pub fn clears(&self) -> usize {
        lock(&self.state).clears
    }

    pub fn last_frame(&self) -> Option<Frame> {
        lock(&self.state).last.clone()
    }

    /// Make subsequent writes fail with [`DisplayError::WriteFailed`].
    pub fn set_fail_writes(&self, fail: bool) {
        lock(&self.state).fail_writes = fail;
    }
}

impl DisplayPort for SimDisplay {
    fn show(&mut self, frame: &Frame) -> Result<(), DisplayError> {
        if (frame.width(), frame.height()) != (self.width, self.height) {
            return Err(DisplayError::SizeMismatch);
        }
        let mut state = lock(&self.state);
        if state.fail_writes {
            return Err(DisplayError::WriteFailed);
        }
        state.shown += 1;
        state.last = Some(frame.clone());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        let mut state = lock(&self.state);
        state.clears += 1;
        state.last = None;
        Ok(())
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
