//! Engine configuration parameters
//!
//! All tunable parameters for the Beemo core.  Defaults match the shipped
//! head board; a JSON file can override any subset of fields.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::pins;

/// Core engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // --- Display ---
    /// Panel width in pixels
    pub display_width: u32,
    /// Panel height in pixels
    pub display_height: u32,
    /// Animation playback rate (frames per second)
    pub fps: u32,
    /// How long a text message stays up (milliseconds)
    pub text_hold_ms: u64,

    // --- Assets ---
    /// Directory holding one sub-directory of `frame<N>.png` files per emotion
    pub asset_root: PathBuf,

    // --- Trigger discipline ---
    /// Minimum time between successful triggers (milliseconds)
    pub cooldown_ms: u64,
    /// Deadline for the actuator thread after playback (milliseconds)
    pub actuator_join_timeout_ms: u64,
    /// Retry once against the idle emotion when an emotion has no frames
    pub fallback_to_idle: bool,

    // --- Motion ---
    /// Hold time for a synchronized / individual move (milliseconds)
    pub settle_ms: u64,
    /// Total oscillation time (milliseconds)
    pub oscillation_ms: u64,
    /// Half-period of one oscillation sweep (milliseconds)
    pub oscillation_step_ms: u64,
    /// Oscillation amplitude either side of centre (degrees)
    pub oscillation_amplitude_deg: f32,
    /// Wait after returning to neutral (milliseconds)
    pub neutral_settle_ms: u64,
    /// Servo PWM frame rate (Hz)
    pub servo_pwm_freq_hz: u32,

    // --- Sensors ---
    pub touch_gpio: u8,
    pub touch_debounce_ms: u64,
    pub vibration_gpio: u8,
    pub vibration_debounce_ms: u64,
    /// Polling-mode sample interval (milliseconds)
    pub poll_interval_ms: u64,

    // --- Event pipeline ---
    /// Maximum pending sensor events
    pub queue_capacity: usize,
    /// Consumer dequeue wait before re-checking the running flag (milliseconds)
    pub consumer_wait_ms: u64,
    /// Pause between a sensor animation and the forced return to neutral (milliseconds)
    pub return_to_neutral_delay_ms: u64,
    /// Play a transition-graph continuation after this much idle time (seconds)
    pub idle_interval_secs: Option<u32>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            // Display
            display_width: 128,
            display_height: 64,
            fps: 15,
            text_hold_ms: 2000,

            // Assets
            asset_root: PathBuf::from("/home/pi/beemo/robot/emotions"),

            // Trigger discipline
            cooldown_ms: 2000,
            actuator_join_timeout_ms: 5000,
            fallback_to_idle: true,

            // Motion
            settle_ms: 1000,
            oscillation_ms: 2000,
            oscillation_step_ms: 300,
            oscillation_amplitude_deg: 30.0,
            neutral_settle_ms: 500,
            servo_pwm_freq_hz: pins::SERVO_PWM_FREQ_HZ,

            // Sensors
            touch_gpio: pins::TOUCH_SENSOR_GPIO,
            touch_debounce_ms: 300,
            vibration_gpio: pins::VIBRATION_SENSOR_GPIO,
            vibration_debounce_ms: 500,
            poll_interval_ms: 50, // 20 Hz

            // Event pipeline
            queue_capacity: 16,
            consumer_wait_ms: 1000,
            return_to_neutral_delay_ms: 1000,
            idle_interval_secs: None,
        }
    }
}

impl EngineConfig {
    /// Load a JSON config file.  Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|_| ConfigError::NotFound)?;
        let config: Self = serde_json::from_str(&text).map_err(|_| ConfigError::Corrupted)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject out-of-range values instead of silently clamping them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.display_width == 0 || self.display_height == 0 {
            return Err(ConfigError::ValidationFailed("display size must be non-zero"));
        }
        if self.display_width % 8 != 0 || self.display_height % 8 != 0 {
            return Err(ConfigError::ValidationFailed(
                "display size must be a multiple of 8 pixels",
            ));
        }
        if !(1..=60).contains(&self.fps) {
            return Err(ConfigError::ValidationFailed("fps must be 1–60"));
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::ValidationFailed("queue_capacity must be non-zero"));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("poll_interval_ms must be non-zero"));
        }
        if self.oscillation_step_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "oscillation_step_ms must be non-zero",
            ));
        }
        if !(0.0..=90.0).contains(&self.oscillation_amplitude_deg) {
            return Err(ConfigError::ValidationFailed(
                "oscillation_amplitude_deg must be 0–90",
            ));
        }
        if !(40..=200).contains(&self.servo_pwm_freq_hz) {
            return Err(ConfigError::ValidationFailed(
                "servo_pwm_freq_hz must be 40–200",
            ));
        }
        if self.touch_gpio == self.vibration_gpio {
            return Err(ConfigError::ValidationFailed(
                "touch and vibration sensors must use different pins",
            ));
        }
        if pins::is_reserved(self.touch_gpio) || pins::is_reserved(self.vibration_gpio) {
            return Err(ConfigError::ValidationFailed(
                "sensor pin collides with the display or I2C bus",
            ));
        }
        Ok(())
    }

    pub fn frame_delay(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.fps))
    }

    pub fn text_hold(&self) -> Duration {
        Duration::from_millis(self.text_hold_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn actuator_join_timeout(&self) -> Duration {
        Duration::from_millis(self.actuator_join_timeout_ms)
    }
}

/// Errors from loading or validating an [`EngineConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The config file could not be read.
    NotFound,
    /// The file is not valid JSON for this schema.
    Corrupted,
    /// A field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for crate::error::Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::NotFound => Self::Config("config not found"),
            ConfigError::Corrupted => Self::Config("config corrupted"),
            ConfigError::ValidationFailed(msg) => Self::Config(msg),
        }
    }
}
