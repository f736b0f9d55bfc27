//! Unified error types for the Beemo core.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! engine's error handling uniform.  All variants are `Copy` so they can be
//! passed across the actuator thread boundary and stored in outcomes
//! without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible hardware-facing operation funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The display could not be initialised or written.
    Display(DisplayError),
    /// A servo command failed.
    Actuator(ActuatorError),
    /// A sensor input could not be configured or read.
    Sensor(SensorError),
    /// Animation assets are missing or unreadable.
    Asset(AssetError),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Display(e) => write!(f, "display: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Asset(e) => write!(f, "asset: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Display errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayError {
    /// Writing a frame buffer to the device failed.
    WriteFailed,
    /// The frame dimensions do not match the panel.
    SizeMismatch,
}

impl fmt::Display for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WriteFailed => write!(f, "frame write failed"),
            Self::SizeMismatch => write!(f, "frame size does not match panel"),
        }
    }
}

impl From<DisplayError> for Error {
    fn from(e: DisplayError) -> Self {
        Self::Display(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// PWM duty-cycle write failed.
    PwmWriteFailed,
    /// The servo controller is not present.
    Unavailable,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PwmWriteFailed => write!(f, "PWM write failed"),
            Self::Unavailable => write!(f, "servo controller unavailable"),
        }
    }
}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The requested pin is claimed by the display or servo bus.
    PinReserved(u8),
    /// Two channels were configured on the same pin.
    DuplicatePin(u8),
    /// GPIO read returned an error.
    GpioReadFailed(u8),
    /// Edge-triggered interrupts are not available for this pin.
    InterruptUnavailable(u8),
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PinReserved(pin) => write!(f, "GPIO {pin} is reserved"),
            Self::DuplicatePin(pin) => write!(f, "GPIO {pin} is used by more than one sensor"),
            Self::GpioReadFailed(pin) => write!(f, "GPIO {pin} read failed"),
            Self::InterruptUnavailable(pin) => {
                write!(f, "edge detection unavailable on GPIO {pin}")
            }
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Asset errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetError {
    /// The emotion's frame directory does not exist.
    MissingDirectory,
    /// The directory exists but holds no `frame<N>.png` files.
    NoFrames,
    /// A frame file could not be decoded.
    DecodeFailed,
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingDirectory => write!(f, "frame directory missing"),
            Self::NoFrames => write!(f, "no frames found"),
            Self::DecodeFailed => write!(f, "frame decode failed"),
        }
    }
}

impl From<AssetError> for Error {
    fn from(e: AssetError) -> Self {
        Self::Asset(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
