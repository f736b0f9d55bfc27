//! GPIO / peripheral pin assignments for the Beemo head board (BCM numbering).
//!
//! Single source of truth: the sensor monitor, the servo bus and the
//! composition root reference this module rather than hard-coding numbers.

// ---------------------------------------------------------------------------
// Sensors: digital (active-low, pull-up)
// ---------------------------------------------------------------------------

/// Capacitive touch pad. Falling edge = touch.
pub const TOUCH_SENSOR_GPIO: u8 = 4;
/// SW-420 vibration switch. Falling edge = knock / shake.
pub const VIBRATION_SENSOR_GPIO: u8 = 22;

// ---------------------------------------------------------------------------
// OLED (SSD1309 over SPI0)
// ---------------------------------------------------------------------------

pub const OLED_SPI_CE0_GPIO: u8 = 8;
pub const OLED_SPI_MISO_GPIO: u8 = 9;
pub const OLED_SPI_MOSI_GPIO: u8 = 10;
pub const OLED_SPI_SCLK_GPIO: u8 = 11;
/// Data/command select.
pub const OLED_DC_GPIO: u8 = 25;
pub const OLED_RST_GPIO: u8 = 27;

// ---------------------------------------------------------------------------
// I²C bus (PCA9685 servo controller)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: u8 = 2;
pub const I2C_SCL_GPIO: u8 = 3;

/// Pins that sensor inputs must never claim.
pub const RESERVED_GPIOS: [u8; 8] = [
    OLED_SPI_CE0_GPIO,
    OLED_SPI_MISO_GPIO,
    OLED_SPI_MOSI_GPIO,
    OLED_SPI_SCLK_GPIO,
    OLED_DC_GPIO,
    OLED_RST_GPIO,
    I2C_SDA_GPIO,
    I2C_SCL_GPIO,
];

/// True if `pin` belongs to the display or servo bus.
pub fn is_reserved(pin: u8) -> bool {
    RESERVED_GPIOS.contains(&pin)
}

// ---------------------------------------------------------------------------
// PCA9685 servo channels
// ---------------------------------------------------------------------------

/// Continuous-rotation servo (body spin).
pub const SERVO_CONTINUOUS_CHANNEL: u8 = 0;
/// Standard servo, left arm.
pub const SERVO_LEFT_CHANNEL: u8 = 1;
/// Standard servo, right arm.
pub const SERVO_RIGHT_CHANNEL: u8 = 2;

/// Servo PWM frame rate (Hz).
pub const SERVO_PWM_FREQ_HZ: u32 = 50;
