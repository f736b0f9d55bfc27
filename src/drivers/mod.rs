//! Actuator and panel drivers.
//!
//! | Driver       | Provides                                   |
//! |--------------|--------------------------------------------|
//! | `actuators`  | Emotion → servo motion, always ending at neutral |
//! | `servo`      | `ServoBus` over three PWM duty-cycle channels |
//! | `display`    | `DisplayPort` writing SSD1309 page buffers |

pub mod actuators;
pub mod display;
pub mod servo;
