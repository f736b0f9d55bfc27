//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements                    | Connects to                 |
//! |------------|-------------------------------|-----------------------------|
//! | `sim`      | EdgeDetector, InputPin        | Simulated GPIO bank         |
//! |            | SetDutyCycle                  | Simulated PWM channels      |
//! |            | DisplayPort                   | In-memory panel             |
//! | `time`     | Clock                         | `Instant` / virtual time    |
//! | `log_sink` | PersistencePort               | `log` output                |
//! | `journal`  | PersistencePort               | Memory, JSON lines, worker thread |

pub mod journal;
pub mod log_sink;
pub mod sim;
pub mod time;
