//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock adapters.  All tests run on the host with no real
//! hardware and no wall-clock waits beyond a few polling intervals.

mod engine_tests;
mod mock_hw;
mod motion_tests;
mod sensor_tests;
