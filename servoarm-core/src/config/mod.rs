//! Configuration types
//!
//! Board-agnostic configuration supplied at startup. Nothing here is
//! persisted; the host binary loads it from TOML each run.

pub mod calibration;
pub mod hardware;

pub use calibration::*;
pub use hardware::*;
