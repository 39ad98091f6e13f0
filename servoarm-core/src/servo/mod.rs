//! Servo registry
//!
//! Fixed arena of calibrated servos, indexed by slot.

pub mod registry;
pub mod slot;

pub use registry::ServoRegistry;
pub use slot::Servo;
