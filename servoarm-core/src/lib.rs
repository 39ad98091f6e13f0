//! Board-agnostic core logic for the servo arm
//!
//! This crate contains everything between "move these joints" and "set this
//! PWM channel to N ticks":
//!
//! - The [`PwmOutput`] trait the device driver implements
//! - The servo registry (calibration, soft limits, current angles)
//! - Single-axis and synchronized multi-axis steppers
//! - Scripted sequences
//! - Configuration type definitions

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod motion;
pub mod servo;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{ArmConfig, ServoCalibration, ServoConfig, MAX_SERVOS};
pub use error::MotionError;
pub use motion::{Motion, MotionTarget, Pacing, SequenceStep, DEMO_SEQUENCE};
pub use servo::{Servo, ServoRegistry};
pub use traits::{Channel, PwmOutput};
