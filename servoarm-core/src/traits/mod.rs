//! Hardware abstraction traits
//!
//! These traits define the interface between the motion logic
//! and hardware-specific implementations.

pub mod pwm;

pub use pwm::{Channel, PwmOutput, CHANNEL_COUNT, PWM_PERIOD_TICKS};
