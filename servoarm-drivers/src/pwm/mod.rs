//! PWM expander drivers

pub mod pca9685;

pub use pca9685::{DutyCycle, Pca9685, Pca9685Error};
