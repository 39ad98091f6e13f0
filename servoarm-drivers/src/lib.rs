//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in servoarm-core, built on the bus traits from servoarm-hal:
//!
//! - PWM expanders (PCA9685)

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod pwm;

pub use pwm::{Pca9685, Pca9685Error};
