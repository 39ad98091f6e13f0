//! Servoarm Hardware Abstraction Layer
//!
//! This crate defines the bus-level traits the PWM driver is written
//! against. Platform crates (Linux `/dev/i2c-N`, test doubles, a future
//! microcontroller port) implement them so the driver and motion code stay
//! platform independent.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  servoarm-core (registry, steppers)     │
//! └─────────────────────────────────────────┘
//!                     │ PwmOutput
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  servoarm-drivers (PCA9685)             │
//! └─────────────────────────────────────────┘
//!                     │ I2cBus
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  servoarm-hal (this crate - traits)     │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!             ┌───────────────┐
//!             │ servoarm-hal- │
//!             │     linux     │
//!             └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`i2c::I2cBus`] - I2C bus operations
//! - [`DelayNs`] - blocking delays, re-exported from `embedded-hal`

#![no_std]
#![deny(unsafe_code)]

pub mod i2c;

// Re-export key traits at crate root for convenience
pub use embedded_hal::delay::DelayNs;
pub use i2c::{I2cBus, SevenBitAddress};
