//! Linux HAL for the servoarm controller
//!
//! This crate implements the `servoarm-hal` traits on top of the Linux
//! i2c-dev interface (`/dev/i2c-N`) using `linux-embedded-hal`:
//!
//! - [`LinuxI2c`] - [`I2cBus`] over an i2c-dev character device
//! - [`Delay`] - blocking delay backed by `std::thread::sleep`
//!
//! # Usage
//!
//! ```ignore
//! let bus = servoarm_hal_linux::open("/dev/i2c-1")?;
//! let mut delay = servoarm_hal_linux::Delay;
//! let pca = Pca9685::open(bus, 0x40, 50, &mut delay)?;
//! ```

#![deny(unsafe_code)]

pub mod i2c;

pub use i2c::{open, LinuxI2c, OpenError};
pub use linux_embedded_hal::Delay;

// Re-export shared traits from servoarm-hal
pub use servoarm_hal::{DelayNs, I2cBus};
