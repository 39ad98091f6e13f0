//! I2C bus backend for Linux i2c-dev adapters
//!
//! Every transfer carries the slave address, so one adapter handle can talk
//! to any device on the bus. Failures are surfaced as the underlying
//! `linux-embedded-hal` error, which carries the errno description.

use std::fmt;
use std::path::{Path, PathBuf};

use embedded_hal::i2c::I2c;
use linux_embedded_hal::{I2CError, I2cdev};
use log::{debug, error};

use servoarm_hal::{I2cBus, SevenBitAddress};

/// Error returned when an i2c-dev adapter cannot be opened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenError {
    /// Adapter path that failed to open
    pub path: PathBuf,
    /// Description reported by the kernel interface
    pub reason: String,
}

impl fmt::Display for OpenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "open i2c adapter {} failed: {}",
            self.path.display(),
            self.reason
        )
    }
}

impl std::error::Error for OpenError {}

/// Open an i2c-dev adapter such as `/dev/i2c-1`
pub fn open(path: impl AsRef<Path>) -> Result<LinuxI2c, OpenError> {
    let path = path.as_ref();
    debug!("Opening i2c adapter {}", path.display());

    match I2cdev::new(path) {
        Ok(dev) => Ok(LinuxI2c {
            dev,
            path: path.to_path_buf(),
        }),
        Err(e) => {
            let err = OpenError {
                path: path.to_path_buf(),
                reason: e.to_string(),
            };
            error!("{}", err);
            Err(err)
        }
    }
}

/// I2C master backed by a Linux i2c-dev adapter
pub struct LinuxI2c {
    dev: I2cdev,
    path: PathBuf,
}

impl LinuxI2c {
    /// Path of the adapter this bus was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Debug for LinuxI2c {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinuxI2c").field("path", &self.path).finish()
    }
}

impl I2cBus for LinuxI2c {
    type Error = I2CError;

    fn write(&mut self, address: SevenBitAddress, data: &[u8]) -> Result<(), Self::Error> {
        I2c::write(&mut self.dev, address, data).map_err(|e| {
            error!("i2c write to 0x{:02x} failed: {:?}", address, e);
            e
        })
    }

    fn read(&mut self, address: SevenBitAddress, buf: &mut [u8]) -> Result<(), Self::Error> {
        I2c::read(&mut self.dev, address, buf).map_err(|e| {
            error!("i2c read from 0x{:02x} failed: {:?}", address, e);
            e
        })
    }

    fn write_read(
        &mut self,
        address: SevenBitAddress,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<(), Self::Error> {
        I2c::write_read(&mut self.dev, address, write_data, read_buf).map_err(|e| {
            error!("i2c write_read at 0x{:02x} failed: {:?}", address, e);
            e
        })
    }
}
