//! Hardware configuration types
//!
//! These types define the controller address, carrier frequency, and the
//! per-joint channel, home position, and soft limits of the arm.

use core::fmt;

use heapless::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::calibration::{ServoCalibration, ANGLE_RANGE_DEG};
use crate::traits::CHANNEL_COUNT;

/// Number of servo slots on the arm
pub const MAX_SERVOS: usize = 6;

/// Default I2C address of the PWM expander
pub const DEFAULT_I2C_ADDRESS: u8 = 0x40;

/// Default PWM carrier frequency for analog servos
pub const DEFAULT_FREQUENCY_HZ: u16 = 50;

/// Default time budget for one degree of travel at speed 1, in microseconds
pub const DEFAULT_DEGREE_TIME_US: u32 = 2300;

/// Single servo configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ServoConfig {
    /// PWM expander channel (0-15)
    pub channel: u8,
    /// Angle restored by a return-to-home move
    pub home_deg: i32,
    /// Lower soft limit
    pub min_deg: i32,
    /// Upper soft limit
    pub max_deg: i32,
    /// Angle-to-duty calibration
    #[cfg_attr(feature = "serde", serde(default))]
    pub calibration: ServoCalibration,
}

impl ServoConfig {
    /// Create a servo config with the default calibration
    pub const fn new(channel: u8, home_deg: i32, min_deg: i32, max_deg: i32) -> Self {
        Self {
            channel,
            home_deg,
            min_deg,
            max_deg,
            calibration: ServoCalibration::MG996R,
        }
    }

    /// Override the calibration
    pub const fn with_calibration(mut self, calibration: ServoCalibration) -> Self {
        self.calibration = calibration;
        self
    }

    /// Check that the soft limits are ordered and inside 0-180°
    pub const fn limits_valid(&self) -> bool {
        self.min_deg >= 0 && self.min_deg <= self.max_deg && self.max_deg <= ANGLE_RANGE_DEG
    }
}

/// Joints of the reference arm, indexed by slot
///
/// 0: base, + is left (viewed from the back)
/// 1: shoulder, + is down
/// 2: elbow, + is up
/// 3: wrist, + is down
/// 4: wrist rotation, + is right
/// 5: hand, + is close
pub const REFERENCE_SERVOS: [ServoConfig; MAX_SERVOS] = [
    ServoConfig::new(0, 84, 5, 155),
    ServoConfig::new(1, 76, 40, 100),
    ServoConfig::new(2, 130, 57, 135),
    ServoConfig::new(3, 110, 24, 120),
    ServoConfig::new(4, 87, 22, 162),
    ServoConfig::new(5, 100, 70, 115),
];

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Channel index past the last PWM output
    ChannelOutOfRange { slot: usize, channel: u8 },
    /// Two servos share one channel
    DuplicateChannel { slot: usize, channel: u8 },
    /// Soft limits outside 0-180° or inverted
    InvalidLimits { slot: usize },
    /// Calibration range inverted or past the 12-bit counter
    InvalidCalibration { slot: usize },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChannelOutOfRange { slot, channel } => {
                write!(f, "servo {}: channel {} out of range", slot, channel)
            }
            Self::DuplicateChannel { slot, channel } => {
                write!(f, "servo {}: channel {} already in use", slot, channel)
            }
            Self::InvalidLimits { slot } => write!(f, "servo {}: invalid limits", slot),
            Self::InvalidCalibration { slot } => write!(f, "servo {}: invalid calibration", slot),
        }
    }
}

/// Complete arm configuration
///
/// Servos are installed in slot order: `servos[0]` is slot 0.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ArmConfig {
    /// I2C address of the PWM expander
    pub i2c_address: u8,
    /// PWM carrier frequency in Hz (clamped by the driver)
    pub frequency_hz: u16,
    /// Time for one degree of travel at speed 1, in microseconds
    pub degree_time_us: u32,
    /// Servo configurations by slot
    pub servos: Vec<ServoConfig, MAX_SERVOS>,
}

impl Default for ArmConfig {
    fn default() -> Self {
        Self {
            i2c_address: DEFAULT_I2C_ADDRESS,
            frequency_hz: DEFAULT_FREQUENCY_HZ,
            degree_time_us: DEFAULT_DEGREE_TIME_US,
            servos: REFERENCE_SERVOS.iter().copied().collect(),
        }
    }
}

impl ArmConfig {
    /// Create a configuration with no servos
    pub fn empty() -> Self {
        Self {
            servos: Vec::new(),
            ..Self::default()
        }
    }

    /// Find the slot driving a channel
    pub fn find_channel(&self, channel: u8) -> Option<usize> {
        self.servos.iter().position(|s| s.channel == channel)
    }

    /// Validate every servo entry
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (slot, servo) in self.servos.iter().enumerate() {
            if servo.channel >= CHANNEL_COUNT {
                return Err(ConfigError::ChannelOutOfRange {
                    slot,
                    channel: servo.channel,
                });
            }
            if self.find_channel(servo.channel) != Some(slot) {
                return Err(ConfigError::DuplicateChannel {
                    slot,
                    channel: servo.channel,
                });
            }
            if !servo.limits_valid() {
                return Err(ConfigError::InvalidLimits { slot });
            }
            if !servo.calibration.is_valid() {
                return Err(ConfigError::InvalidCalibration { slot });
            }
        }
        Ok(())
    }
}
