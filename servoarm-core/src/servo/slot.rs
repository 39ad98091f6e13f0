//! Calibrated servo record
//!
//! One record per registry slot: which channel it drives, how angles map to
//! pulse lengths, where it is allowed to go, and where it is now.

use crate::config::{ServoCalibration, ServoConfig};
use crate::traits::Channel;

/// A calibrated servo and its current angle
///
/// The current angle is always inside `[min_deg, max_deg]`. It can only be
/// changed through [`ServoRegistry`](super::ServoRegistry), which commands
/// the hardware in the same call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Servo {
    channel: Channel,
    calibration: ServoCalibration,
    min_deg: i32,
    max_deg: i32,
    home_deg: i32,
    position_deg: i32,
}

impl Servo {
    /// Build a servo record from validated limits
    ///
    /// The home angle is clamped into the limits and becomes the current
    /// angle.
    pub(crate) fn from_config(config: &ServoConfig) -> Self {
        let home_deg = config.home_deg.clamp(config.min_deg, config.max_deg);
        Self {
            channel: Channel::new(config.channel),
            calibration: config.calibration,
            min_deg: config.min_deg,
            max_deg: config.max_deg,
            home_deg,
            position_deg: home_deg,
        }
    }

    /// PWM channel driving this servo
    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Angle-to-duty calibration
    pub fn calibration(&self) -> ServoCalibration {
        self.calibration
    }

    /// Lower soft limit
    pub fn min_deg(&self) -> i32 {
        self.min_deg
    }

    /// Upper soft limit
    pub fn max_deg(&self) -> i32 {
        self.max_deg
    }

    /// Home angle
    pub fn home_deg(&self) -> i32 {
        self.home_deg
    }

    /// Current angle
    pub fn position_deg(&self) -> i32 {
        self.position_deg
    }

    /// Clamp an angle into the soft limits
    pub fn clamp(&self, angle_deg: i32) -> i32 {
        angle_deg.clamp(self.min_deg, self.max_deg)
    }

    /// Pulse length for an angle
    pub fn angle_to_duty(&self, angle_deg: i32) -> i32 {
        self.calibration.angle_to_duty(angle_deg)
    }

    pub(crate) fn set_position(&mut self, angle_deg: i32) {
        self.position_deg = angle_deg;
    }
}
