//! Servo calibration data types
//!
//! Maps an angle in degrees onto a pulse length in PWM ticks.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Angular range covered by a calibration (0° to 180°)
pub const ANGLE_RANGE_DEG: i32 = 180;

/// Default pulse length at 0°, in ticks (MG996R at 50 Hz)
pub const DEFAULT_PWM_MIN: u16 = 80;

/// Default pulse length at 180°, in ticks (MG996R at 50 Hz)
pub const DEFAULT_PWM_MAX: u16 = 580;

/// Angle-to-duty calibration for a single servo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ServoCalibration {
    /// Pulse length at 0°
    pub pwm_min: u16,
    /// Pulse length at 180°
    pub pwm_max: u16,
}

impl Default for ServoCalibration {
    fn default() -> Self {
        Self::MG996R
    }
}

impl ServoCalibration {
    /// Calibration shared by every joint of the reference arm
    pub const MG996R: Self = Self {
        pwm_min: DEFAULT_PWM_MIN,
        pwm_max: DEFAULT_PWM_MAX,
    };

    /// Create a calibration from explicit pulse lengths
    pub const fn new(pwm_min: u16, pwm_max: u16) -> Self {
        Self { pwm_min, pwm_max }
    }

    /// Check that the range is ordered and fits the 12-bit counter
    pub const fn is_valid(&self) -> bool {
        self.pwm_min <= self.pwm_max && self.pwm_max < 4096
    }

    /// Convert an angle to a pulse length
    ///
    /// Linear interpolation between `pwm_min` and `pwm_max`, truncated
    /// toward zero. Angles outside 0-180° map to the nearest end.
    pub const fn angle_to_duty(&self, angle_deg: i32) -> i32 {
        let angle_deg = if angle_deg < 0 {
            0
        } else if angle_deg > ANGLE_RANGE_DEG {
            ANGLE_RANGE_DEG
        } else {
            angle_deg
        };
        let min = self.pwm_min as i32;
        let max = self.pwm_max as i32;
        min + (max - min) * angle_deg / ANGLE_RANGE_DEG
    }
}
