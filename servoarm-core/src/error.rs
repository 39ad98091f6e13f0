//! Motion and registry errors

use core::fmt;

/// Errors reported by the servo registry and the motion steppers
///
/// `E` is the error type of the underlying [`PwmOutput`](crate::traits::PwmOutput).
/// Out-of-range angles are never an error: they are clamped to the
/// servo's limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionError<E> {
    /// The PWM output failed; the servo stays at its last applied angle
    Pwm(E),
    /// Slot index is outside the registry
    InvalidSlot(usize),
    /// Slot has not been initialized
    SlotNotInitialized(usize),
    /// Soft limits are outside 0-180° or inverted
    InvalidLimits {
        /// Slot being initialized
        slot: usize,
        /// Requested lower limit
        min_deg: i32,
        /// Requested upper limit
        max_deg: i32,
    },
    /// Channel index past the last individually addressable output
    InvalidChannel {
        /// Slot being initialized
        slot: usize,
        /// Requested channel
        channel: u8,
    },
    /// Calibration range inverted or past the 12-bit counter
    InvalidCalibration {
        /// Slot being initialized
        slot: usize,
        /// Pulse length at 0°
        pwm_min: u16,
        /// Pulse length at 180°
        pwm_max: u16,
    },
    /// The same slot appears twice in one coordinated move
    DuplicateSlot(usize),
}

impl<E> MotionError<E> {
    /// Check if this error came from the hardware
    pub fn is_hardware(&self) -> bool {
        matches!(self, Self::Pwm(_))
    }
}

impl<E: fmt::Display> fmt::Display for MotionError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pwm(e) => write!(f, "pwm output failed: {}", e),
            Self::InvalidSlot(slot) => write!(f, "invalid servo slot {}", slot),
            Self::SlotNotInitialized(slot) => write!(f, "servo slot {} is not initialized", slot),
            Self::InvalidLimits {
                slot,
                min_deg,
                max_deg,
            } => write!(
                f,
                "servo slot {}: invalid limits [{}, {}]",
                slot, min_deg, max_deg
            ),
            Self::InvalidChannel { slot, channel } => {
                write!(f, "servo slot {}: channel {} out of range", slot, channel)
            }
            Self::InvalidCalibration {
                slot,
                pwm_min,
                pwm_max,
            } => write!(
                f,
                "servo slot {}: invalid calibration [{}, {}]",
                slot, pwm_min, pwm_max
            ),
            Self::DuplicateSlot(slot) => write!(f, "servo slot {} listed twice in one move", slot),
        }
    }
}
