//! PWM output trait
//!
//! This is the only capability the servo layer needs from the hardware:
//! "drive channel N with a pulse of this many ticks".

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of individually addressable PWM channels on the expander
pub const CHANNEL_COUNT: u8 = 16;

/// Number of ticks in one PWM period (12-bit counter)
pub const PWM_PERIOD_TICKS: i32 = 4096;

/// A PWM output channel
///
/// Indices 0-15 address a single output. Any index of 16 or above
/// addresses every output at once (broadcast).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Channel(u8);

impl Channel {
    /// Broadcast channel addressing all outputs
    pub const ALL: Self = Self(CHANNEL_COUNT);

    /// Create a channel from its index
    ///
    /// Indices past the last output collapse to [`Channel::ALL`].
    pub const fn new(index: u8) -> Self {
        if index >= CHANNEL_COUNT {
            Self::ALL
        } else {
            Self(index)
        }
    }

    /// Channel index (16 for the broadcast channel)
    pub const fn index(self) -> u8 {
        self.0
    }

    /// Check if this is the broadcast channel
    pub const fn is_all(self) -> bool {
        self.0 >= CHANNEL_COUNT
    }
}

impl From<u8> for Channel {
    fn from(index: u8) -> Self {
        Self::new(index)
    }
}

/// Trait for PWM outputs that can drive a servo
///
/// `length` is the pulse width in ticks out of [`PWM_PERIOD_TICKS`].
/// Implementations treat `length <= 0` as fully off and
/// `length >= PWM_PERIOD_TICKS` as fully on.
pub trait PwmOutput {
    /// Error type for output operations
    type Error;

    /// Drive `channel` with a pulse of `length` ticks
    fn pwm(&mut self, channel: Channel, length: i32) -> Result<(), Self::Error>;
}

impl<T: PwmOutput + ?Sized> PwmOutput for &mut T {
    type Error = T::Error;

    fn pwm(&mut self, channel: Channel, length: i32) -> Result<(), Self::Error> {
        T::pwm(self, channel, length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_new() {
        assert_eq!(Channel::new(0).index(), 0);
        assert_eq!(Channel::new(15).index(), 15);
        assert!(!Channel::new(15).is_all());
    }

    #[test]
    fn test_channel_broadcast() {
        assert_eq!(Channel::new(16), Channel::ALL);
        assert_eq!(Channel::new(200), Channel::ALL);
        assert!(Channel::ALL.is_all());
        assert_eq!(Channel::from(31u8), Channel::ALL);
    }
}
