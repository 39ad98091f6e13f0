//! Step pacing
//!
//! Motion is paced by blocking between increments. The wait after each
//! step (or each synchronized round) is the time a servo needs to travel one
//! degree, scaled by the caller's speed factor: larger speed values mean
//! slower motion.

use embedded_hal::delay::DelayNs;

use crate::config::DEFAULT_DEGREE_TIME_US;

/// Per-degree timing for the steppers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pacing {
    degree_time_us: u32,
}

impl Default for Pacing {
    fn default() -> Self {
        Self::new(DEFAULT_DEGREE_TIME_US)
    }
}

impl Pacing {
    pub const fn new(degree_time_us: u32) -> Self {
        Self { degree_time_us }
    }

    /// Time for one degree of travel at speed factor 1
    pub const fn degree_time_us(&self) -> u32 {
        self.degree_time_us
    }

    /// Wait between steps for a speed factor
    pub const fn interval_us(&self, speed: u32) -> u32 {
        self.degree_time_us.saturating_mul(speed)
    }

    /// Block for one step interval
    pub fn wait<D: DelayNs>(&self, delay: &mut D, speed: u32) {
        delay.delay_us(self.interval_us(speed));
    }
}
