//! Test doubles for the PWM output and the blocking delay

use core::fmt;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;

use crate::traits::{Channel, PwmOutput};

/// Error injected by [`RecordingPwm`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FakePwmError;

impl fmt::Display for FakePwmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("injected pwm failure")
    }
}

/// PWM output that records every pulse and can be told to start failing
#[derive(Debug, Default)]
pub struct RecordingPwm {
    pub writes: Vec<(Channel, i32)>,
    budget: Option<usize>,
}

impl RecordingPwm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow `n` more successful writes, then fail every write
    pub fn fail_after(&mut self, n: usize) {
        self.budget = Some(n);
    }

    pub fn clear(&mut self) {
        self.writes.clear();
    }

    pub fn writes_to(&self, channel: Channel) -> usize {
        self.writes.iter().filter(|(ch, _)| *ch == channel).count()
    }

    pub fn last(&self, channel: Channel) -> Option<i32> {
        self.writes
            .iter()
            .rev()
            .find(|(ch, _)| *ch == channel)
            .map(|(_, length)| *length)
    }
}

impl PwmOutput for RecordingPwm {
    type Error = FakePwmError;

    fn pwm(&mut self, channel: Channel, length: i32) -> Result<(), Self::Error> {
        match self.budget {
            Some(0) => return Err(FakePwmError),
            Some(n) => self.budget = Some(n - 1),
            None => {}
        }
        self.writes.push((channel, length));
        Ok(())
    }
}

/// Delay that records every wait in microseconds instead of sleeping
#[derive(Debug, Default)]
pub struct RecordingDelay {
    pub waits_us: Vec<u32>,
}

impl RecordingDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_us(&self) -> u64 {
        self.waits_us.iter().map(|&us| us as u64).sum()
    }
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.waits_us.push(ns / 1000);
    }

    fn delay_us(&mut self, us: u32) {
        self.waits_us.push(us);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.waits_us.push(ms.saturating_mul(1000));
    }
}
