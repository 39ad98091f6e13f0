//! Scripted move sequences
//!
//! A sequence is a static list of moves and pauses run back to back.
//! [`DEMO_SEQUENCE`] is the pick-and-place routine for the reference arm.

use embedded_hal::delay::DelayNs;
use log::debug;

use super::stepper::Motion;
use super::target::MotionTarget;
use crate::error::MotionError;
use crate::traits::PwmOutput;

/// One step of a scripted sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SequenceStep<'a> {
    /// Single-axis absolute move
    Single { slot: usize, angle: i32, speed: u32 },
    /// Synchronized absolute move
    Vector {
        targets: &'a [MotionTarget],
        speed: u32,
    },
    /// Hold position
    Pause { ms: u32 },
    /// Return every servo home
    Home { speed: u32 },
}

const fn single(slot: usize, angle: i32, speed: u32) -> SequenceStep<'static> {
    SequenceStep::Single { slot, angle, speed }
}

const fn vector(targets: &'static [MotionTarget], speed: u32) -> SequenceStep<'static> {
    SequenceStep::Vector { targets, speed }
}

const fn pause(ms: u32) -> SequenceStep<'static> {
    SequenceStep::Pause { ms }
}

const fn t(slot: usize, angle: i32) -> MotionTarget {
    MotionTarget::new(slot, angle)
}

const fn ts(slot: usize, angle: i32, step: u16) -> MotionTarget {
    MotionTarget::with_step(slot, angle, step)
}

const RAISE: [MotionTarget; 3] = [t(1, 60), t(2, 100), t(3, 90)];
const REACH_OPEN: [MotionTarget; 5] = [t(1, 87), t(2, 120), t(3, 78), ts(4, 150, 5), t(5, 75)];
const LIFT_SWING: [MotionTarget; 5] = [t(0, 90), t(1, 50), t(2, 95), t(3, 80), ts(4, 84, 2)];
const LOWER: [MotionTarget; 4] = [t(1, 87), t(2, 120), t(3, 78), ts(4, 150, 5)];
const LIFT: [MotionTarget; 2] = [t(1, 60), t(2, 100)];
const TURN_BACK: [MotionTarget; 2] = [t(0, 80), ts(4, 87, 3)];

/// Pick-and-place demonstration for the reference arm
///
/// Raise, swing to the pick position while opening the gripper, grab, lift
/// and swing to the drop position, lower, release, lift and come home.
pub const DEMO_SEQUENCE: &[SequenceStep<'static>] = &[
    vector(&RAISE, 10),
    pause(100),
    single(0, 20, 10),
    pause(100),
    vector(&REACH_OPEN, 12),
    pause(100),
    single(5, 110, 5),
    pause(250),
    vector(&LIFT_SWING, 10),
    pause(3000),
    single(0, 20, 10),
    pause(100),
    vector(&LOWER, 12),
    pause(100),
    single(5, 75, 5),
    pause(250),
    vector(&LIFT, 10),
    pause(100),
    vector(&TURN_BACK, 10),
    SequenceStep::Home { speed: 10 },
];

impl<'r, P: PwmOutput, D: DelayNs> Motion<'r, P, D> {
    /// Run a sequence, stopping at the first failing step
    pub fn run_sequence(
        &mut self,
        steps: &[SequenceStep<'_>],
    ) -> Result<(), MotionError<P::Error>> {
        for (index, step) in steps.iter().enumerate() {
            debug!("sequence step {}/{}", index + 1, steps.len());
            match *step {
                SequenceStep::Single { slot, angle, speed } => {
                    self.move_absolute(slot, angle, speed)?;
                }
                SequenceStep::Vector { targets, speed } => {
                    self.move_vector_absolute(targets, speed)?;
                }
                SequenceStep::Pause { ms } => self.pause_ms(ms),
                SequenceStep::Home { speed } => self.move_to_home(speed)?,
            }
        }
        Ok(())
    }
}
