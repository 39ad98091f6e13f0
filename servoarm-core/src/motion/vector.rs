//! Synchronized multi-axis stepper
//!
//! Every round advances each unfinished axis by its own step size toward its
//! target, then waits one shared pacing interval. Axes with larger steps
//! finish in fewer rounds; the move ends when the last axis arrives.

use embedded_hal::delay::DelayNs;
use heapless::Vec;
use log::{debug, trace};

use super::stepper::Motion;
use super::target::{Direction, MotionTarget, ResolvedTarget};
use crate::config::MAX_SERVOS;
use crate::error::MotionError;
use crate::traits::PwmOutput;

type Resolved = Vec<ResolvedTarget, MAX_SERVOS>;

impl<'r, P: PwmOutput, D: DelayNs> Motion<'r, P, D> {
    /// Move several servos to absolute angles together
    ///
    /// Returns the number of rounds executed.
    pub fn move_vector_absolute(
        &mut self,
        targets: &[MotionTarget],
        speed: u32,
    ) -> Result<u32, MotionError<P::Error>> {
        let resolved = self.resolve(targets, |_current, angle| angle)?;
        self.step_synchronized(resolved, speed)
    }

    /// Move several servos by deltas from their current angles together
    ///
    /// Returns the number of rounds executed.
    pub fn move_vector_relative(
        &mut self,
        targets: &[MotionTarget],
        speed: u32,
    ) -> Result<u32, MotionError<P::Error>> {
        let resolved = self.resolve(targets, |current, delta| current.saturating_add(delta))?;
        self.step_synchronized(resolved, speed)
    }

    /// Validate and clamp every entry before anything moves
    fn resolve(
        &self,
        targets: &[MotionTarget],
        absolute: impl Fn(i32, i32) -> i32,
    ) -> Result<Resolved, MotionError<P::Error>> {
        let mut resolved = Resolved::new();
        for entry in targets {
            let current = self.registry.current(entry.slot)?;
            if resolved.iter().any(|r| r.slot == entry.slot) {
                return Err(MotionError::DuplicateSlot(entry.slot));
            }
            let target = self.registry.clamp(entry.slot, absolute(current, entry.angle))?;
            // distinct valid slots cannot exceed the capacity
            resolved
                .push(ResolvedTarget::new(entry.slot, current, target, entry.effective_step()))
                .map_err(|_| MotionError::DuplicateSlot(entry.slot))?;
        }
        Ok(resolved)
    }

    fn step_synchronized(
        &mut self,
        mut resolved: Resolved,
        speed: u32,
    ) -> Result<u32, MotionError<P::Error>> {
        debug!("vector move: {} axes at speed {}", resolved.len(), speed);

        let mut rounds = 0;
        loop {
            let mut moved = false;
            let mut remaining = 0;

            for entry in resolved.iter_mut() {
                if entry.is_done() {
                    continue;
                }
                let current = self.registry.current(entry.slot)?;
                let applied = self.registry.set_current(entry.slot, entry.next_angle(current))?;
                moved = true;

                if applied == entry.target {
                    entry.direction = Direction::Done;
                } else {
                    remaining += 1;
                }
            }

            if !moved {
                break;
            }
            rounds += 1;
            trace!("vector round {}: {} axes remaining", rounds, remaining);

            if remaining == 0 {
                break;
            }
            self.pacing.wait(&mut self.delay, speed);
        }

        debug!("vector move finished in {} rounds", rounds);
        Ok(rounds)
    }
}
