//! Single-axis stepper
//!
//! Moves one servo a degree at a time, commanding the hardware and waiting
//! one pacing interval after every increment.

use embedded_hal::delay::DelayNs;
use heapless::Vec;
use log::debug;

use super::pacing::Pacing;
use super::target::MotionTarget;
use crate::config::MAX_SERVOS;
use crate::error::MotionError;
use crate::servo::ServoRegistry;
use crate::traits::PwmOutput;

/// Slot moved on its own before the rest of the arm when homing
pub const HOME_FIRST_SLOT: usize = 0;

/// Blocking motion executor over a servo registry
///
/// All moves are synchronous. A PWM failure stops the move at the current
/// step and is returned; the registry keeps the last applied angle.
pub struct Motion<'r, P, D> {
    pub(super) registry: &'r mut ServoRegistry<P>,
    pub(super) delay: D,
    pub(super) pacing: Pacing,
}

impl<'r, P: PwmOutput, D: DelayNs> Motion<'r, P, D> {
    /// Create a motion executor with the default pacing
    pub fn new(registry: &'r mut ServoRegistry<P>, delay: D) -> Self {
        Self::with_pacing(registry, delay, Pacing::default())
    }

    pub fn with_pacing(registry: &'r mut ServoRegistry<P>, delay: D, pacing: Pacing) -> Self {
        Self {
            registry,
            delay,
            pacing,
        }
    }

    /// Access the registry
    pub fn registry(&self) -> &ServoRegistry<P> {
        self.registry
    }

    pub fn pacing(&self) -> Pacing {
        self.pacing
    }

    /// Move one servo to an absolute angle
    ///
    /// The target is clamped to the servo's limits. Returns the angle the
    /// servo ended at.
    pub fn move_absolute(
        &mut self,
        slot: usize,
        angle_deg: i32,
        speed: u32,
    ) -> Result<i32, MotionError<P::Error>> {
        let target = self.registry.clamp(slot, angle_deg)?;
        let mut current = self.registry.current(slot)?;

        debug!("servo {}: {} -> {} at speed {}", slot, current, target, speed);

        let step = if target > current { 1 } else { -1 };
        while current != target {
            current = self.registry.set_current(slot, current + step)?;
            self.pacing.wait(&mut self.delay, speed);
        }
        Ok(target)
    }

    /// Move one servo by a delta from its current angle
    pub fn move_relative(
        &mut self,
        slot: usize,
        delta_deg: i32,
        speed: u32,
    ) -> Result<i32, MotionError<P::Error>> {
        let current = self.registry.current(slot)?;
        self.move_absolute(slot, current.saturating_add(delta_deg), speed)
    }

    /// Return every initialized servo to its home angle
    ///
    /// Slot 0 moves alone first, then the remaining servos move together.
    pub fn move_to_home(&mut self, speed: u32) -> Result<(), MotionError<P::Error>> {
        debug!("homing at speed {}", speed);

        if self.registry.is_initialized(HOME_FIRST_SLOT) {
            let home = self.registry.home(HOME_FIRST_SLOT)?;
            self.move_absolute(HOME_FIRST_SLOT, home, speed)?;
        }

        let mut targets: Vec<MotionTarget, MAX_SERVOS> = Vec::new();
        for slot in self.registry.initialized_slots() {
            if slot == HOME_FIRST_SLOT {
                continue;
            }
            let home = self.registry.home(slot)?;
            targets
                .push(MotionTarget::new(slot, home))
                .map_err(|_| MotionError::InvalidSlot(slot))?;
        }
        self.move_vector_absolute(&targets, speed)?;
        Ok(())
    }

    /// Block for a fixed time between moves
    pub fn pause_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }
}
