//! Motion targets
//!
//! A [`MotionTarget`] is what callers hand to the vector stepper. It is
//! resolved against the registry into a [`ResolvedTarget`]: clamped absolute
//! angle plus the direction still to travel.

use core::cmp::Ordering;

/// One entry of a coordinated move
///
/// `angle` is absolute for [`move_vector_absolute`] and a delta for
/// [`move_vector_relative`].
///
/// [`move_vector_absolute`]: super::Motion::move_vector_absolute
/// [`move_vector_relative`]: super::Motion::move_vector_relative
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotionTarget {
    /// Registry slot
    pub slot: usize,
    /// Target angle or delta in degrees
    pub angle: i32,
    /// Degrees moved per round, 0 is treated as 1
    pub step: u16,
}

impl MotionTarget {
    /// Target with the default step of one degree per round
    pub const fn new(slot: usize, angle: i32) -> Self {
        Self {
            slot,
            angle,
            step: 1,
        }
    }

    pub const fn with_step(slot: usize, angle: i32, step: u16) -> Self {
        Self { slot, angle, step }
    }

    /// Step size with the zero default applied
    pub const fn effective_step(&self) -> i32 {
        if self.step == 0 {
            1
        } else {
            self.step as i32
        }
    }
}

/// Direction of remaining travel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Up,
    Down,
    Done,
}

impl Direction {
    /// Direction needed to get from `current` to `target`
    pub fn between(current: i32, target: i32) -> Self {
        match target.cmp(&current) {
            Ordering::Greater => Self::Up,
            Ordering::Less => Self::Down,
            Ordering::Equal => Self::Done,
        }
    }
}

/// A target bound to a servo, ready for stepping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ResolvedTarget {
    pub slot: usize,
    /// Clamped absolute target
    pub target: i32,
    pub step: i32,
    pub direction: Direction,
}

impl ResolvedTarget {
    pub fn new(slot: usize, current: i32, target: i32, step: i32) -> Self {
        Self {
            slot,
            target,
            step,
            direction: Direction::between(current, target),
        }
    }

    pub fn is_done(&self) -> bool {
        self.direction == Direction::Done
    }

    /// Next angle toward the target without overshooting it
    pub fn next_angle(&self, current: i32) -> i32 {
        match self.direction {
            Direction::Up => current.saturating_add(self.step).min(self.target),
            Direction::Down => current.saturating_sub(self.step).max(self.target),
            Direction::Done => current,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_step_defaults_to_one() {
        assert_eq!(MotionTarget::with_step(0, 10, 0).effective_step(), 1);
        assert_eq!(MotionTarget::new(0, 10).effective_step(), 1);
        assert_eq!(MotionTarget::with_step(0, 10, 5).effective_step(), 5);
    }

    #[test]
    fn test_direction() {
        assert_eq!(Direction::between(10, 20), Direction::Up);
        assert_eq!(Direction::between(20, 10), Direction::Down);
        assert_eq!(Direction::between(20, 20), Direction::Done);
    }

    #[test]
    fn test_next_angle_no_overshoot() {
        let up = ResolvedTarget::new(4, 80, 84, 3);
        assert_eq!(up.next_angle(80), 83);
        assert_eq!(up.next_angle(83), 84);

        let down = ResolvedTarget::new(4, 87, 84, 2);
        assert_eq!(down.next_angle(87), 85);
        assert_eq!(down.next_angle(85), 84);
    }

    #[test]
    fn test_resolved_at_target_is_done() {
        let target = ResolvedTarget::new(0, 90, 90, 1);
        assert!(target.is_done());
        assert_eq!(target.next_angle(90), 90);
    }
}
