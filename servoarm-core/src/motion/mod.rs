//! Motion execution
//!
//! Joint-space stepping only: each servo travels in fixed degree increments
//! with a blocking wait between increments.

pub mod pacing;
pub mod sequence;
pub mod stepper;
pub mod target;
pub mod vector;

pub use pacing::Pacing;
pub use sequence::{SequenceStep, DEMO_SEQUENCE};
pub use stepper::{Motion, HOME_FIRST_SLOT};
pub use target::{Direction, MotionTarget, ResolvedTarget};
