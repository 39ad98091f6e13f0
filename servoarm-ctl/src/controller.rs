//! Arm controller
//!
//! Owns the PCA9685, the servo registry and the delay, and runs the
//! start-up, demo and shutdown phases:
//!
//! 1. open the PCA9685 and program the carrier frequency
//! 2. turn every output off and let the servos settle
//! 3. install every configured servo at its home angle
//! 4. home the arm at the default speed
//! 5. ... run moves ...
//! 6. home the arm again and release the bus

use std::fmt;

use embedded_hal::delay::DelayNs;
use log::{debug, info};

use servoarm_core::config::ArmConfig;
use servoarm_core::error::MotionError;
use servoarm_core::motion::{Motion, Pacing, SequenceStep};
use servoarm_core::servo::ServoRegistry;
use servoarm_drivers::pwm::{Pca9685, Pca9685Error};
use servoarm_hal::I2cBus;

/// Speed factor for homing moves
pub const HOME_SPEED: u32 = 10;

/// Wait after switching every output off
const RESET_SETTLE_MS: u32 = 100;

/// Wait after the start-up homing move
const HOME_SETTLE_MS: u32 = 500;

/// Controller errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerError<E> {
    /// PCA9685 bring-up or release failed
    Device(Pca9685Error<E>),
    /// A move failed
    Motion(MotionError<Pca9685Error<E>>),
}

impl<E> From<Pca9685Error<E>> for ControllerError<E> {
    fn from(e: Pca9685Error<E>) -> Self {
        ControllerError::Device(e)
    }
}

impl<E> From<MotionError<Pca9685Error<E>>> for ControllerError<E> {
    fn from(e: MotionError<Pca9685Error<E>>) -> Self {
        ControllerError::Motion(e)
    }
}

impl<E: fmt::Debug> fmt::Display for ControllerError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Device(e) => write!(f, "{}", e),
            Self::Motion(e) => write!(f, "{}", e),
        }
    }
}

/// A running arm
pub struct Controller<B, D> {
    registry: ServoRegistry<Pca9685<B>>,
    delay: D,
    pacing: Pacing,
}

impl<B: I2cBus, D: DelayNs> Controller<B, D> {
    /// Bring the arm up and home it
    pub fn bring_up(
        bus: B,
        arm: &ArmConfig,
        mut delay: D,
    ) -> Result<Self, ControllerError<B::Error>> {
        let mut pca = Pca9685::open(bus, arm.i2c_address, arm.frequency_hz, &mut delay)?;
        info!(
            "pca9685 at 0x{:02x} running at {} Hz",
            pca.address(),
            pca.frequency()
        );

        pca.reset()?;
        delay.delay_ms(RESET_SETTLE_MS);

        let registry = ServoRegistry::from_config(pca, arm)?;
        info!("{} servos installed", registry.initialized_slots().count());

        let mut controller = Self {
            registry,
            delay,
            pacing: Pacing::new(arm.degree_time_us),
        };
        let mut motion = controller.motion();
        motion.move_to_home(HOME_SPEED)?;
        motion.pause_ms(HOME_SETTLE_MS);

        Ok(controller)
    }

    /// Motion executor borrowing the controller
    pub fn motion(&mut self) -> Motion<'_, Pca9685<B>, &mut D> {
        Motion::with_pacing(&mut self.registry, &mut self.delay, self.pacing)
    }

    pub fn registry(&self) -> &ServoRegistry<Pca9685<B>> {
        &self.registry
    }

    /// Run a scripted sequence
    pub fn run(&mut self, steps: &[SequenceStep<'_>]) -> Result<(), ControllerError<B::Error>> {
        info!("running {} sequence steps", steps.len());
        self.motion().run_sequence(steps)?;
        Ok(())
    }

    /// Home the arm and release the bus
    pub fn shutdown(mut self) -> Result<B, ControllerError<B::Error>> {
        self.motion().move_to_home(HOME_SPEED)?;

        let mut pca = self.registry.into_inner();
        debug!("releasing pca9685");
        pca.close()
            .ok_or(ControllerError::Device(Pca9685Error::Closed))
    }
}
