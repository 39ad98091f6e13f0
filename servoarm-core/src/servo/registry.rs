//! Servo registry
//!
//! Owns the PWM output and a fixed arena of [`MAX_SERVOS`] servo records.
//! Every change to a servo's angle goes through [`ServoRegistry::set_current`],
//! which writes the new pulse length to the hardware before the in-memory
//! angle is updated. The logical and physical positions therefore only
//! diverge when a write fails, and then the record keeps the last angle that
//! was actually applied.

use log::{debug, trace, warn};

use super::slot::Servo;
use crate::config::{ArmConfig, ServoConfig, MAX_SERVOS};
use crate::error::MotionError;
use crate::traits::{PwmOutput, CHANNEL_COUNT};

/// Fixed-size arena of calibrated servos sharing one PWM output
pub struct ServoRegistry<P> {
    pwm: P,
    servos: [Option<Servo>; MAX_SERVOS],
}

impl<P: PwmOutput> ServoRegistry<P> {
    /// Create an empty registry around a PWM output
    pub fn new(pwm: P) -> Self {
        Self {
            pwm,
            servos: [None; MAX_SERVOS],
        }
    }

    /// Create a registry and initialize every configured servo in slot order
    pub fn from_config(pwm: P, config: &ArmConfig) -> Result<Self, MotionError<P::Error>> {
        let mut registry = Self::new(pwm);
        for (slot, servo) in config.servos.iter().enumerate() {
            registry.init(slot, servo)?;
        }
        Ok(registry)
    }

    /// Install a servo in a slot and drive it to its home angle
    ///
    /// The slot is only populated once the home pulse has been written.
    /// Broadcast channels are refused: a servo drives exactly one output.
    pub fn init(
        &mut self,
        slot: usize,
        config: &ServoConfig,
    ) -> Result<(), MotionError<P::Error>> {
        if slot >= MAX_SERVOS {
            return Err(MotionError::InvalidSlot(slot));
        }
        if config.channel >= CHANNEL_COUNT {
            return Err(MotionError::InvalidChannel {
                slot,
                channel: config.channel,
            });
        }
        if !config.calibration.is_valid() {
            return Err(MotionError::InvalidCalibration {
                slot,
                pwm_min: config.calibration.pwm_min,
                pwm_max: config.calibration.pwm_max,
            });
        }
        if !config.limits_valid() {
            return Err(MotionError::InvalidLimits {
                slot,
                min_deg: config.min_deg,
                max_deg: config.max_deg,
            });
        }

        let servo = Servo::from_config(config);
        if servo.home_deg() != config.home_deg {
            warn!(
                "servo {}: home {} outside [{}, {}], using {}",
                slot,
                config.home_deg,
                config.min_deg,
                config.max_deg,
                servo.home_deg()
            );
        }

        let duty = servo.angle_to_duty(servo.home_deg());
        self.pwm
            .pwm(servo.channel(), duty)
            .map_err(MotionError::Pwm)?;
        self.servos[slot] = Some(servo);

        debug!(
            "servo {}: channel {} home {} limits [{}, {}]",
            slot,
            servo.channel().index(),
            servo.home_deg(),
            servo.min_deg(),
            servo.max_deg()
        );
        Ok(())
    }

    /// Get the servo record for a slot
    pub fn servo(&self, slot: usize) -> Result<&Servo, MotionError<P::Error>> {
        self.servos
            .get(slot)
            .ok_or(MotionError::InvalidSlot(slot))?
            .as_ref()
            .ok_or(MotionError::SlotNotInitialized(slot))
    }

    fn servo_mut(&mut self, slot: usize) -> Result<&mut Servo, MotionError<P::Error>> {
        self.servos
            .get_mut(slot)
            .ok_or(MotionError::InvalidSlot(slot))?
            .as_mut()
            .ok_or(MotionError::SlotNotInitialized(slot))
    }

    /// Check if a slot has been initialized
    pub fn is_initialized(&self, slot: usize) -> bool {
        matches!(self.servos.get(slot), Some(Some(_)))
    }

    /// Iterate over initialized slot indices in ascending order
    pub fn initialized_slots(&self) -> impl Iterator<Item = usize> + '_ {
        self.servos
            .iter()
            .enumerate()
            .filter_map(|(slot, servo)| servo.map(|_| slot))
    }

    /// Pulse length for an angle on a slot
    pub fn angle_to_duty(
        &self,
        slot: usize,
        angle_deg: i32,
    ) -> Result<i32, MotionError<P::Error>> {
        Ok(self.servo(slot)?.angle_to_duty(angle_deg))
    }

    /// Clamp an angle into a slot's soft limits
    pub fn clamp(&self, slot: usize, angle_deg: i32) -> Result<i32, MotionError<P::Error>> {
        Ok(self.servo(slot)?.clamp(angle_deg))
    }

    /// Current angle of a slot
    pub fn current(&self, slot: usize) -> Result<i32, MotionError<P::Error>> {
        Ok(self.servo(slot)?.position_deg())
    }

    /// Home angle of a slot
    pub fn home(&self, slot: usize) -> Result<i32, MotionError<P::Error>> {
        Ok(self.servo(slot)?.home_deg())
    }

    /// Move a slot to an angle immediately
    ///
    /// The angle is clamped, written to the hardware, and only then stored.
    /// Returns the angle that was applied.
    pub fn set_current(
        &mut self,
        slot: usize,
        angle_deg: i32,
    ) -> Result<i32, MotionError<P::Error>> {
        let servo = self.servo(slot)?;
        let angle_deg = servo.clamp(angle_deg);
        let channel = servo.channel();
        let duty = servo.angle_to_duty(angle_deg);

        trace!("servo {}: {} deg (duty {})", slot, angle_deg, duty);
        self.pwm.pwm(channel, duty).map_err(MotionError::Pwm)?;

        self.servo_mut(slot)?.set_position(angle_deg);
        Ok(angle_deg)
    }

    /// Access the PWM output
    pub fn pwm(&self) -> &P {
        &self.pwm
    }

    /// Mutable access to the PWM output
    ///
    /// Writing servo channels directly desynchronizes the stored angles;
    /// re-`init` the affected slots afterwards.
    pub fn pwm_mut(&mut self) -> &mut P {
        &mut self.pwm
    }

    /// Release the PWM output
    pub fn into_inner(self) -> P {
        self.pwm
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakePwmError, RecordingPwm};
    use crate::traits::Channel;
    use proptest::prelude::*;

    fn reference_registry() -> ServoRegistry<RecordingPwm> {
        ServoRegistry::from_config(RecordingPwm::new(), &ArmConfig::default()).unwrap()
    }

    #[test]
    fn test_init_commands_home() {
        let registry = reference_registry();

        assert_eq!(registry.pwm().writes.len(), MAX_SERVOS);
        // slot 1 home 76° -> 80 + 500 * 76 / 180
        assert_eq!(registry.pwm().last(Channel::new(1)), Some(291));
        assert_eq!(registry.current(1), Ok(76));
        assert_eq!(registry.home(1), Ok(76));
    }

    #[test]
    fn test_init_rejects_bad_slot_and_limits() {
        let mut registry = ServoRegistry::new(RecordingPwm::new());

        assert_eq!(
            registry.init(6, &ServoConfig::new(0, 90, 0, 180)),
            Err(MotionError::InvalidSlot(6))
        );
        assert_eq!(
            registry.init(0, &ServoConfig::new(0, 90, 120, 60)),
            Err(MotionError::InvalidLimits {
                slot: 0,
                min_deg: 120,
                max_deg: 60
            })
        );
        assert!(registry.pwm().writes.is_empty());
        assert!(!registry.is_initialized(0));
    }

    #[test]
    fn test_init_rejects_broadcast_channel() {
        let mut registry = ServoRegistry::new(RecordingPwm::new());

        assert_eq!(
            registry.init(2, &ServoConfig::new(20, 90, 0, 180)),
            Err(MotionError::InvalidChannel { slot: 2, channel: 20 })
        );
        assert_eq!(
            registry.init(2, &ServoConfig::new(16, 90, 0, 180)),
            Err(MotionError::InvalidChannel { slot: 2, channel: 16 })
        );
        assert!(registry.pwm().writes.is_empty());
        assert!(!registry.is_initialized(2));

        registry.init(2, &ServoConfig::new(15, 90, 0, 180)).unwrap();
        assert_eq!(registry.pwm().writes, [(Channel::new(15), 330)]);
    }

    #[test]
    fn test_init_rejects_bad_calibration() {
        use crate::config::ServoCalibration;

        let mut registry = ServoRegistry::new(RecordingPwm::new());
        let config = ServoConfig::new(0, 90, 0, 180);
        let inverted = config.with_calibration(ServoCalibration::new(600, 100));
        let too_long = config.with_calibration(ServoCalibration::new(100, 9000));

        assert_eq!(
            registry.init(0, &inverted),
            Err(MotionError::InvalidCalibration {
                slot: 0,
                pwm_min: 600,
                pwm_max: 100
            })
        );
        assert_eq!(
            registry.init(0, &too_long),
            Err(MotionError::InvalidCalibration {
                slot: 0,
                pwm_min: 100,
                pwm_max: 9000
            })
        );
        assert!(registry.pwm().writes.is_empty());
        assert!(!registry.is_initialized(0));
    }

    #[test]
    fn test_init_failure_leaves_slot_empty() {
        let mut pwm = RecordingPwm::new();
        pwm.fail_after(0);
        let mut registry = ServoRegistry::new(pwm);

        assert_eq!(
            registry.init(0, &ServoConfig::new(0, 90, 0, 180)),
            Err(MotionError::Pwm(FakePwmError))
        );
        assert!(!registry.is_initialized(0));
    }

    #[test]
    fn test_uninitialized_slot() {
        let registry = ServoRegistry::new(RecordingPwm::new());
        assert_eq!(registry.current(3), Err(MotionError::SlotNotInitialized(3)));
        assert_eq!(registry.clamp(9, 10), Err(MotionError::InvalidSlot(9)));
        assert_eq!(registry.initialized_slots().count(), 0);
    }

    #[test]
    fn test_initialized_slots() {
        let mut registry = ServoRegistry::new(RecordingPwm::new());
        registry.init(4, &ServoConfig::new(4, 87, 22, 162)).unwrap();
        registry.init(1, &ServoConfig::new(1, 76, 40, 100)).unwrap();

        let slots: std::vec::Vec<usize> = registry.initialized_slots().collect();
        assert_eq!(slots, [1, 4]);
    }

    #[test]
    fn test_set_current_clamps_and_commands() {
        let mut registry = reference_registry();
        registry.pwm_mut().clear();

        assert_eq!(registry.set_current(1, 150), Ok(100));
        assert_eq!(registry.current(1), Ok(100));
        assert_eq!(
            registry.pwm().writes,
            [(Channel::new(1), registry.angle_to_duty(1, 100).unwrap())]
        );
    }

    #[test]
    fn test_set_current_failure_keeps_angle() {
        let mut registry = reference_registry();
        registry.pwm_mut().fail_after(0);

        assert_eq!(
            registry.set_current(2, 100),
            Err(MotionError::Pwm(FakePwmError))
        );
        assert_eq!(registry.current(2), Ok(130));
    }

    #[test]
    fn test_per_slot_calibration() {
        use crate::config::ServoCalibration;

        let mut registry = ServoRegistry::new(RecordingPwm::new());
        let config =
            ServoConfig::new(0, 90, 0, 180).with_calibration(ServoCalibration::new(100, 460));
        registry.init(0, &config).unwrap();

        assert_eq!(registry.angle_to_duty(0, 0), Ok(100));
        assert_eq!(registry.angle_to_duty(0, 90), Ok(280));
        assert_eq!(registry.angle_to_duty(0, 180), Ok(460));
    }

    proptest! {
        #[test]
        fn prop_clamp_in_limits_and_idempotent(slot in 0usize..MAX_SERVOS, angle in -720i32..720) {
            let registry = reference_registry();
            let servo = *registry.servo(slot).unwrap();
            let clamped = registry.clamp(slot, angle).unwrap();

            prop_assert!(clamped >= servo.min_deg() && clamped <= servo.max_deg());
            prop_assert_eq!(registry.clamp(slot, clamped).unwrap(), clamped);
        }

        #[test]
        fn prop_angle_to_duty_monotonic(
            slot in 0usize..MAX_SERVOS,
            a in any::<i32>(),
            b in any::<i32>()
        ) {
            let registry = reference_registry();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let cal = registry.servo(slot).unwrap().calibration();

            let duty_lo = registry.angle_to_duty(slot, lo).unwrap();
            let duty_hi = registry.angle_to_duty(slot, hi).unwrap();
            prop_assert!(duty_lo <= duty_hi);
            prop_assert!(duty_lo >= cal.pwm_min as i32 && duty_hi <= cal.pwm_max as i32);
            prop_assert_eq!(registry.angle_to_duty(slot, 0).unwrap(), cal.pwm_min as i32);
            prop_assert_eq!(registry.angle_to_duty(slot, 180).unwrap(), cal.pwm_max as i32);
        }

        #[test]
        fn prop_set_current_stays_in_limits(slot in 0usize..MAX_SERVOS, angle in -720i32..720) {
            let mut registry = reference_registry();
            let servo = *registry.servo(slot).unwrap();
            let applied = registry.set_current(slot, angle).unwrap();

            prop_assert!(applied >= servo.min_deg() && applied <= servo.max_deg());
            prop_assert_eq!(registry.current(slot).unwrap(), applied);
        }
    }
}
