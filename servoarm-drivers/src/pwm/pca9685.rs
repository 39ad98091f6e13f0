//! PCA9685 16-channel PWM expander (I2C)
//!
//! The PCA9685 drives 16 outputs from one 25 MHz oscillator through a 12-bit
//! counter. Each output has four registers (ON_L, ON_H, OFF_L, OFF_H): the
//! counter value at which the output rises and the value at which it falls.
//! Bit 4 of ON_H / OFF_H overrides the counter and holds the output fully on
//! or fully off. Full-off wins when both are set.
//!
//! # Register Access
//!
//! Writes are `[register, data...]`. With auto-increment enabled in MODE1,
//! 16-bit values are written little-endian in one transaction. Reads use a
//! repeated start: write the register address, then read.
//!
//! # Frequency
//!
//! The output frequency is set by PRESCALE, which can only be written while
//! the oscillator is asleep:
//!
//! ```text
//! prescale = floor(25 MHz / (4096 * f) - 0.5)
//! ```

use core::fmt;

use embedded_hal::delay::DelayNs;
use log::{debug, trace};
use servoarm_core::traits::{Channel, PwmOutput, PWM_PERIOD_TICKS};
use servoarm_hal::I2cBus;

/// PCA9685 register addresses
pub mod reg {
    /// Mode register 1
    pub const MODE1: u8 = 0x00;
    /// Mode register 2
    pub const MODE2: u8 = 0x01;
    /// LED0 ON low byte; each channel adds 4
    pub const LED0_ON_L: u8 = 0x06;
    /// Broadcast ON low byte
    pub const ALL_LED_ON_L: u8 = 0xFA;
    /// Broadcast OFF low byte
    pub const ALL_LED_OFF_L: u8 = 0xFC;
    /// Oscillator prescaler
    pub const PRESCALE: u8 = 0xFE;
}

/// MODE1 bits
pub mod mode1 {
    /// Restart after sleep
    pub const RESTART: u8 = 0x80;
    /// Register auto-increment
    pub const AI: u8 = 0x20;
    /// Low power mode, oscillator off
    pub const SLEEP: u8 = 0x10;
}

/// Full-on / full-off override bit in a 16-bit ON or OFF value
pub const OVERRIDE_BIT: u16 = 0x1000;

/// Mask for the 12-bit tick value
pub const TICK_MASK: u16 = 0x0FFF;

/// Internal oscillator frequency
pub const OSC_CLOCK_HZ: u32 = 25_000_000;

/// Lowest supported output frequency
pub const FREQUENCY_MIN_HZ: u16 = 40;

/// Highest supported output frequency
pub const FREQUENCY_MAX_HZ: u16 = 1000;

/// Time for the oscillator to stabilize after waking
const OSC_WAKE_MS: u32 = 1;

/// Prescale value for an output frequency
///
/// The frequency is clamped to [`FREQUENCY_MIN_HZ`]..=[`FREQUENCY_MAX_HZ`].
pub const fn prescale_for(frequency_hz: u16) -> u8 {
    let f = clamp_frequency(frequency_hz) as u32;
    // floor(osc / (4096 f) - 0.5) in integer math
    ((2 * OSC_CLOCK_HZ - 4096 * f) / (2 * 4096 * f)) as u8
}

const fn clamp_frequency(frequency_hz: u16) -> u16 {
    if frequency_hz < FREQUENCY_MIN_HZ {
        FREQUENCY_MIN_HZ
    } else if frequency_hz > FREQUENCY_MAX_HZ {
        FREQUENCY_MAX_HZ
    } else {
        frequency_hz
    }
}

/// First register (ON_L) of a channel
pub const fn channel_register(channel: Channel) -> u8 {
    if channel.is_all() {
        reg::ALL_LED_ON_L
    } else {
        reg::LED0_ON_L + 4 * channel.index()
    }
}

/// Raw ON / OFF register values of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DutyCycle {
    pub on: u16,
    pub off: u16,
}

impl DutyCycle {
    /// Counter value at which the output rises
    pub const fn on_ticks(&self) -> u16 {
        self.on & TICK_MASK
    }

    /// Counter value at which the output falls
    pub const fn off_ticks(&self) -> u16 {
        self.off & TICK_MASK
    }

    pub const fn is_full_on(&self) -> bool {
        self.on & OVERRIDE_BIT != 0
    }

    pub const fn is_full_off(&self) -> bool {
        self.off & OVERRIDE_BIT != 0
    }
}

/// PCA9685 errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pca9685Error<E> {
    /// Device did not answer at its address
    DeviceOpen(E),
    /// Register access failed
    BusIo {
        /// Register being accessed
        register: u8,
        /// Underlying bus error
        source: E,
    },
    /// Handle was closed
    Closed,
}

impl<E: fmt::Debug> fmt::Display for Pca9685Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeviceOpen(e) => write!(f, "pca9685 not responding: {:?}", e),
            Self::BusIo { register, source } => {
                write!(f, "pca9685 register 0x{:02x} access failed: {:?}", register, source)
            }
            Self::Closed => f.write_str("pca9685 handle is closed"),
        }
    }
}

/// PCA9685 driver
///
/// Owns the bus until [`close`](Self::close) hands it back.
pub struct Pca9685<B> {
    bus: Option<B>,
    address: u8,
    frequency_hz: u16,
}

impl<B: I2cBus> Pca9685<B> {
    /// Open the device and program the output frequency
    ///
    /// Enables register auto-increment and clears RESTART, then programs the
    /// prescaler. Fails with [`Pca9685Error::DeviceOpen`] if MODE1 cannot be
    /// read.
    pub fn open<D: DelayNs>(
        mut bus: B,
        address: u8,
        frequency_hz: u16,
        delay: &mut D,
    ) -> Result<Self, Pca9685Error<B::Error>> {
        let mut mode = [0u8; 1];
        bus.write_read(address, &[reg::MODE1], &mut mode)
            .map_err(Pca9685Error::DeviceOpen)?;

        let mut pca = Self {
            bus: Some(bus),
            address,
            frequency_hz: 0,
        };
        pca.write8(reg::MODE1, (mode[0] | mode1::AI) & !mode1::RESTART)?;
        pca.set_frequency(frequency_hz, delay)?;

        debug!(
            "pca9685 at 0x{:02x}: {} Hz (prescale {})",
            address,
            pca.frequency_hz,
            prescale_for(pca.frequency_hz)
        );
        Ok(pca)
    }

    /// I2C address of the device
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Programmed output frequency
    pub fn frequency(&self) -> u16 {
        self.frequency_hz
    }

    pub fn is_open(&self) -> bool {
        self.bus.is_some()
    }

    /// Reprogram the output frequency
    ///
    /// Sleeps the oscillator, writes PRESCALE, wakes it, waits for it to
    /// settle and restarts the outputs.
    pub fn set_frequency<D: DelayNs>(
        &mut self,
        frequency_hz: u16,
        delay: &mut D,
    ) -> Result<(), Pca9685Error<B::Error>> {
        let frequency_hz = clamp_frequency(frequency_hz);
        let prescale = prescale_for(frequency_hz);

        let mode = self.read8(reg::MODE1)? & !mode1::RESTART;
        let sleep = mode | mode1::SLEEP;
        let wake = mode & !mode1::SLEEP;

        self.write8(reg::MODE1, sleep)?;
        self.write8(reg::PRESCALE, prescale)?;
        self.write8(reg::MODE1, wake)?;
        delay.delay_ms(OSC_WAKE_MS);
        self.write8(reg::MODE1, wake | mode1::RESTART)?;

        self.frequency_hz = frequency_hz;
        Ok(())
    }

    /// Turn every output fully off
    pub fn reset(&mut self) -> Result<(), Pca9685Error<B::Error>> {
        debug!("pca9685: all outputs off");
        self.write16(reg::ALL_LED_ON_L, 0x0000)?;
        self.write16(reg::ALL_LED_OFF_L, OVERRIDE_BIT)
    }

    /// Set the rise and fall ticks of a channel
    ///
    /// Both values are masked to 12 bits, which also clears any override.
    pub fn set_duty(
        &mut self,
        channel: Channel,
        on: u16,
        off: u16,
    ) -> Result<(), Pca9685Error<B::Error>> {
        let base = channel_register(channel);
        self.write16(base, on & TICK_MASK)?;
        self.write16(base + 2, off & TICK_MASK)
    }

    /// Read the raw ON / OFF registers of a channel
    pub fn get_duty(&mut self, channel: Channel) -> Result<DutyCycle, Pca9685Error<B::Error>> {
        let base = channel_register(channel);
        Ok(DutyCycle {
            on: self.read16(base)?,
            off: self.read16(base + 2)?,
        })
    }

    /// Set or clear the full-on override
    ///
    /// Enabling full-on also clears full-off, which would otherwise win.
    pub fn set_full_on(
        &mut self,
        channel: Channel,
        enable: bool,
    ) -> Result<(), Pca9685Error<B::Error>> {
        self.update_override(channel_register(channel) + 1, enable)?;
        if enable {
            self.set_full_off(channel, false)?;
        }
        Ok(())
    }

    /// Set or clear the full-off override
    pub fn set_full_off(
        &mut self,
        channel: Channel,
        enable: bool,
    ) -> Result<(), Pca9685Error<B::Error>> {
        self.update_override(channel_register(channel) + 3, enable)
    }

    /// Hold a channel fully on or fully off
    pub fn set_on(&mut self, channel: Channel, on: bool) -> Result<(), Pca9685Error<B::Error>> {
        if on {
            self.set_full_on(channel, true)
        } else {
            self.set_full_off(channel, true)
        }
    }

    /// Drive a channel with a pulse of `length` ticks starting at 0
    pub fn pwm(&mut self, channel: Channel, length: i32) -> Result<(), Pca9685Error<B::Error>> {
        if length >= PWM_PERIOD_TICKS {
            self.set_full_on(channel, true)
        } else if length <= 0 {
            self.set_full_off(channel, true)
        } else {
            self.set_duty(channel, 0, length as u16)
        }
    }

    /// Release the bus
    ///
    /// Returns the bus on the first call and `None` afterwards.
    pub fn close(&mut self) -> Option<B> {
        let bus = self.bus.take();
        if bus.is_some() {
            debug!("pca9685 at 0x{:02x}: closed", self.address);
        }
        bus
    }

    fn update_override(
        &mut self,
        high_register: u8,
        enable: bool,
    ) -> Result<(), Pca9685Error<B::Error>> {
        let bit = (OVERRIDE_BIT >> 8) as u8;
        let value = self.read8(high_register)?;
        let value = if enable { value | bit } else { value & !bit };
        self.write8(high_register, value)
    }

    fn bus(&mut self) -> Result<&mut B, Pca9685Error<B::Error>> {
        self.bus.as_mut().ok_or(Pca9685Error::Closed)
    }

    fn write8(&mut self, register: u8, value: u8) -> Result<(), Pca9685Error<B::Error>> {
        trace!("pca9685 0x{:02x} <- 0x{:02x}", register, value);
        let address = self.address;
        self.bus()?
            .write(address, &[register, value])
            .map_err(|source| Pca9685Error::BusIo { register, source })
    }

    fn write16(&mut self, register: u8, value: u16) -> Result<(), Pca9685Error<B::Error>> {
        trace!("pca9685 0x{:02x} <- 0x{:04x}", register, value);
        let address = self.address;
        let [lo, hi] = value.to_le_bytes();
        self.bus()?
            .write(address, &[register, lo, hi])
            .map_err(|source| Pca9685Error::BusIo { register, source })
    }

    fn read8(&mut self, register: u8) -> Result<u8, Pca9685Error<B::Error>> {
        let address = self.address;
        let mut buf = [0u8; 1];
        self.bus()?
            .write_read(address, &[register], &mut buf)
            .map_err(|source| Pca9685Error::BusIo { register, source })?;
        Ok(buf[0])
    }

    fn read16(&mut self, register: u8) -> Result<u16, Pca9685Error<B::Error>> {
        let address = self.address;
        let mut buf = [0u8; 2];
        self.bus()?
            .write_read(address, &[register], &mut buf)
            .map_err(|source| Pca9685Error::BusIo { register, source })?;
        Ok(u16::from_le_bytes(buf))
    }
}

impl<B: I2cBus> PwmOutput for Pca9685<B> {
    type Error = Pca9685Error<B::Error>;

    fn pwm(&mut self, channel: Channel, length: i32) -> Result<(), Self::Error> {
        Pca9685::pwm(self, channel, length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::vec::Vec;

    const ADDRESS: u8 = 0x40;
    /// MODE1 power-on value: SLEEP | ALLCALL
    const MODE1_POWER_ON: u8 = 0x11;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum SimError {
        Nack,
        Injected,
    }

    /// Register file of a simulated PCA9685 with auto-increment
    struct SimBus {
        regs: [u8; 256],
        writes: Vec<(u8, u8)>,
        fail_register: Option<u8>,
    }

    impl SimBus {
        fn new() -> Self {
            let mut regs = [0u8; 256];
            regs[reg::MODE1 as usize] = MODE1_POWER_ON;
            Self {
                regs,
                writes: Vec::new(),
                fail_register: None,
            }
        }

        fn check(&self, address: u8, register: u8) -> Result<(), SimError> {
            if address != ADDRESS {
                return Err(SimError::Nack);
            }
            if self.fail_register == Some(register) {
                return Err(SimError::Injected);
            }
            Ok(())
        }
    }

    impl I2cBus for SimBus {
        type Error = SimError;

        fn write(&mut self, address: u8, data: &[u8]) -> Result<(), SimError> {
            let register = data[0];
            self.check(address, register)?;
            for (offset, &byte) in data[1..].iter().enumerate() {
                let r = register.wrapping_add(offset as u8);
                self.regs[r as usize] = byte;
                self.writes.push((r, byte));
            }
            Ok(())
        }

        fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), SimError> {
            self.check(address, reg::MODE1)?;
            buf.fill(0);
            Ok(())
        }

        fn write_read(
            &mut self,
            address: u8,
            write_data: &[u8],
            read_buf: &mut [u8],
        ) -> Result<(), SimError> {
            let register = write_data[0];
            self.check(address, register)?;
            for (offset, byte) in read_buf.iter_mut().enumerate() {
                *byte = self.regs[register.wrapping_add(offset as u8) as usize];
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct MsDelay {
        waits_ms: Vec<u32>,
    }

    impl DelayNs for MsDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.waits_ms.push(ns / 1_000_000);
        }

        fn delay_ms(&mut self, ms: u32) {
            self.waits_ms.push(ms);
        }
    }

    fn open() -> Pca9685<SimBus> {
        Pca9685::open(SimBus::new(), ADDRESS, 50, &mut MsDelay::default()).unwrap()
    }

    fn sim(pca: &mut Pca9685<SimBus>) -> &mut SimBus {
        pca.bus.as_mut().unwrap()
    }

    #[test]
    fn test_prescale() {
        assert_eq!(prescale_for(50), 121);
        assert_eq!(prescale_for(1000), 5);
        assert_eq!(prescale_for(40), 152);
    }

    #[test]
    fn test_prescale_clamps_frequency() {
        assert_eq!(prescale_for(0), prescale_for(40));
        assert_eq!(prescale_for(10), prescale_for(40));
        assert_eq!(prescale_for(5000), prescale_for(1000));
    }

    #[test]
    fn test_channel_register() {
        assert_eq!(channel_register(Channel::new(0)), 0x06);
        assert_eq!(channel_register(Channel::new(5)), 0x1A);
        assert_eq!(channel_register(Channel::new(15)), 0x42);
        assert_eq!(channel_register(Channel::new(16)), reg::ALL_LED_ON_L);
        assert_eq!(channel_register(Channel::ALL), reg::ALL_LED_ON_L);
    }

    #[test]
    fn test_open_bring_up_order() {
        let mut delay = MsDelay::default();
        let mut pca = Pca9685::open(SimBus::new(), ADDRESS, 50, &mut delay).unwrap();

        assert_eq!(
            sim(&mut pca).writes,
            [
                (reg::MODE1, 0x31), // auto-increment on, still asleep
                (reg::MODE1, 0x31), // sleep
                (reg::PRESCALE, 121),
                (reg::MODE1, 0x21), // wake
                (reg::MODE1, 0xA1), // restart
            ]
        );
        assert_eq!(delay.waits_ms, [1]);
        assert_eq!(pca.frequency(), 50);
        assert!(pca.is_open());
    }

    #[test]
    fn test_open_clamps_frequency() {
        let pca = Pca9685::open(SimBus::new(), ADDRESS, 0, &mut MsDelay::default()).unwrap();
        assert_eq!(pca.frequency(), 40);
    }

    #[test]
    fn test_open_no_device() {
        let result = Pca9685::open(SimBus::new(), 0x41, 50, &mut MsDelay::default());
        assert!(matches!(result, Err(Pca9685Error::DeviceOpen(SimError::Nack))));
    }

    #[test]
    fn test_set_frequency() {
        let mut pca = open();
        sim(&mut pca).writes.clear();

        pca.set_frequency(1000, &mut MsDelay::default()).unwrap();

        assert_eq!(pca.frequency(), 1000);
        assert!(sim(&mut pca).writes.contains(&(reg::PRESCALE, 5)));
    }

    #[test]
    fn test_reset_all_off() {
        let mut pca = open();
        pca.reset().unwrap();

        let all = pca.get_duty(Channel::ALL).unwrap();
        assert_eq!(all, DutyCycle { on: 0, off: 0x1000 });
        assert!(all.is_full_off());
    }

    #[test]
    fn test_set_duty_masks_ticks() {
        let mut pca = open();
        pca.set_duty(Channel::new(3), 0xF123, 0x1FFF).unwrap();

        let duty = pca.get_duty(Channel::new(3)).unwrap();
        assert_eq!(duty, DutyCycle { on: 0x0123, off: 0x0FFF });
        assert!(!duty.is_full_on());
        assert!(!duty.is_full_off());
    }

    #[test]
    fn test_set_duty_is_little_endian() {
        let mut pca = open();
        sim(&mut pca).writes.clear();

        pca.set_duty(Channel::new(1), 0, 291).unwrap();

        assert_eq!(
            sim(&mut pca).writes,
            [(0x0A, 0x00), (0x0B, 0x00), (0x0C, 0x23), (0x0D, 0x01)]
        );
    }

    #[test]
    fn test_pwm_zero_is_full_off() {
        let mut pca = open();
        pca.pwm(Channel::new(2), 300).unwrap();
        pca.pwm(Channel::new(2), 0).unwrap();

        assert!(pca.get_duty(Channel::new(2)).unwrap().is_full_off());
    }

    #[test]
    fn test_pwm_full_period_is_full_on() {
        let mut pca = open();
        pca.pwm(Channel::new(2), 0).unwrap();
        pca.pwm(Channel::new(2), 4096).unwrap();

        let duty = pca.get_duty(Channel::new(2)).unwrap();
        assert!(duty.is_full_on());
        assert!(!duty.is_full_off());
    }

    #[test]
    fn test_pwm_mid_range() {
        let mut pca = open();
        pca.pwm(Channel::new(7), 4096).unwrap();
        pca.pwm(Channel::new(7), 2048).unwrap();

        let duty = pca.get_duty(Channel::new(7)).unwrap();
        assert_eq!(duty, DutyCycle { on: 0, off: 2048 });
        assert_eq!(duty.off_ticks(), 2048);
    }

    #[test]
    fn test_pwm_out_of_range_lengths() {
        let mut pca = open();
        pca.pwm(Channel::new(0), -5).unwrap();
        assert!(pca.get_duty(Channel::new(0)).unwrap().is_full_off());

        pca.pwm(Channel::new(0), 10_000).unwrap();
        assert!(pca.get_duty(Channel::new(0)).unwrap().is_full_on());
    }

    #[test]
    fn test_set_on() {
        let mut pca = open();
        pca.set_on(Channel::new(4), true).unwrap();
        assert!(pca.get_duty(Channel::new(4)).unwrap().is_full_on());

        pca.set_on(Channel::new(4), false).unwrap();
        assert!(pca.get_duty(Channel::new(4)).unwrap().is_full_off());
    }

    #[test]
    fn test_override_preserves_tick_bits() {
        let mut pca = open();
        pca.set_duty(Channel::new(0), 0x0234, 0x0567).unwrap();

        pca.set_full_off(Channel::new(0), true).unwrap();
        assert_eq!(pca.get_duty(Channel::new(0)).unwrap().off, 0x1567);

        pca.set_full_off(Channel::new(0), false).unwrap();
        assert_eq!(pca.get_duty(Channel::new(0)).unwrap().off, 0x0567);
    }

    #[test]
    fn test_bus_error_carries_register() {
        let mut pca = open();
        sim(&mut pca).fail_register = Some(0x0E);

        assert_eq!(
            pca.set_duty(Channel::new(2), 0, 100),
            Err(Pca9685Error::BusIo {
                register: 0x0E,
                source: SimError::Injected
            })
        );
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut pca = open();

        assert!(pca.close().is_some());
        assert!(pca.close().is_none());
        assert!(!pca.is_open());
        assert_eq!(pca.pwm(Channel::new(0), 100), Err(Pca9685Error::Closed));
        assert_eq!(pca.reset(), Err(Pca9685Error::Closed));
    }

    #[test]
    fn test_pwm_output_trait() {
        let mut pca = open();
        PwmOutput::pwm(&mut pca, Channel::new(1), 291).unwrap();
        assert_eq!(pca.get_duty(Channel::new(1)).unwrap(), DutyCycle { on: 0, off: 291 });
    }

    #[test]
    fn test_display() {
        let err: Pca9685Error<SimError> = Pca9685Error::BusIo {
            register: 0xfe,
            source: SimError::Nack,
        };
        assert_eq!(err.to_string(), "pca9685 register 0xfe access failed: Nack");
    }
}
