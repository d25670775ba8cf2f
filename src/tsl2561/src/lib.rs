//! Platform-agnostic driver for the TAOS TSL2561 light-to-digital sensor.
//!
//! The TSL2561 exposes two photodiode channels over I²C: channel 0 senses
//! broadband (visible + infrared) light, channel 1 infrared only. This
//! driver manages the sensor's power state, integration time and analog
//! gain, and converts the raw channel counts into illuminance using either
//! the floating-point empirical formulas ([`Tsl2561::read_lux`]) or the
//! integer-only lookup-table method ([`Tsl2561::read_lux_fixed_point`])
//! from the TAOS datasheet.
//!
//! The driver is built on the blocking [`embedded-hal`] 1.0 traits and
//! never constructs its own transport: the I²C bus and delay provider are
//! injected by the platform layer. Acquisition is synchronous; each read
//! blocks for the settling delay of the configured integration time, up to
//! 450 ms.
//!
//! ## Supported features
//! * Power management around every acquisition
//! * Configurable integration time (13.7 ms / 101 ms / 402 ms) and gain
//!   (1× / 16×), written through to the device transactionally
//! * All four sensor packages (T, FN, CL, CS), selecting the matching
//!   calibration tables
//! * Reading the part number / revision ID
//!
//! ## Unsupported features
//! * Interrupt and threshold functionality
//! * Manual integration timing
//!
//! [`embedded-hal`]: https://crates.io/crates/embedded-hal

#![cfg_attr(not(test), no_std)]
#![deny(unused_must_use)]

pub mod lux;
pub mod registers;

pub use lux::{empirical_lux, fixed_point_lux, Gain, IntegrationTime, Package};

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use registers::{
    COMMAND_BIT, CONTROL_POWEROFF, CONTROL_POWERON, REGISTER_CHAN0_LOW, REGISTER_CHAN1_LOW,
    REGISTER_CONTROL, REGISTER_ID, REGISTER_TIMING, WORD_BIT,
};

/// A raw configuration value outside the enumerated set.
///
/// Returned by the `TryFrom<u8>` conversions of [`Gain`],
/// [`IntegrationTime`] and [`Package`]; surfaces from the driver as
/// [`Error::InvalidConfiguration`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidConfiguration;

/// Errors that may occur while interacting with the TSL2561 sensor.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// I²C bus error.
    ///
    /// Propagated immediately; the driver never retries. No device or
    /// in-memory state is updated by the failed operation.
    Bus(E),
    /// A gain, integration-time or package value outside the enumerated
    /// set. Rejected before any bus access.
    InvalidConfiguration,
}

impl<E> From<E> for Error<E> {
    fn from(e: E) -> Self {
        Error::Bus(e)
    }
}

/// I²C address of the TSL2561, selected by the ADDR-SEL pin.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Address {
    /// 0x29: ADDR-SEL tied to GND.
    Gnd = 0x29,
    /// 0x39: ADDR-SEL floating.
    Float = 0x39,
    /// 0x49: ADDR-SEL tied to VDD.
    Vdd = 0x49,
}

impl Default for Address {
    fn default() -> Self {
        Self::Float
    }
}

const fn command(register: u8) -> u8 {
    COMMAND_BIT | register
}

const fn command_word(register: u8) -> u8 {
    COMMAND_BIT | WORD_BIT | register
}

/// TSL2561 driver.
///
/// Owns its bus handle exclusively; callers sharing the bus across threads
/// must serialize access externally. The in-memory gain and integration
/// time always match the last confirmed timing-register write.
pub struct Tsl2561<I2C, D> {
    i2c: I2C,
    delay: D,
    address: Address,
    package: Package,
    integration_time: IntegrationTime,
    gain: Gain,
}

impl<I2C, E, D> Tsl2561<I2C, D>
where
    I2C: I2c<Error = E>,
    D: DelayNs,
{
    /// Creates a new [`Tsl2561`] driver with the given I²C bus, delay
    /// provider, address and sensor package.
    ///
    /// Defaults to 402 ms integration time and 1× gain, matching the
    /// device's power-on state. No bus traffic happens until the first
    /// operation.
    #[must_use]
    pub fn new(i2c: I2C, delay: D, address: Address, package: Package) -> Self {
        Self {
            i2c,
            delay,
            address,
            package,
            integration_time: IntegrationTime::Ms402,
            gain: Gain::Low,
        }
    }

    /// Releases the bus and delay provider.
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    /// Currently configured gain.
    #[must_use]
    pub fn gain(&self) -> Gain {
        self.gain
    }

    /// Currently configured integration time.
    #[must_use]
    pub fn integration_time(&self) -> IntegrationTime {
        self.integration_time
    }

    /// Sensor package the driver was constructed for.
    #[must_use]
    pub fn package(&self) -> Package {
        self.package
    }

    /// Reads the part number and revision ID register.
    ///
    /// Upper nibble is the part number, lower nibble the revision. The
    /// device is powered down afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bus`] if the underlying I²C operation fails.
    pub fn read_id(&mut self) -> Result<u8, Error<E>> {
        let id = self.read_u8(command(REGISTER_ID))?;
        self.disable()?;
        Ok(id)
    }

    /// Triggers an integration cycle and reads both raw channels.
    ///
    /// Powers the sensor up, blocks for the settling delay of the
    /// configured integration time, reads the broadband and infrared
    /// channel words, and powers the sensor back down. Every call produces
    /// a fresh reading.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bus`] if the underlying I²C operation fails; the
    /// sensor may then be left powered up.
    pub fn read_raw_luminosity(&mut self) -> Result<(u16, u16), Error<E>> {
        self.enable()?;
        self.delay
            .delay_ms(self.integration_time.settling_delay_ms());

        let broadband = self.read_u16_le(command_word(REGISTER_CHAN0_LOW))?;
        let infrared = self.read_u16_le(command_word(REGISTER_CHAN1_LOW))?;

        self.disable()?;

        Ok((broadband, infrared))
    }

    /// Reads the sensor and computes illuminance with the floating-point
    /// empirical engine.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bus`] if the underlying I²C operation fails.
    pub fn read_lux(&mut self) -> Result<f64, Error<E>> {
        let (ch0, ch1) = self.read_raw_luminosity()?;

        Ok(lux::empirical_lux(
            ch0,
            ch1,
            self.gain,
            self.integration_time,
            self.package,
        ))
    }

    /// Reads the sensor and computes illuminance with the integer-only
    /// lookup-table engine.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bus`] if the underlying I²C operation fails.
    pub fn read_lux_fixed_point(&mut self) -> Result<u32, Error<E>> {
        let (ch0, ch1) = self.read_raw_luminosity()?;

        Ok(lux::fixed_point_lux(
            ch0,
            ch1,
            self.gain,
            self.integration_time,
            self.package,
        ))
    }

    /// Sets the integration time.
    ///
    /// Writes the combined timing byte to the device (power cycled around
    /// the write) and commits the in-memory value only once the write has
    /// succeeded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bus`] if the underlying I²C operation fails; the
    /// in-memory configuration is then left unchanged.
    pub fn set_integration_time(
        &mut self,
        integration_time: IntegrationTime,
    ) -> Result<(), Error<E>> {
        self.write_timing(self.gain, integration_time)
    }

    /// Sets the analog gain.
    ///
    /// Writes the combined timing byte to the device (power cycled around
    /// the write) and commits the in-memory value only once the write has
    /// succeeded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bus`] if the underlying I²C operation fails; the
    /// in-memory configuration is then left unchanged.
    pub fn set_gain(&mut self, gain: Gain) -> Result<(), Error<E>> {
        self.write_timing(gain, self.integration_time)
    }

    /// Sets the integration time from a raw register code.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] without touching the bus if
    /// the code is not one of the enumerated integration times, or
    /// [`Error::Bus`] if the write fails.
    pub fn set_integration_time_raw(&mut self, code: u8) -> Result<(), Error<E>> {
        let integration_time =
            IntegrationTime::try_from(code).map_err(|_| Error::InvalidConfiguration)?;
        self.set_integration_time(integration_time)
    }

    /// Sets the gain from a raw register code.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] without touching the bus if
    /// the code is not one of the enumerated gains, or [`Error::Bus`] if
    /// the write fails.
    pub fn set_gain_raw(&mut self, code: u8) -> Result<(), Error<E>> {
        let gain = Gain::try_from(code).map_err(|_| Error::InvalidConfiguration)?;
        self.set_gain(gain)
    }

    /// Reads back the timing register.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bus`] if the underlying I²C operation fails.
    pub fn read_timing_register(&mut self) -> Result<u8, Error<E>> {
        self.read_u8(command(REGISTER_TIMING))
    }

    fn write_timing(
        &mut self,
        gain: Gain,
        integration_time: IntegrationTime,
    ) -> Result<(), Error<E>> {
        self.enable()?;
        self.write_byte(
            command(REGISTER_TIMING),
            gain.bits() | integration_time.bits(),
        )?;
        // The write is confirmed; from here the in-memory state must track
        // the device even if the power-down below fails.
        self.gain = gain;
        self.integration_time = integration_time;
        self.disable()
    }

    fn enable(&mut self) -> Result<(), Error<E>> {
        self.write_byte(command(REGISTER_CONTROL), CONTROL_POWERON)
    }

    fn disable(&mut self) -> Result<(), Error<E>> {
        self.write_byte(command(REGISTER_CONTROL), CONTROL_POWEROFF)
    }

    fn write_byte(&mut self, register: u8, value: u8) -> Result<(), Error<E>> {
        self.i2c.write(self.address as u8, &[register, value])?;

        Ok(())
    }

    fn read_u8(&mut self, register: u8) -> Result<u8, Error<E>> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(self.address as u8, &[register], &mut buf)?;

        Ok(buf[0])
    }

    fn read_u16_le(&mut self, register: u8) -> Result<u16, Error<E>> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(self.address as u8, &[register], &mut buf)?;

        Ok(u16::from_le_bytes(buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

    const ADDR: u8 = 0x39;

    fn driver(mock: I2cMock) -> Tsl2561<I2cMock, NoopDelay> {
        Tsl2561::new(mock, NoopDelay, Address::Float, Package::T)
    }

    #[test]
    fn raw_luminosity_power_cycles_and_reads_both_channels() {
        let expectations = [
            I2cTransaction::write(ADDR, vec![0x80, 0x03]),
            I2cTransaction::write_read(ADDR, vec![0xAC], vec![0x34, 0x12]),
            I2cTransaction::write_read(ADDR, vec![0xAE], vec![0x78, 0x56]),
            I2cTransaction::write(ADDR, vec![0x80, 0x00]),
        ];
        let mut tsl = driver(I2cMock::new(&expectations));

        let (broadband, infrared) = tsl.read_raw_luminosity().unwrap();
        assert_eq!(broadband, 0x1234);
        assert_eq!(infrared, 0x5678);

        let (mut mock, _) = tsl.release();
        mock.done();
    }

    #[test]
    fn read_id_reads_register_and_powers_down() {
        let expectations = [
            I2cTransaction::write_read(ADDR, vec![0x8A], vec![0x50]),
            I2cTransaction::write(ADDR, vec![0x80, 0x00]),
        ];
        let mut tsl = driver(I2cMock::new(&expectations));

        assert_eq!(tsl.read_id().unwrap(), 0x50);

        let (mut mock, _) = tsl.release();
        mock.done();
    }

    #[test]
    fn set_gain_writes_timing_byte_and_commits() {
        let expectations = [
            I2cTransaction::write(ADDR, vec![0x80, 0x03]),
            I2cTransaction::write(ADDR, vec![0x81, 0x12]),
            I2cTransaction::write(ADDR, vec![0x80, 0x00]),
            I2cTransaction::write_read(ADDR, vec![0x81], vec![0x12]),
        ];
        let mut tsl = driver(I2cMock::new(&expectations));

        tsl.set_gain(Gain::High).unwrap();
        assert_eq!(tsl.gain(), Gain::High);
        // Read-back reflects the gain bit and the 402 ms code.
        assert_eq!(tsl.read_timing_register().unwrap(), 0x12);

        let (mut mock, _) = tsl.release();
        mock.done();
    }

    #[test]
    fn set_integration_time_keeps_gain_bits() {
        let expectations = [
            // set_gain(High): 0x10 | 0x02
            I2cTransaction::write(ADDR, vec![0x80, 0x03]),
            I2cTransaction::write(ADDR, vec![0x81, 0x12]),
            I2cTransaction::write(ADDR, vec![0x80, 0x00]),
            // set_integration_time(Ms13): 0x10 | 0x00
            I2cTransaction::write(ADDR, vec![0x80, 0x03]),
            I2cTransaction::write(ADDR, vec![0x81, 0x10]),
            I2cTransaction::write(ADDR, vec![0x80, 0x00]),
        ];
        let mut tsl = driver(I2cMock::new(&expectations));

        tsl.set_gain(Gain::High).unwrap();
        tsl.set_integration_time(IntegrationTime::Ms13).unwrap();
        assert_eq!(tsl.gain(), Gain::High);
        assert_eq!(tsl.integration_time(), IntegrationTime::Ms13);

        let (mut mock, _) = tsl.release();
        mock.done();
    }

    #[test]
    fn invalid_raw_gain_is_rejected_before_any_bus_write() {
        let expectations = [I2cTransaction::write_read(ADDR, vec![0x81], vec![0x02])];
        let mut tsl = driver(I2cMock::new(&expectations));

        assert_eq!(tsl.set_gain_raw(0x05), Err(Error::InvalidConfiguration));
        // Prior configuration is untouched, on the device and in memory.
        assert_eq!(tsl.gain(), Gain::Low);
        assert_eq!(tsl.read_timing_register().unwrap(), 0x02);

        let (mut mock, _) = tsl.release();
        mock.done();
    }

    #[test]
    fn invalid_raw_integration_time_is_rejected() {
        let mut tsl = driver(I2cMock::new(&[]));

        assert_eq!(
            tsl.set_integration_time_raw(0x03),
            Err(Error::InvalidConfiguration)
        );
        assert_eq!(tsl.integration_time(), IntegrationTime::Ms402);

        let (mut mock, _) = tsl.release();
        mock.done();
    }

    #[test]
    fn failed_timing_write_leaves_state_unchanged() {
        let expectations = [
            I2cTransaction::write(ADDR, vec![0x80, 0x03]),
            I2cTransaction::write(ADDR, vec![0x81, 0x12]).with_error(ErrorKind::Other),
        ];
        let mut tsl = driver(I2cMock::new(&expectations));

        assert_eq!(tsl.set_gain(Gain::High), Err(Error::Bus(ErrorKind::Other)));
        // The write was not confirmed; in-memory state still matches the
        // device's power-on configuration.
        assert_eq!(tsl.gain(), Gain::Low);
        assert_eq!(tsl.integration_time(), IntegrationTime::Ms402);

        let (mut mock, _) = tsl.release();
        mock.done();
    }

    #[test]
    fn read_lux_applies_first_band_formula() {
        // ch0 = 1000, ch1 = 300: ratio 0.3 falls in the first band of the
        // T/FN/CL empirical table.
        let expectations = [
            I2cTransaction::write(ADDR, vec![0x80, 0x03]),
            I2cTransaction::write_read(ADDR, vec![0xAC], vec![0xE8, 0x03]),
            I2cTransaction::write_read(ADDR, vec![0xAE], vec![0x2C, 0x01]),
            I2cTransaction::write(ADDR, vec![0x80, 0x00]),
        ];
        let mut tsl = driver(I2cMock::new(&expectations));

        let lux = tsl.read_lux().unwrap();
        let expected = 0.0304 * 1000.0 - 0.062 * 1000.0 * libm::pow(0.3, 1.4);
        assert!((lux - expected).abs() < 1e-9);

        let (mut mock, _) = tsl.release();
        mock.done();
    }

    #[test]
    fn zero_broadband_reading_is_zero_lux_from_both_engines() {
        let acquisition = [
            I2cTransaction::write(ADDR, vec![0x80, 0x03]),
            I2cTransaction::write_read(ADDR, vec![0xAC], vec![0x00, 0x00]),
            I2cTransaction::write_read(ADDR, vec![0xAE], vec![0xFF, 0xFF]),
            I2cTransaction::write(ADDR, vec![0x80, 0x00]),
        ];
        let expectations: Vec<_> = acquisition
            .iter()
            .chain(acquisition.iter())
            .cloned()
            .collect();
        let mut tsl = driver(I2cMock::new(&expectations));

        assert_eq!(tsl.read_lux().unwrap(), 0.0);
        assert_eq!(tsl.read_lux_fixed_point().unwrap(), 0);

        let (mut mock, _) = tsl.release();
        mock.done();
    }

    #[test]
    fn bus_fault_during_acquisition_propagates() {
        let expectations =
            [I2cTransaction::write(ADDR, vec![0x80, 0x03]).with_error(ErrorKind::Other)];
        let mut tsl = driver(I2cMock::new(&expectations));

        assert_eq!(
            tsl.read_raw_luminosity(),
            Err(Error::Bus(ErrorKind::Other))
        );

        let (mut mock, _) = tsl.release();
        mock.done();
    }
}
