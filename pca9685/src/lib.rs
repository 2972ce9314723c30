//! Driver for the NXP PCA9685 16 channel, 12 bit PWM controller.
//!
//! Written against the blocking I2C traits of `embedded-hal` 0.2 so that it runs on top of
//! `rppal::i2c::I2c` (with the `hal` feature) as well as any test double.

use embedded_hal::blocking::i2c::{Write, WriteRead};
use std::{fmt, thread, time::Duration};

#[allow(dead_code)]
mod constants;

#[allow(dead_code)]
mod registers;

pub use constants::{CHANNEL_COUNT, COUNTER_TICKS, DEFAULT_I2C_ADDRESS, OSCILLATOR_HZ};

#[derive(Debug)]
pub enum Error<E> {
	I2c(E),
	InvalidChannel(u8),
	InvalidFrequency(f64),
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Error::I2c(e) => write!(f, "I2C bus error: {:?}", e),
			Error::InvalidChannel(channel) => write!(f, "Invalid PWM channel {} (expected 0 to {})",
													 channel, CHANNEL_COUNT - 1),
			Error::InvalidFrequency(hz) => write!(f, "PCA9685 cannot output at {} Hz", hz),
		}
	}
}

impl<E: fmt::Debug> std::error::Error for Error<E> {}

/// Prescale value producing the output frequency closest to `hz`, datasheet p. 25.
pub fn prescale_for(hz: f64) -> Option<u8> {
	if !hz.is_finite() || hz <= 0. {
		return None;
	}

	let prescale = (OSCILLATOR_HZ / (COUNTER_TICKS as f64 * hz)).round() - 1.;

	if prescale < constants::PRESCALE_MIN as f64 || prescale > constants::PRESCALE_MAX as f64 {
		None
	} else {
		Some(prescale as u8)
	}
}

pub struct Pca9685<I2C> {
	i2c: I2C,
	address: u8,
	prescale: u8,
}

impl<I2C, E> Pca9685<I2C>
	where I2C: Write<Error=E> + WriteRead<Error=E> {
	pub fn new(i2c: I2C, address: u8) -> Self {
		Self {
			i2c,
			address,
			prescale: constants::PRESCALE_RESET, // Will be overriden by call to `init`
		}
	}

	/// Wakes the chip up with register auto increment enabled and totem pole outputs.
	pub fn init(mut self) -> Result<Self, Error<E>> {
		self.write_register(registers::MODE2, constants::OUTDRV)?;
		self.write_register(registers::MODE1, constants::AI)?;

		self.prescale = self.read_register(registers::PRE_SCALE)?;

		Ok(self)
	}

	/// Gives the bus back. Dropping the driver has the same effect on the bus.
	pub fn release(self) -> I2C {
		self.i2c
	}

	pub fn address(&self) -> u8 {
		self.address
	}

	pub fn prescale(&self) -> u8 {
		self.prescale
	}

	pub fn frequency(&self) -> f64 {
		OSCILLATOR_HZ / (COUNTER_TICKS as f64 * (self.prescale as f64 + 1.))
	}

	pub fn set_frequency(&mut self, hz: f64) -> Result<(), Error<E>> {
		let prescale = prescale_for(hz).ok_or(Error::InvalidFrequency(hz))?;

		// PRE_SCALE can only be written while the oscillator is off
		let mode1 = self.read_register(registers::MODE1)?;
		self.write_register(registers::MODE1, (mode1 & !constants::RESTART) | constants::SLEEP)?;
		self.write_register(registers::PRE_SCALE, prescale)?;

		let awake = mode1 & !(constants::SLEEP | constants::RESTART);
		self.write_register(registers::MODE1, awake)?;

		const OSCILLATOR_STARTUP: Duration = Duration::from_micros(500);
		thread::sleep(OSCILLATOR_STARTUP);

		self.write_register(registers::MODE1, awake | constants::RESTART | constants::AI)?;

		self.prescale = prescale;
		Ok(())
	}

	/// Number of counter ticks `width` lasts at the current frequency.
	pub fn ticks(&self, width: Duration) -> u32 {
		(width.as_secs_f64() * OSCILLATOR_HZ / (self.prescale as f64 + 1.)).round() as u32
	}

	pub fn set_pulse_width(&mut self, channel: u8, width: Duration) -> Result<(), Error<E>> {
		match self.ticks(width) {
			0 => self.set_full_off(channel),
			ticks if ticks >= COUNTER_TICKS as u32 => self.set_full_on(channel),
			ticks => self.set_off_count(channel, ticks as u16),
		}
	}

	/// Output goes high at the start of the period and low after `off` ticks.
	pub fn set_off_count(&mut self, channel: u8, off: u16) -> Result<(), Error<E>> {
		let off = off.min(COUNTER_TICKS - 1);
		self.write_channel(channel, [0, 0, (off & 0xFF) as u8, (off >> 8) as u8])
	}

	pub fn set_full_on(&mut self, channel: u8) -> Result<(), Error<E>> {
		self.write_channel(channel, [0, constants::LED_FULL, 0, 0])
	}

	pub fn set_full_off(&mut self, channel: u8) -> Result<(), Error<E>> {
		self.write_channel(channel, [0, 0, 0, constants::LED_FULL])
	}

	pub fn all_off(&mut self) -> Result<(), Error<E>> {
		self.write_register(registers::ALL_LED_OFF_H, constants::LED_FULL)
	}

	fn write_channel(&mut self, channel: u8, values: [u8; 4]) -> Result<(), Error<E>> {
		if channel >= CHANNEL_COUNT {
			return Err(Error::InvalidChannel(channel));
		}

		let register = registers::LED0_ON_L + registers::LED_STRIDE * channel;

		self.i2c
			.write(self.address, &[register, values[0], values[1], values[2], values[3]])
			.map_err(Error::I2c)
	}

	fn write_register(&mut self, register: u8, value: u8) -> Result<(), Error<E>> {
		self.i2c.write(self.address, &[register, value]).map_err(Error::I2c)
	}

	fn read_register(&mut self, register: u8) -> Result<u8, Error<E>> {
		let mut buffer = [0u8; 1];
		self.i2c.write_read(self.address, &[register], &mut buffer).map_err(Error::I2c)?;

		Ok(buffer[0])
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn prescale_for_servo_frequency() {
		assert_eq!(prescale_for(50.), Some(121));
		assert_eq!(prescale_for(60.), Some(101));
	}

	#[test]
	fn prescale_bounds() {
		assert_eq!(prescale_for(1526.), Some(3));
		assert_eq!(prescale_for(24.), Some(253));
		assert_eq!(prescale_for(2000.), None);
		assert_eq!(prescale_for(20.), None);
		assert_eq!(prescale_for(0.), None);
		assert_eq!(prescale_for(f64::NAN), None);
	}
}
