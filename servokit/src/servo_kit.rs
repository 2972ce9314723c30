use crate::{
	angle_in_range,
	calibration::PulseWidthRange,
	channel::{Channel, CHANNEL_COUNT},
	ServoDriver, ACTUATION_RANGE,
};
use embedded_hal::blocking::i2c::{Write, WriteRead};
use pca9685::Pca9685;
use std::{fmt, time::Duration};

#[derive(Debug)]
pub enum Error<E> {
	Pca9685(pca9685::Error<E>),
	AngleOutOfRange {
		channel: Channel,
		angle: f64,
	},
}

impl<E> From<pca9685::Error<E>> for Error<E> {
	fn from(e: pca9685::Error<E>) -> Self {
		Error::Pca9685(e)
	}
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Error::Pca9685(e) => write!(f, "PCA9685: {}", e),
			Error::AngleOutOfRange { channel, angle } =>
				write!(f, "Angle {} out of range for servo {} (expected 0 to {})", angle, channel, ACTUATION_RANGE),
		}
	}
}

impl<E: fmt::Debug> std::error::Error for Error<E> {}

/// Up to 16 servos driven by a PCA9685 board.
pub struct ServoKit<I2C> {
	pca: Pca9685<I2C>,
	ranges: [PulseWidthRange; CHANNEL_COUNT as usize],
}

impl<I2C, E> ServoKit<I2C>
	where I2C: Write<Error=E> + WriteRead<Error=E> {
	pub fn new(i2c: I2C, address: u8) -> Result<Self, Error<E>> {
		let pca = Pca9685::new(i2c, address).init()?;

		info!("PCA9685 at 0x{:02x} ready ({:.1} Hz)", address, pca.frequency());

		Ok(Self {
			pca,
			ranges: [PulseWidthRange::default(); CHANNEL_COUNT as usize],
		})
	}

	/// Gives the bus back. Outputs keep their last pulse width.
	pub fn release(self) -> I2C {
		self.pca.release()
	}

	pub fn frequency(&self) -> f64 {
		self.pca.frequency()
	}

	pub fn pulse_width_range(&self, channel: Channel) -> PulseWidthRange {
		self.ranges[channel.index() as usize]
	}

	pub fn pulse_width(&self, channel: Channel, degrees: f64) -> Result<Duration, Error<E>> {
		if !angle_in_range(degrees) {
			return Err(Error::AngleOutOfRange { channel, angle: degrees });
		}

		Ok(self.pulse_width_range(channel).pulse_width(degrees / ACTUATION_RANGE))
	}
}

impl<I2C, E> ServoDriver for ServoKit<I2C>
	where I2C: Write<Error=E> + WriteRead<Error=E>,
		  E: fmt::Debug + Send + Sync + 'static {
	type Error = Error<E>;

	fn set_frequency(&mut self, hz: f64) -> Result<(), Self::Error> {
		self.pca.set_frequency(hz)?;

		debug!("PWM frequency set to {} Hz (prescale {})", hz, self.pca.prescale());
		Ok(())
	}

	fn calibrate_channel(&mut self, channel: Channel, range: PulseWidthRange) -> Result<(), Self::Error> {
		self.ranges[channel.index() as usize] = range;

		debug!("Servo {} calibrated to {} µs .. {} µs", channel, range.min().as_micros(), range.max().as_micros());
		Ok(())
	}

	fn set_angle(&mut self, channel: Channel, degrees: f64) -> Result<(), Self::Error> {
		let pulse_width = self.pulse_width(channel, degrees)?;

		trace!("Servo {}: {}° ({} µs)", channel, degrees, pulse_width.as_micros());
		self.pca.set_pulse_width(channel.index(), pulse_width)?;

		Ok(())
	}
}
