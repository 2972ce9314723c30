#[macro_use]
extern crate log;

mod calibration;
mod channel;
mod servo_kit;

pub use calibration::*;
pub use channel::*;
pub use servo_kit::*;

pub use pca9685::DEFAULT_I2C_ADDRESS;

/// Angle between the two end positions of a servo, in degrees
pub const ACTUATION_RANGE: f64 = 180.;

/// Standard analog servo frame rate (20 ms period)
pub const SERVO_FREQUENCY_HZ: f64 = 50.;

/// Drivers able to position hobby servos.
pub trait ServoDriver {
	type Error: std::error::Error + Send + Sync + 'static;

	/// Sets the PWM frequency shared by every channel.
	fn set_frequency(&mut self, hz: f64) -> Result<(), Self::Error>;

	/// Sets the pulse widths matching 0° and `ACTUATION_RANGE` on `channel`.
	fn calibrate_channel(&mut self, channel: Channel, range: PulseWidthRange) -> Result<(), Self::Error>;

	fn set_angle(&mut self, channel: Channel, degrees: f64) -> Result<(), Self::Error>;
}

pub fn angle_in_range(degrees: f64) -> bool {
	degrees.is_finite() && degrees >= 0. && degrees <= ACTUATION_RANGE
}
