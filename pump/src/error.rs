use servokit::{InvalidChannel, InvalidPulseWidthRange};
use std::{error::Error, fmt};

#[derive(Debug)]
pub enum SweepError {
	/// Rejected before anything is written to the bus
	InvalidConfiguration(String),
	HardwareCommunication(Box<dyn Error + Send + Sync>),
	/// Cancelled by a signal. Servos stay at their last commanded angle.
	Interrupted,
}

impl SweepError {
	pub fn hardware<E: Into<Box<dyn Error + Send + Sync>>>(e: E) -> Self {
		SweepError::HardwareCommunication(e.into())
	}

	pub fn exit_code(&self) -> i32 {
		match self {
			SweepError::HardwareCommunication(_) => 1,
			SweepError::InvalidConfiguration(_) => 2,
			SweepError::Interrupted => 130,
		}
	}
}

impl fmt::Display for SweepError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			SweepError::InvalidConfiguration(reason) => write!(f, "Invalid configuration: {}", reason),
			SweepError::HardwareCommunication(e) => write!(f, "Hardware communication failure: {}", e),
			SweepError::Interrupted => write!(f, "Sweep interrupted"),
		}
	}
}

impl Error for SweepError {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		match self {
			SweepError::HardwareCommunication(e) => Some(&**e),
			_ => None,
		}
	}
}

impl From<InvalidChannel> for SweepError {
	fn from(e: InvalidChannel) -> Self {
		SweepError::InvalidConfiguration(e.to_string())
	}
}

impl From<InvalidPulseWidthRange> for SweepError {
	fn from(e: InvalidPulseWidthRange) -> Self {
		SweepError::InvalidConfiguration(e.to_string())
	}
}
