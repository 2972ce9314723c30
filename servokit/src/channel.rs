use std::{convert::TryFrom, error::Error, fmt};

pub use pca9685::CHANNEL_COUNT;

/// Index of a PWM output of the controller, guaranteed to be in `0..CHANNEL_COUNT`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Channel(u8);

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct InvalidChannel(pub i64);

impl fmt::Display for InvalidChannel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Channel {} does not exist (expected 0 to {})", self.0, CHANNEL_COUNT - 1)
	}
}

impl Error for InvalidChannel {}

impl Channel {
	pub fn new(index: i64) -> Result<Self, InvalidChannel> {
		if (0..CHANNEL_COUNT as i64).contains(&index) {
			Ok(Channel(index as u8))
		} else {
			Err(InvalidChannel(index))
		}
	}

	pub fn index(self) -> u8 {
		self.0
	}

	pub fn all() -> impl Iterator<Item=Channel> {
		(0..CHANNEL_COUNT).map(Channel)
	}
}

impl TryFrom<i64> for Channel {
	type Error = InvalidChannel;

	fn try_from(index: i64) -> Result<Self, Self::Error> {
		Channel::new(index)
	}
}

impl fmt::Display for Channel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}
