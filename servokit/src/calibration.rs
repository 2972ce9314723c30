use crate::channel::{Channel, CHANNEL_COUNT};
use std::{error::Error, fmt, time::Duration};

/// Pulse widths a servo reads as its two end positions.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct PulseWidthRange {
	min: Duration,
	max: Duration,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct InvalidPulseWidthRange {
	pub min: Duration,
	pub max: Duration,
}

impl fmt::Display for InvalidPulseWidthRange {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Invalid pulse width range: minimum {} µs is not below maximum {} µs",
			   self.min.as_micros(), self.max.as_micros())
	}
}

impl Error for InvalidPulseWidthRange {}

impl PulseWidthRange {
	pub fn new(min: Duration, max: Duration) -> Result<Self, InvalidPulseWidthRange> {
		if min < max {
			Ok(Self { min, max })
		} else {
			Err(InvalidPulseWidthRange { min, max })
		}
	}

	pub fn from_micros(min: u64, max: u64) -> Result<Self, InvalidPulseWidthRange> {
		Self::new(Duration::from_micros(min), Duration::from_micros(max))
	}

	pub fn min(&self) -> Duration {
		self.min
	}

	pub fn max(&self) -> Duration {
		self.max
	}

	/// Linear interpolation between `min` (0) and `max` (1). `fraction` is clamped.
	pub fn pulse_width(&self, fraction: f64) -> Duration {
		let span = (self.max - self.min).as_nanos() as f64;
		self.min + Duration::from_nanos((span * fraction.max(0.).min(1.)).round() as u64)
	}
}

impl Default for PulseWidthRange {
	/// Range assumed for a servo that was never calibrated
	fn default() -> Self {
		Self {
			min: Duration::from_micros(750),
			max: Duration::from_micros(2250),
		}
	}
}

// Measured on the servo batch fitted to the mechanism, indexed by channel
const MIN_PULSE_WIDTH_US: [u16; CHANNEL_COUNT as usize] =
	[560, 560, 500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 500];
const MAX_PULSE_WIDTH_US: [u16; CHANNEL_COUNT as usize] =
	[2600, 2600, 2500, 2500, 2500, 2500, 2500, 2500, 2500, 2500, 2500, 2500, 2500, 2500, 2500, 2500];

/// Calibrated pulse width range of the servo plugged into `channel`.
pub fn pulse_width_range(channel: Channel) -> Result<PulseWidthRange, InvalidPulseWidthRange> {
	let index = channel.index() as usize;
	PulseWidthRange::from_micros(MIN_PULSE_WIDTH_US[index] as u64, MAX_PULSE_WIDTH_US[index] as u64)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn table_lookup() {
		let first = pulse_width_range(Channel::new(0).unwrap()).unwrap();
		assert_eq!(first.min(), Duration::from_micros(560));
		assert_eq!(first.max(), Duration::from_micros(2600));

		let seventh = pulse_width_range(Channel::new(7).unwrap()).unwrap();
		assert_eq!(seventh.min(), Duration::from_micros(500));
		assert_eq!(seventh.max(), Duration::from_micros(2500));

		assert!(Channel::all().all(|channel| pulse_width_range(channel).is_ok()));
	}

	#[test]
	fn interpolation() {
		let range = PulseWidthRange::from_micros(560, 2600).unwrap();

		assert_eq!(range.pulse_width(0.), Duration::from_micros(560));
		assert_eq!(range.pulse_width(0.5), Duration::from_micros(1580));
		assert_eq!(range.pulse_width(1.), Duration::from_micros(2600));
		assert_eq!(range.pulse_width(1.5), Duration::from_micros(2600));
	}

	#[test]
	fn min_must_be_below_max() {
		assert!(PulseWidthRange::from_micros(2500, 500).is_err());
		assert!(PulseWidthRange::from_micros(1500, 1500).is_err());
	}
}
