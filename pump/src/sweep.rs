use crate::error::SweepError;
use embedded_hal::blocking::delay::DelayMs;
use serde::{Deserialize, Serialize};
use servokit::{
	angle_in_range, pulse_width_range, Channel, PulseWidthRange, ServoDriver, ACTUATION_RANGE,
	SERVO_FREQUENCY_HZ,
};
use std::iter::once;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActuatorConfig {
	pub channel: i64,
	pub release_angle: f64,
}

/// Two servos mounted mirrored to each other. The first one pulls towards larger angles, the
/// second one towards smaller angles, both by `distance` degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
	pub first: ActuatorConfig,
	pub second: ActuatorConfig,
	pub distance: u32,
	pub step: u32,
	pub step_delay_ms: u32,
	pub settle_delay_ms: u32,
	/// Move to the pull position and settle before sweeping
	pub pull_first: bool,
}

impl Default for SweepConfig {
	fn default() -> Self {
		SweepConfig {
			first: ActuatorConfig {
				channel: 7,
				release_angle: 60.,
			},
			second: ActuatorConfig {
				channel: 6,
				release_angle: 120.,
			},
			distance: 105,
			step: 5,
			step_delay_ms: 10,
			settle_delay_ms: 500,
			pull_first: false,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Actuator {
	pub channel: Channel,
	pub pulse_width_range: PulseWidthRange,
	pub release_angle: f64,
	/// +1 when pulling increases the angle, -1 otherwise
	direction: f64,
}

impl Actuator {
	fn new(config: &ActuatorConfig, direction: f64) -> Result<Self, SweepError> {
		let channel = Channel::new(config.channel)?;

		Ok(Actuator {
			channel,
			pulse_width_range: pulse_width_range(channel)?,
			release_angle: config.release_angle,
			direction,
		})
	}

	/// Angle `offset` degrees away from the release angle, towards the pull angle.
	pub fn angle_at(&self, offset: u32) -> f64 {
		self.release_angle + self.direction * offset as f64
	}

	fn command<D: ServoDriver>(&self, driver: &mut D, degrees: f64) -> Result<(), SweepError> {
		driver.set_angle(self.channel, degrees).map_err(SweepError::hardware)
	}
}

/// Validated sweep, ready to be run against a servo driver.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepPlan {
	first: Actuator,
	second: Actuator,
	distance: u32,
	step: u32,
	step_delay_ms: u32,
	settle_delay_ms: u32,
	pull_first: bool,
}

impl SweepPlan {
	pub fn new(config: &SweepConfig) -> Result<Self, SweepError> {
		let first = Actuator::new(&config.first, 1.)?;
		let second = Actuator::new(&config.second, -1.)?;

		if first.channel == second.channel {
			return Err(SweepError::InvalidConfiguration(
				format!("Both actuators are on channel {}", first.channel)));
		}

		if config.step == 0 {
			return Err(SweepError::InvalidConfiguration(String::from("Step must be at least 1 degree")));
		}

		let plan = SweepPlan {
			first,
			second,
			distance: config.distance,
			step: config.step,
			step_delay_ms: config.step_delay_ms,
			settle_delay_ms: config.settle_delay_ms,
			pull_first: config.pull_first,
		};

		plan.check_angles()?;

		Ok(plan)
	}

	fn check_angles(&self) -> Result<(), SweepError> {
		let pull = if self.pull_first { Some(self.pull_angles()) } else { None };

		// Lazy, the ramp leaves the valid range after at most 181 degrees
		let mut angles = once((self.first.release_angle, self.second.release_angle))
			.chain(pull)
			.chain(self.steps())
			.flat_map(|(first, second)| once(first).chain(once(second)));

		match angles.find(|&angle| !angle_in_range(angle)) {
			Some(angle) => Err(SweepError::InvalidConfiguration(
				format!("Angle {} is outside of 0 to {} degrees", angle, ACTUATION_RANGE))),
			None => Ok(()),
		}
	}

	pub fn first(&self) -> &Actuator {
		&self.first
	}

	pub fn second(&self) -> &Actuator {
		&self.second
	}

	pub fn pull_angles(&self) -> (f64, f64) {
		(self.first.angle_at(self.distance), self.second.angle_at(self.distance))
	}

	/// Offsets from the release angles, `distance` excluded.
	pub fn offsets(&self) -> impl Iterator<Item=u32> {
		(0..self.distance).step_by(self.step as usize)
	}

	/// Angles commanded to the first and second actuator at each step.
	pub fn steps(&self) -> impl Iterator<Item=(f64, f64)> + '_ {
		self.offsets()
			.map(move |offset| (self.first.angle_at(offset), self.second.angle_at(offset)))
	}

	/// Calibrates both channels, steps through `steps()`, waits for the mechanism to settle and
	/// commands the release angles.
	///
	/// `interrupted` is checked before every step and around the settle delay. Once it is set no
	/// further command is issued.
	pub fn run<D, T>(&self, driver: &mut D, delay: &mut T, interrupted: &AtomicBool) -> Result<(), SweepError>
		where D: ServoDriver,
			  T: DelayMs<u32> {
		driver.set_frequency(SERVO_FREQUENCY_HZ).map_err(SweepError::hardware)?;

		for actuator in &[self.first, self.second] {
			driver.calibrate_channel(actuator.channel, actuator.pulse_width_range)
				.map_err(SweepError::hardware)?;
		}

		if self.pull_first {
			let (first, second) = self.pull_angles();
			info!("Pulling to {}° / {}°", first, second);

			self.command(driver, first, second)?;
			delay.delay_ms(self.settle_delay_ms);
		}

		info!("Sweeping channels {} and {} over {}°", self.first.channel, self.second.channel, self.distance);

		for (first, second) in self.steps() {
			Self::check_interrupted(interrupted)?;

			debug!("Step {}° / {}°", first, second);
			self.command(driver, first, second)?;
			delay.delay_ms(self.step_delay_ms);
		}

		Self::check_interrupted(interrupted)?;
		delay.delay_ms(self.settle_delay_ms);
		Self::check_interrupted(interrupted)?;

		self.command(driver, self.first.release_angle, self.second.release_angle)?;
		info!("Released at {}° / {}°", self.first.release_angle, self.second.release_angle);

		Ok(())
	}

	// First actuator always before the second one
	fn command<D: ServoDriver>(&self, driver: &mut D, first: f64, second: f64) -> Result<(), SweepError> {
		self.first.command(driver, first)?;
		self.second.command(driver, second)
	}

	fn check_interrupted(interrupted: &AtomicBool) -> Result<(), SweepError> {
		if interrupted.load(Ordering::SeqCst) {
			warn!("Sweep interrupted, servos left at their last commanded angle");
			Err(SweepError::Interrupted)
		} else {
			Ok(())
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_pull_angles() {
		let plan = SweepPlan::new(&SweepConfig::default()).unwrap();
		assert_eq!(plan.pull_angles(), (165., 15.));
	}

	#[test]
	fn offsets_exclude_distance() {
		let plan = SweepPlan::new(&SweepConfig {
			distance: 12,
			..SweepConfig::default()
		}).unwrap();

		assert_eq!(plan.offsets().collect::<Vec<_>>(), vec![0, 5, 10]);
	}

	#[test]
	fn actuators_move_in_opposite_directions() {
		let plan = SweepPlan::new(&SweepConfig::default()).unwrap();

		assert_eq!(plan.first().angle_at(20), 80.);
		assert_eq!(plan.second().angle_at(20), 100.);
	}
}
