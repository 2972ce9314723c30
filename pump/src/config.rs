use crate::error::SweepError;
use crate::sweep::SweepConfig;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use servokit::DEFAULT_I2C_ADDRESS;
use std::error::Error;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::num::ParseIntError;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PumpConfig {
	pub log_level_filter: String,
	pub i2c_bus: u8,
	pub i2c_address: u8,
	pub sweep: SweepConfig,
}

impl Default for PumpConfig {
	fn default() -> Self {
		PumpConfig {
			log_level_filter: String::from("info"),
			i2c_bus: 1,
			i2c_address: DEFAULT_I2C_ADDRESS,
			sweep: SweepConfig::default(),
		}
	}
}

/// Highest 7 bit I2C address
pub const MAX_I2C_ADDRESS: u8 = 0x7F;

impl PumpConfig {
	pub fn check_address(&self) -> Result<(), SweepError> {
		if self.i2c_address > MAX_I2C_ADDRESS {
			Err(SweepError::InvalidConfiguration(format!(
				"I2C address {:#04x} is above {:#04x}", self.i2c_address, MAX_I2C_ADDRESS)))
		} else {
			Ok(())
		}
	}
}

pub trait TryIntoLevelFilter {
	fn try_into_level_filter(&self) -> Result<LevelFilter, ()>;
}

impl TryIntoLevelFilter for str {
	fn try_into_level_filter(&self) -> Result<LevelFilter, ()> {
		Ok(match self {
			"none" => LevelFilter::Off,
			"error" => LevelFilter::Error,
			"warn" => LevelFilter::Warn,
			"info" => LevelFilter::Info,
			"debug" => LevelFilter::Debug,
			"all" => LevelFilter::Trace,
			_ => return Err(()),
		})
	}
}

impl TryIntoLevelFilter for String {
	fn try_into_level_filter(&self) -> Result<LevelFilter, ()> {
		self.as_str().try_into_level_filter()
	}
}

/// Accepts decimal (`64`) and hexadecimal (`0x40`) addresses.
pub fn parse_address(address: &str) -> Result<u8, ParseIntError> {
	let address = address.trim();

	match address.strip_prefix("0x").or_else(|| address.strip_prefix("0X")) {
		Some(hex) => u8::from_str_radix(hex, 16),
		None => address.parse(),
	}
}

/// Missing keys take their default value.
pub fn read<P: AsRef<Path>>(path: P) -> Result<PumpConfig, Box<dyn Error + Send + Sync>> {
	let config_file = File::open(path)?;

	let config: PumpConfig = serde_json::from_reader(config_file)?;

	Ok(config)
}

pub fn save<P: AsRef<Path>>(path: P, config: &PumpConfig) -> Result<(), Box<dyn Error + Send + Sync>> {
	let mut config_file = OpenOptions::new()
		.create(true)
		.write(true)
		.truncate(true)
		.open(path)?;

	writeln!(config_file, "{}", serde_json::to_string_pretty(config)?)?;

	Ok(())
}
