#[macro_use]
extern crate anyhow;

#[macro_use]
extern crate log;

mod interrupt;

use anyhow::Context;
use black_box::BlackBox;
use clap::{Arg, ArgMatches, Command};
use pump::config::{self, PumpConfig, TryIntoLevelFilter};
use pump::{SweepError, SweepPlan};
use rppal::hal::Delay;
use rppal::i2c::I2c;
use servokit::ServoKit;

const CONFIG_ARG: &'static str = "config";
const WRITE_CONFIG_ARG: &'static str = "write-config";
const BUS_ARG: &'static str = "bus";
const ADDRESS_ARG: &'static str = "address";
const LOG_LEVEL_ARG: &'static str = "log-level";

fn main() {
	std::env::set_var("RUST_BACKTRACE", "full");

	if let Err(e) = run() {
		eprintln!("Error: {:#}", e);

		let exit_code = e.downcast_ref::<SweepError>()
			.map(SweepError::exit_code)
			.unwrap_or(1);

		std::process::exit(exit_code);
	}
}

fn arguments() -> ArgMatches {
	Command::new("pump")
		.version(env!("CARGO_PKG_VERSION"))
		.about("Sweeps two mirrored servos from their pulled to their released position")
		.arg(Arg::new(CONFIG_ARG)
			.short('c')
			.long(CONFIG_ARG)
			.value_name("FILE")
			.help("JSON configuration file, missing keys take their default value")
			.takes_value(true))
		.arg(Arg::new(WRITE_CONFIG_ARG)
			.long(WRITE_CONFIG_ARG)
			.value_name("FILE")
			.help("Write the effective configuration to FILE and exit")
			.takes_value(true))
		.arg(Arg::new(BUS_ARG)
			.long(BUS_ARG)
			.value_name("N")
			.help("I2C bus of the PCA9685")
			.takes_value(true))
		.arg(Arg::new(ADDRESS_ARG)
			.long(ADDRESS_ARG)
			.value_name("ADDRESS")
			.help("I2C address of the PCA9685 (decimal or 0x hexadecimal)")
			.takes_value(true))
		.arg(Arg::new(LOG_LEVEL_ARG)
			.long(LOG_LEVEL_ARG)
			.value_name("LEVEL")
			.help("none, error, warn, info, debug or all")
			.takes_value(true))
		.get_matches()
}

fn configuration(args: &ArgMatches) -> Result<PumpConfig, SweepError> {
	let mut config = match args.value_of(CONFIG_ARG) {
		Some(path) => config::read(path)
			.map_err(|e| SweepError::InvalidConfiguration(format!("{}: {}", path, e)))?,
		None => PumpConfig::default(),
	};

	if let Some(bus) = args.value_of(BUS_ARG) {
		config.i2c_bus = bus.parse()
			.map_err(|e| SweepError::InvalidConfiguration(format!("Invalid I2C bus \"{}\": {}", bus, e)))?;
	}

	if let Some(address) = args.value_of(ADDRESS_ARG) {
		config.i2c_address = config::parse_address(address)
			.map_err(|e| SweepError::InvalidConfiguration(format!("Invalid I2C address \"{}\": {}", address, e)))?;
	}

	if let Some(level) = args.value_of(LOG_LEVEL_ARG) {
		config.log_level_filter = String::from(level);
	}

	// Applies to the file as well as to `--address`
	config.check_address()?;

	Ok(config)
}

fn run() -> anyhow::Result<()> {
	let args = arguments();
	let config = configuration(&args)?;

	if let Some(path) = args.value_of(WRITE_CONFIG_ARG) {
		config::save(path, &config).map_err(|e| anyhow!("Failed to write {}: {}", path, e))?;
		println!("Configuration written to {}", path);
		return Ok(());
	}

	let level_filter = config.log_level_filter
		.try_into_level_filter()
		.map_err(|_| SweepError::InvalidConfiguration(
			format!("Invalid log level filter \"{}\"", config.log_level_filter)))?;

	// Flushes the log file when dropped, on every return path
	let _black_box = BlackBox::new("pump")
		.context("Failed to create log file")?
		.spawn(level_filter)
		.context("Failed to install logger")?;

	info!("Pump {}", env!("CARGO_PKG_VERSION"));

	let result = sweep(&config);

	if let Err(e) = &result {
		error!("{:#}", e);
	}

	result
}

fn sweep(config: &PumpConfig) -> anyhow::Result<()> {
	// Validated before the bus is opened
	let plan = SweepPlan::new(&config.sweep)?;

	let interrupted = interrupt::install().context("Failed to install signal handlers")?;

	let i2c = I2c::with_bus(config.i2c_bus).map_err(SweepError::hardware)?;

	// The bus is closed when `servo_kit` goes out of scope
	let mut servo_kit = ServoKit::new(i2c, config.i2c_address).map_err(SweepError::hardware)?;

	plan.run(&mut servo_kit, &mut Delay::new(), interrupted)?;

	Ok(())
}
