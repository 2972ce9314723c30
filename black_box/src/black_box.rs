use chrono::{Datelike, Timelike};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::{
	collections::VecDeque,
	error::Error,
	fs::{File, OpenOptions},
	io::{self, Write},
	path::{Path, PathBuf},
	sync::atomic::{AtomicBool, Ordering},
	thread,
	thread::JoinHandle,
	time::{Duration, Instant},
};

lazy_static! {
	static ref BLACK_BOX_CHANNEL: (Sender<Message>, Receiver<Message>) = unbounded::<Message>();
	static ref BLACK_BOX_LOGGER: BlackBoxLogger = BlackBoxLogger {
		start_instant: Instant::now(),
		closed: AtomicBool::new(false),
	};
}

enum Message {
	Log(String),
	Flush,
	Close,
}

/// Log sink echoing every record on stdout and keeping a copy in a file named after the
/// program and the time it started.
pub struct BlackBox {
	file: File,
	path: PathBuf,
	buffer: VecDeque<String>,
}

impl BlackBox {
	pub fn new(program: &str) -> io::Result<Self> {
		Self::in_directory(".", program)
	}

	pub fn in_directory<P: AsRef<Path>>(directory: P, program: &str) -> io::Result<Self> {
		let path = directory
			.as_ref()
			.join(log_file_name(program, &chrono::offset::Local::now()));

		let file = OpenOptions::new()
			.write(true)
			.create(true)
			.truncate(true)
			.open(&path)?;

		Ok(BlackBox {
			file,
			path,
			buffer: VecDeque::<String>::new(),
		})
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	fn try_flush(&mut self) {
		if let Err(e) = self.flush() {
			self.buffer
				.push_back(format!("Failed to flush black box: {}", e));
		}
	}

	fn flush(&mut self) -> Result<(), Box<dyn Error>> {
		while let Some(message) = self.buffer.pop_front() {
			println!("{}", message);
			writeln!(self.file, "{}", message)?;
		}
		self.file.flush()?;
		Ok(())
	}

	fn receive_loop(&mut self) {
		const FLUSH_PERIOD: Duration = Duration::from_millis(500);
		const MAX_BUFFER_LEN: usize = 8;

		loop {
			match BLACK_BOX_CHANNEL.1.recv_timeout(FLUSH_PERIOD) {
				Ok(Message::Log(content)) => self.buffer.push_back(content),
				Ok(Message::Flush) | Err(RecvTimeoutError::Timeout) => self.try_flush(),
				Ok(Message::Close) | Err(RecvTimeoutError::Disconnected) => break,
			}

			if self.buffer.len() > MAX_BUFFER_LEN {
				self.try_flush();
			}
		}

		self.try_flush();
	}

	/// Installs the black box as the global logger. Records are written until the returned
	/// guard is dropped.
	pub fn spawn(mut self, level_filter: LevelFilter) -> Result<BlackBoxGuard, SetLoggerError> {
		log::set_logger(&*BLACK_BOX_LOGGER).map(|()| log::set_max_level(level_filter))?;

		Ok(BlackBoxGuard {
			handle: Some(thread::spawn(move || self.receive_loop())),
		})
	}
}

/// Flushes the black box and waits for its thread on drop.
pub struct BlackBoxGuard {
	handle: Option<JoinHandle<()>>,
}

impl Drop for BlackBoxGuard {
	fn drop(&mut self) {
		BLACK_BOX_LOGGER.closed.store(true, Ordering::SeqCst);
		let _ = BLACK_BOX_CHANNEL.0.send(Message::Close);

		if let Some(handle) = self.handle.take() {
			let _ = handle.join();
		}
	}
}

/// `<program>_<hour>-<minute>-<second>_<day>-<month>-<year>.log`
pub fn log_file_name<T: Datelike + Timelike>(program: &str, time: &T) -> String {
	format!(
		"{}_{}-{}-{}_{}-{}-{}.log",
		program,
		time.hour(),
		time.minute(),
		time.second(),
		time.day(),
		time.month(),
		time.year()
	)
}

fn format(record: &Record, elapsed: Duration) -> String {
	if record.level() == Level::Error {
		format!(
			"[{:.3}][{:?}][{}] {} ({}:{})",
			elapsed.as_secs_f32(),
			record.level(),
			record.module_path().unwrap_or("unknown"),
			record.args(),
			record.file().unwrap_or("unknown"),
			record.line().unwrap_or(0)
		)
	} else {
		format!(
			"[{:.3}][{:?}][{}] {}",
			elapsed.as_secs_f32(),
			record.level(),
			record.module_path().unwrap_or("unknown"),
			record.args(),
		)
	}
}

struct BlackBoxLogger {
	start_instant: Instant,
	/// Set once the receiving thread is gone
	closed: AtomicBool,
}

impl Log for BlackBoxLogger {
	fn enabled(&self, metadata: &Metadata) -> bool {
		metadata.level() <= log::max_level() && !self.closed.load(Ordering::SeqCst)
	}

	fn log(&self, record: &Record) {
		if self.enabled(record.metadata()) {
			let formatted = format(record, Instant::now() - self.start_instant);
			let _ = BLACK_BOX_CHANNEL.0.send(Message::Log(formatted));
		}
	}

	fn flush(&self) {
		if !self.closed.load(Ordering::SeqCst) {
			let _ = BLACK_BOX_CHANNEL.0.send(Message::Flush);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::NaiveDate;

	#[test]
	fn file_name() {
		let time = NaiveDate::from_ymd_opt(2026, 10, 16)
			.and_then(|date| date.and_hms_opt(9, 5, 3))
			.unwrap();

		assert_eq!(log_file_name("pump", &time), "pump_9-5-3_16-10-2026.log");
	}

	#[test]
	fn record_format() {
		let line = format(
			&Record::builder()
				.args(format_args!("Sweep done"))
				.level(Level::Info)
				.module_path(Some("pump::sweep"))
				.build(),
			Duration::from_millis(1500),
		);

		assert_eq!(line, "[1.500][Info][pump::sweep] Sweep done");
	}

	#[test]
	fn error_format_has_location() {
		let line = format(
			&Record::builder()
				.args(format_args!("Bus fault"))
				.level(Level::Error)
				.module_path(Some("pump"))
				.file(Some("src/main.rs"))
				.line(Some(42))
				.build(),
			Duration::from_millis(250),
		);

		assert_eq!(line, "[0.250][Error][pump] Bus fault (src/main.rs:42)");
	}

	#[test]
	fn nothing_is_queued_once_closed() {
		log::set_max_level(LevelFilter::Trace);

		let logger = BlackBoxLogger {
			start_instant: Instant::now(),
			closed: AtomicBool::new(false),
		};
		let log_released = |logger: &BlackBoxLogger| {
			logger.log(&Record::builder()
				.args(format_args!("Released"))
				.level(Level::Info)
				.build())
		};

		log_released(&logger);
		assert_eq!(BLACK_BOX_CHANNEL.1.len(), 1);
		let _ = BLACK_BOX_CHANNEL.1.try_recv();

		logger.closed.store(true, Ordering::SeqCst);
		log_released(&logger);
		logger.flush();
		assert!(BLACK_BOX_CHANNEL.1.is_empty());
	}
}
