use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

extern "C" fn on_signal(_: libc::c_int) {
	INTERRUPTED.store(true, Ordering::SeqCst);
}

/// Replaces the default SIGINT and SIGTERM handlers, which would kill the process in the middle
/// of a bus transaction, with a flag checked between servo commands.
pub fn install() -> io::Result<&'static AtomicBool> {
	let handler = on_signal as extern "C" fn(libc::c_int) as libc::sighandler_t;

	for &signal in &[libc::SIGINT, libc::SIGTERM] {
		if unsafe { libc::signal(signal, handler) } == libc::SIG_ERR {
			return Err(io::Error::last_os_error());
		}
	}

	Ok(&INTERRUPTED)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn sigint_sets_flag() {
		let interrupted = install().unwrap();
		assert!(!interrupted.load(Ordering::SeqCst));

		assert_eq!(unsafe { libc::raise(libc::SIGINT) }, 0);

		assert!(interrupted.load(Ordering::SeqCst));
	}
}
