//! Shutdown signal wiring.
//!
//! SIGINT and SIGTERM flip a process-wide flag; the accept loop and the
//! monitor loop poll it and wind down, which is what lets the daemon
//! remove its discovery and secret files on the way out.

use std::sync::atomic::{AtomicBool, Ordering};

static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

extern "C" fn on_signal(_signal: libc::c_int) {
    SHUTDOWN_REQUESTED.store(true, Ordering::SeqCst);
}

/// Installs the handlers and returns the shared flag.
pub fn install() -> &'static AtomicBool {
    #[cfg(unix)]
    unsafe {
        libc::signal(libc::SIGINT, on_signal as libc::sighandler_t);
        libc::signal(libc::SIGTERM, on_signal as libc::sighandler_t);
    }
    &SHUTDOWN_REQUESTED
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_flips_when_handler_runs() {
        let flag = install();
        assert!(!flag.load(Ordering::SeqCst));
        on_signal(libc::SIGTERM);
        assert!(flag.load(Ordering::SeqCst));
        flag.store(false, Ordering::SeqCst);
    }
}
