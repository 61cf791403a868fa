//! Uptime retrieval behind a capability trait.
//!
//! The state machine only ever sees a `Duration`; how it is obtained is a
//! platform detail kept at this seam.

use std::time::Duration;

use tracing::warn;

pub trait UptimeSource: Send + Sync {
    fn current_uptime(&self) -> Duration;
}

/// Reads `/proc/uptime`, falling back to sysinfo when procfs is not
/// available or unparseable.
pub struct SystemUptime;

impl UptimeSource for SystemUptime {
    fn current_uptime(&self) -> Duration {
        match read_proc_uptime() {
            Some(uptime) => uptime,
            None => {
                warn!("Failed to read /proc/uptime; falling back to sysinfo");
                Duration::from_secs(sysinfo::System::uptime())
            }
        }
    }
}

fn read_proc_uptime() -> Option<Duration> {
    let contents = fs_err::read_to_string("/proc/uptime").ok()?;
    let seconds: f64 = contents.split_whitespace().next()?.parse().ok()?;
    Some(Duration::from_secs_f64(seconds))
}

/// Fixed uptime for tests.
pub struct FixedUptime(pub Duration);

impl UptimeSource for FixedUptime {
    fn current_uptime(&self) -> Duration {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_uptime_returns_what_it_was_given() {
        let source = FixedUptime(Duration::from_secs(42));
        assert_eq!(source.current_uptime(), Duration::from_secs(42));
    }

    #[test]
    fn system_uptime_is_nonzero() {
        // Either procfs or the sysinfo fallback should report a booted host.
        assert!(SystemUptime.current_uptime() > Duration::ZERO);
    }
}
