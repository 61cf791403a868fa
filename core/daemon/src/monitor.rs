//! The periodic uptime check.
//!
//! One background thread owns the [`EscalationEngine`] and therefore the
//! persisted skip state; relay handlers never touch it, which serializes
//! all state mutations through this loop.

use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use chrono::Utc;
use selfcare_core::prompt::{PromptOutcome, WarningPrompt, TIMEOUT_DEFAULT};
use selfcare_core::uptime::UptimeSource;
use selfcare_core::EscalationEngine;
use tracing::{error, info};

pub const CHECK_INTERVAL: Duration = Duration::from_secs(30 * 60);

/// What a single check decided to do.
#[derive(Debug, PartialEq, Eq)]
pub enum CheckAction {
    NoWarning,
    Skipped,
    Reboot,
}

/// One evaluation of the escalation policy: read uptime, decide whether
/// to warn, present the prompt, record the decision. The timeout default
/// is the shortest skip, same as an explicit pick.
pub fn run_check(
    engine: &mut EscalationEngine,
    uptime_source: &dyn UptimeSource,
    prompt: &dyn WarningPrompt,
) -> CheckAction {
    let uptime = uptime_source.current_uptime();
    let hours = uptime.as_secs() / 3600;
    let minutes = (uptime.as_secs() % 3600) / 60;
    info!(hours, minutes, "Current system uptime");

    let now = Utc::now();
    if !engine.should_warn(uptime, now) {
        return CheckAction::NoWarning;
    }

    let options = engine.available_options();
    let outcome = prompt.present(uptime, &options, engine.state().alert_count);

    match outcome {
        PromptOutcome::Reboot => {
            info!("User accepted reboot");
            if let Err(err) = engine.record_reboot() {
                error!(error = %err, "Failed to persist reboot reset");
            }
            CheckAction::Reboot
        }
        PromptOutcome::Skip(duration) => {
            info!(duration = duration.display_label(), "User deferred reboot");
            if let Err(err) = engine.record_skip(duration, Utc::now()) {
                error!(error = %err, "Failed to persist skip");
            }
            CheckAction::Skipped
        }
        PromptOutcome::TimedOut => {
            info!("Prompt timed out; applying default skip");
            if let Err(err) = engine.record_skip(TIMEOUT_DEFAULT, Utc::now()) {
                error!(error = %err, "Failed to persist timeout skip");
            }
            CheckAction::Skipped
        }
    }
}

/// Spawns the monitor loop. The engine moves into the thread; state is
/// already persisted by reboot time, so spawning the reboot command last
/// means the reset never falsely carries into the next boot.
pub fn spawn_uptime_monitor(
    mut engine: EscalationEngine,
    uptime_source: Box<dyn UptimeSource>,
    prompt: Box<dyn WarningPrompt>,
    shutdown: &'static AtomicBool,
) -> thread::JoinHandle<()> {
    thread::spawn(move || loop {
        if sleep_until_shutdown(shutdown, CHECK_INTERVAL) {
            return;
        }
        if run_check(&mut engine, &*uptime_source, &*prompt) == CheckAction::Reboot {
            initiate_reboot();
        }
    })
}

/// Sleeps in short slices so the shutdown flag is observed promptly.
/// Returns true when shutdown was requested.
fn sleep_until_shutdown(shutdown: &AtomicBool, total: Duration) -> bool {
    let slice = Duration::from_secs(1);
    let mut remaining = total;
    while remaining > Duration::ZERO {
        if shutdown.load(Ordering::SeqCst) {
            return true;
        }
        let step = remaining.min(slice);
        thread::sleep(step);
        remaining -= step;
    }
    shutdown.load(Ordering::SeqCst)
}

fn initiate_reboot() {
    // One-minute grace, matching the original service's shutdown delay.
    match Command::new("shutdown").args(["-r", "+1"]).spawn() {
        Ok(_) => info!("System reboot initiated"),
        Err(err) => error!(error = %err, "Failed to initiate reboot"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use selfcare_core::skip_state::{SkipDuration, SkipState};
    use selfcare_core::uptime::FixedUptime;
    use selfcare_core::SkipStateStore;
    use std::sync::Mutex;

    struct ScriptedPrompt {
        outcomes: Mutex<Vec<PromptOutcome>>,
        seen_options: Mutex<Vec<Vec<SkipDuration>>>,
    }

    impl ScriptedPrompt {
        fn new(outcomes: Vec<PromptOutcome>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes),
                seen_options: Mutex::new(Vec::new()),
            }
        }
    }

    impl WarningPrompt for ScriptedPrompt {
        fn present(
            &self,
            _uptime: Duration,
            options: &[SkipDuration],
            _alert_count: u32,
        ) -> PromptOutcome {
            self.seen_options.lock().unwrap().push(options.to_vec());
            self.outcomes.lock().unwrap().remove(0)
        }
    }

    fn engine_in(dir: &tempfile::TempDir) -> EscalationEngine {
        EscalationEngine::load(SkipStateStore::new(
            &dir.path().join("uptime_skip_state.json"),
        ))
    }

    fn hours(h: u64) -> Duration {
        Duration::from_secs(h * 3600)
    }

    #[test]
    fn below_threshold_never_prompts() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = engine_in(&dir);
        let prompt = ScriptedPrompt::new(vec![]);

        let action = run_check(&mut engine, &FixedUptime(hours(2)), &prompt);
        assert_eq!(action, CheckAction::NoWarning);
        assert!(prompt.seen_options.lock().unwrap().is_empty());
    }

    #[test]
    fn skip_choice_is_recorded_and_suppresses_the_next_check() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = engine_in(&dir);
        let prompt = ScriptedPrompt::new(vec![PromptOutcome::Skip(SkipDuration::Hours3)]);

        let action = run_check(&mut engine, &FixedUptime(hours(13)), &prompt);
        assert_eq!(action, CheckAction::Skipped);
        assert_eq!(engine.state().alert_count, 1);

        // Immediately after a 3h skip, the same uptime no longer warns.
        let action = run_check(&mut engine, &FixedUptime(hours(13)), &prompt);
        assert_eq!(action, CheckAction::NoWarning);
    }

    #[test]
    fn timeout_applies_the_default_skip() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = engine_in(&dir);
        let prompt = ScriptedPrompt::new(vec![PromptOutcome::TimedOut]);

        let action = run_check(&mut engine, &FixedUptime(hours(13)), &prompt);
        assert_eq!(action, CheckAction::Skipped);
        assert_eq!(engine.state().alert_count, 1);
        assert_eq!(
            engine.state().last_skip_duration,
            Some(SkipDuration::Minutes10)
        );
    }

    #[test]
    fn reboot_choice_resets_state_before_reporting() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = engine_in(&dir);
        engine
            .record_skip(
                SkipDuration::Minutes10,
                Utc::now() - chrono::Duration::hours(1),
            )
            .unwrap();
        let prompt = ScriptedPrompt::new(vec![PromptOutcome::Reboot]);

        let action = run_check(&mut engine, &FixedUptime(hours(14)), &prompt);
        assert_eq!(action, CheckAction::Reboot);
        assert_eq!(*engine.state(), SkipState::default());
    }

    #[test]
    fn prompt_sees_narrowed_options() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = engine_in(&dir);
        engine
            .record_skip(SkipDuration::Hours12, Utc::now() - chrono::Duration::hours(13))
            .unwrap();
        engine
            .record_skip(SkipDuration::Hours10, Utc::now() - chrono::Duration::hours(11))
            .unwrap();
        engine
            .record_skip(SkipDuration::Hours3, Utc::now() - chrono::Duration::hours(4))
            .unwrap();

        let prompt = ScriptedPrompt::new(vec![PromptOutcome::TimedOut]);
        run_check(&mut engine, &FixedUptime(hours(20)), &prompt);

        let seen = prompt.seen_options.lock().unwrap();
        assert_eq!(seen[0], vec![SkipDuration::Minutes10]);
    }

    #[test]
    fn sleep_until_shutdown_returns_early_on_flag() {
        let shutdown = AtomicBool::new(true);
        assert!(sleep_until_shutdown(&shutdown, Duration::from_secs(60)));
    }
}
