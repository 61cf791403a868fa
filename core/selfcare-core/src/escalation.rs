//! The escalating reminder/deferral policy.
//!
//! Warns once uptime crosses the threshold, lets the user postpone with a
//! menu of deferral lengths that narrows as the alert count grows, and
//! resets the cycle when a reboot is accepted. The engine owns the
//! persisted [`SkipState`] and is the only component that mutates it.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::CoreError;
use crate::skip_state::{SkipDuration, SkipState, SkipStateStore};

/// Uptime above which the reminder fires.
pub const UPTIME_THRESHOLD: Duration = Duration::from_secs(12 * 3600);

pub struct EscalationEngine {
    state: SkipState,
    store: SkipStateStore,
    threshold: Duration,
}

impl EscalationEngine {
    /// Loads state from the store, defaulting to empty on a missing or
    /// corrupt file.
    pub fn load(store: SkipStateStore) -> Self {
        let state = store.load();
        Self {
            state,
            store,
            threshold: UPTIME_THRESHOLD,
        }
    }

    pub fn state(&self) -> &SkipState {
        &self.state
    }

    /// Whether a warning should be presented right now.
    ///
    /// False below the uptime threshold. False inside an active skip
    /// window. The window is closed-open: warning resumes exactly at
    /// `last_skip_time + duration`, not after it.
    pub fn should_warn(&self, uptime: Duration, now: DateTime<Utc>) -> bool {
        if uptime < self.threshold {
            return false;
        }

        if let Some(window_end) = self.state.skip_window_end() {
            if now < window_end {
                return false;
            }
        }

        true
    }

    /// The deferral options to offer at the current alert count. Strictly
    /// narrowing; at three or more alerts only the shortest remains.
    pub fn available_options(&self) -> Vec<SkipDuration> {
        match self.state.alert_count {
            0 => vec![
                SkipDuration::Hours12,
                SkipDuration::Hours10,
                SkipDuration::Hours3,
                SkipDuration::Minutes10,
            ],
            1 => vec![
                SkipDuration::Hours10,
                SkipDuration::Hours3,
                SkipDuration::Minutes10,
            ],
            2 => vec![SkipDuration::Hours3, SkipDuration::Minutes10],
            _ => vec![SkipDuration::Minutes10],
        }
    }

    /// Records a deferral decision (or the timeout default) and persists.
    pub fn record_skip(
        &mut self,
        duration: SkipDuration,
        now: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        self.state.record_skip(duration, now);
        self.store.save(&self.state)
    }

    /// Resets the cycle and persists. Called when the user accepts a
    /// reboot, before the reboot command is spawned, so the state does
    /// not carry into the next boot.
    pub fn record_reboot(&mut self) -> Result<(), CoreError> {
        self.state.reset();
        self.store.save(&self.state)
    }
}
