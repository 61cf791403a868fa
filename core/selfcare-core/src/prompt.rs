//! The warning-dialog seam.
//!
//! Rendering is an external collaborator: the engine only needs "present
//! these options, give me a choice or a timeout default". Implementations
//! live in the daemon where the platform wiring is.

use std::time::Duration;

use crate::skip_state::SkipDuration;

/// How long a presentation may wait for a user decision before the caller
/// applies the timeout default.
pub const PROMPT_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Fallback applied when the dialog times out, fails to render, or
/// returns nothing: equivalent to the user picking the least-committal
/// option.
pub const TIMEOUT_DEFAULT: SkipDuration = SkipDuration::Minutes10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptOutcome {
    /// User accepted the reboot.
    Reboot,
    /// User picked a deferral.
    Skip(SkipDuration),
    /// No decision within [`PROMPT_TIMEOUT`]; caller must treat this as
    /// `Skip(TIMEOUT_DEFAULT)`.
    TimedOut,
}

pub trait WarningPrompt: Send + Sync {
    /// Presents the warning with the given uptime, the deferral options
    /// to offer, and the current alert count (for display only).
    fn present(
        &self,
        uptime: Duration,
        options: &[SkipDuration],
        alert_count: u32,
    ) -> PromptOutcome;
}
