//! Zenity-backed warning dialog.
//!
//! The engine treats presentation as an external collaborator; this one
//! shells out to `zenity --question` with one extra button per deferral
//! option and leans on zenity's own `--timeout` for the no-decision case.
//! A failed or missing zenity is reported as a timeout, which the monitor
//! turns into the default skip.

use std::process::Command;
use std::time::Duration;

use selfcare_core::prompt::{PromptOutcome, WarningPrompt, PROMPT_TIMEOUT};
use selfcare_core::skip_state::SkipDuration;
use tracing::warn;

const REBOOT_LABEL: &str = "Reboot Now";

pub struct ZenityPrompt;

impl ZenityPrompt {
    fn build_message(uptime: Duration, alert_count: u32) -> String {
        let days = uptime.as_secs() / 86400;
        let hours = (uptime.as_secs() % 86400) / 3600;
        let minutes = (uptime.as_secs() % 3600) / 60;
        let running_for = if days > 0 {
            format!("{} days and {} hours", days, hours)
        } else {
            format!("{} hours and {} minutes", hours, minutes)
        };
        format!(
            "System Uptime Warning\n\nYour system has been running for {}.\n\n\
             Regular reboots help maintain system stability and apply important updates.\n\n\
             This is alert #{}. Available skip options are being reduced.\n\n\
             Would you like to reboot now?",
            running_for,
            alert_count + 1
        )
    }

    /// Maps zenity's printed button label back to an outcome. Zenity
    /// prints nothing on timeout or when the dialog is dismissed.
    fn parse_choice(output: &str, options: &[SkipDuration]) -> PromptOutcome {
        let choice = output.trim();
        if choice == REBOOT_LABEL {
            return PromptOutcome::Reboot;
        }
        for option in options {
            if choice.contains(option.display_label()) {
                return PromptOutcome::Skip(*option);
            }
        }
        PromptOutcome::TimedOut
    }
}

impl WarningPrompt for ZenityPrompt {
    fn present(
        &self,
        uptime: Duration,
        options: &[SkipDuration],
        alert_count: u32,
    ) -> PromptOutcome {
        let message = Self::build_message(uptime, alert_count);

        let mut command = Command::new("zenity");
        command
            .arg("--question")
            .arg("--title=SelfCare - Reboot Reminder")
            .arg(format!("--text={}", message))
            .arg("--ok-label=Cancel")
            .arg(format!("--timeout={}", PROMPT_TIMEOUT.as_secs()))
            .arg("--extra-button")
            .arg(REBOOT_LABEL);
        for option in options {
            command
                .arg("--extra-button")
                .arg(format!("Skip {}", option.display_label()));
        }

        match command.output() {
            Ok(output) => Self::parse_choice(&String::from_utf8_lossy(&output.stdout), options),
            Err(err) => {
                warn!(error = %err, "Failed to present reboot dialog");
                PromptOutcome::TimedOut
            }
        }
    }
}
