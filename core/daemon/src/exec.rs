//! External command execution for the RunCommand operation.

use std::process::Command;

use selfcare_relay_protocol::ResponseEnvelope;
use tracing::info;

/// Runs `command` with whitespace-split `arguments`, capturing merged
/// stdout and stderr. Spawn failures and non-zero exits are reported in
/// the envelope; nothing propagates past this function.
pub fn run(command: Option<&str>, arguments: Option<&str>) -> ResponseEnvelope {
    let command = match command.map(str::trim).filter(|c| !c.is_empty()) {
        Some(command) => command,
        None => return ResponseEnvelope::failure("Command cannot be empty"),
    };

    let args: Vec<&str> = arguments
        .map(|a| a.split_whitespace().collect())
        .unwrap_or_default();

    let output = match Command::new(command).args(&args).output() {
        Ok(output) => output,
        Err(err) => return ResponseEnvelope::failure(err.to_string()),
    };

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let combined = if stderr.is_empty() {
        stdout.into_owned()
    } else {
        format!("{}\n{}", stdout, stderr)
    };

    let exit_code = output.status.code().unwrap_or(-1);
    info!(command, exit_code, "Command executed");

    ResponseEnvelope {
        success: output.status.success(),
        message: if output.status.success() {
            "Command executed successfully".to_string()
        } else {
            format!("Command failed with exit code {}", exit_code)
        },
        output: combined.trim().to_string(),
        exit_code: Some(exit_code),
    }
}
