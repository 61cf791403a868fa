//! Request routing for the relay.
//!
//! Every arm answers with a well-formed [`ResponseEnvelope`]; handler
//! failures are in-envelope failures, never errors that escape to the
//! connection thread.

use std::env;

use selfcare_core::devices::DeviceController;
use selfcare_core::privilege;
use selfcare_relay_protocol::{Operation, RequestEnvelope, ResponseEnvelope};
use tracing::debug;

use crate::exec;

pub struct Dispatcher {
    devices: Box<dyn DeviceController>,
}

impl Dispatcher {
    pub fn new(devices: Box<dyn DeviceController>) -> Self {
        Self { devices }
    }

    pub fn handle(&self, request: RequestEnvelope) -> ResponseEnvelope {
        debug!(operation = ?request.operation, "Dispatching request");
        match request.operation {
            Operation::RunCommand => {
                exec::run(request.command.as_deref(), request.arguments.as_deref())
            }
            Operation::GetSystemStatus => self.system_status(),
            Operation::CheckPrivileges => self.check_privileges(),
            Operation::DeviceControl => {
                self.device_control(request.command.as_deref(), request.arguments.as_deref())
            }
            Operation::Unknown => ResponseEnvelope::unknown_request(),
        }
    }

    fn system_status(&self) -> ResponseEnvelope {
        let working_directory = env::current_dir()
            .map(|dir| dir.display().to_string())
            .unwrap_or_default();
        let status = serde_json::json!({
            "service_running": true,
            "platform": env::consts::OS,
            "process_id": std::process::id(),
            "working_directory": working_directory,
            "is_elevated": privilege::is_elevated(),
            "version": env!("CARGO_PKG_VERSION"),
        });
        ResponseEnvelope::ok("System status retrieved", status.to_string())
    }

    fn check_privileges(&self) -> ResponseEnvelope {
        let elevated = privilege::is_elevated();
        ResponseEnvelope::ok(
            if elevated {
                "Running with elevated privileges"
            } else {
                "Running with normal privileges"
            },
            elevated.to_string(),
        )
    }

    fn device_control(&self, method: Option<&str>, value: Option<&str>) -> ResponseEnvelope {
        let method = match method.map(str::trim).filter(|m| !m.is_empty()) {
            Some(method) => method,
            None => return ResponseEnvelope::failure("Device method cannot be empty"),
        };
        let value = match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(raw) => match raw.parse::<i64>() {
                Ok(parsed) => Some(parsed),
                Err(_) => {
                    return ResponseEnvelope::failure(format!(
                        "Device argument must be numeric, got '{}'",
                        raw
                    ))
                }
            },
            None => None,
        };

        match self.devices.invoke(method, value) {
            Ok(output) => ResponseEnvelope::ok("Device control applied", output),
            Err(err) => ResponseEnvelope::failure(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use selfcare_core::CoreError;

    struct RecordingController;

    impl DeviceController for RecordingController {
        fn invoke(&self, method: &str, value: Option<i64>) -> Result<String, CoreError> {
            match method {
                "mute" => Ok("muted".to_string()),
                "set_volume" => Ok(format!("volume {}", value.unwrap_or(-1))),
                other => Err(CoreError::DeviceControl(format!(
                    "Unknown device method: {}",
                    other
                ))),
            }
        }
    }

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(Box::new(RecordingController))
    }

    fn request(operation: Operation) -> RequestEnvelope {
        RequestEnvelope::new(operation)
    }

    #[test]
    fn unknown_operation_answers_the_fixed_message() {
        let response = dispatcher().handle(request(Operation::Unknown));
        assert!(!response.success);
        assert_eq!(response.message, "Unknown request type");
        assert!(response.output.is_empty());
    }

    #[test]
    fn system_status_carries_pid_and_elevation() {
        let response = dispatcher().handle(request(Operation::GetSystemStatus));
        assert!(response.success);
        let status: serde_json::Value = serde_json::from_str(&response.output).unwrap();
        assert_eq!(status["process_id"], std::process::id());
        assert!(status["is_elevated"].is_boolean());
        assert_eq!(status["platform"], env::consts::OS);
    }

    #[test]
    fn check_privileges_reports_boolean_text() {
        let response = dispatcher().handle(request(Operation::CheckPrivileges));
        assert!(response.success);
        assert!(response.output == "true" || response.output == "false");
    }

    #[test]
    fn run_command_round_trips_through_executor() {
        let mut req = request(Operation::RunCommand);
        req.command = Some("echo".to_string());
        req.arguments = Some("hi".to_string());
        let response = dispatcher().handle(req);
        assert!(response.success);
        assert_eq!(response.exit_code, Some(0));
        assert!(response.output.contains("hi"));
    }

    #[test]
    fn device_control_parses_numeric_argument() {
        let mut req = request(Operation::DeviceControl);
        req.command = Some("set_volume".to_string());
        req.arguments = Some("40".to_string());
        let response = dispatcher().handle(req);
        assert!(response.success);
        assert_eq!(response.output, "volume 40");
    }

    #[test]
    fn device_control_rejects_non_numeric_argument() {
        let mut req = request(Operation::DeviceControl);
        req.command = Some("set_volume".to_string());
        req.arguments = Some("loud".to_string());
        let response = dispatcher().handle(req);
        assert!(!response.success);
        assert!(response.message.contains("numeric"));
    }

    #[test]
    fn device_failure_stays_in_envelope() {
        let mut req = request(Operation::DeviceControl);
        req.command = Some("explode".to_string());
        let response = dispatcher().handle(req);
        assert!(!response.success);
        assert!(response.message.contains("Unknown device method"));
    }
}
