//! PulseAudio-backed device control.
//!
//! The relay hands DeviceControl requests to this collaborator keyed by a
//! method name and optional numeric argument; the core never sees the
//! platform specifics.

use std::process::Command;

use selfcare_core::devices::DeviceController;
use selfcare_core::CoreError;

const SINK: &str = "@DEFAULT_SINK@";

pub struct PactlDeviceController;

impl PactlDeviceController {
    fn command_for(method: &str, value: Option<i64>) -> Result<Vec<String>, CoreError> {
        match method {
            "mute" => Ok(vec![
                "set-sink-mute".to_string(),
                SINK.to_string(),
                "1".to_string(),
            ]),
            "unmute" => Ok(vec![
                "set-sink-mute".to_string(),
                SINK.to_string(),
                "0".to_string(),
            ]),
            "set_volume" => {
                let percent = value.ok_or_else(|| {
                    CoreError::DeviceControl("set_volume requires a numeric argument".to_string())
                })?;
                if !(0..=150).contains(&percent) {
                    return Err(CoreError::DeviceControl(format!(
                        "volume {} out of range 0-150",
                        percent
                    )));
                }
                Ok(vec![
                    "set-sink-volume".to_string(),
                    SINK.to_string(),
                    format!("{}%", percent),
                ])
            }
            other => Err(CoreError::DeviceControl(format!(
                "Unknown device method: {}",
                other
            ))),
        }
    }
}

impl DeviceController for PactlDeviceController {
    fn invoke(&self, method: &str, value: Option<i64>) -> Result<String, CoreError> {
        let args = Self::command_for(method, value)?;
        let output = Command::new("pactl")
            .args(&args)
            .output()
            .map_err(|err| CoreError::DeviceControl(err.to_string()))?;

        if output.status.success() {
            Ok(format!("{} applied", method))
        } else {
            Err(CoreError::DeviceControl(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_methods_map_to_pactl_arguments() {
        assert_eq!(
            PactlDeviceController::command_for("mute", None).unwrap(),
            vec!["set-sink-mute", SINK, "1"]
        );
        assert_eq!(
            PactlDeviceController::command_for("set_volume", Some(40)).unwrap(),
            vec!["set-sink-volume", SINK, "40%"]
        );
    }

    #[test]
    fn set_volume_requires_a_value_in_range() {
        assert!(PactlDeviceController::command_for("set_volume", None).is_err());
        assert!(PactlDeviceController::command_for("set_volume", Some(999)).is_err());
    }

    #[test]
    fn unknown_method_is_rejected() {
        let err = PactlDeviceController::command_for("explode", None).unwrap_err();
        assert!(err.to_string().contains("Unknown device method"));
    }
}
