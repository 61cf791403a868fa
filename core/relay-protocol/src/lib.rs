//! Wire types and framing rules for the selfcare relay.
//!
//! The relay speaks one request per connection: a credential line
//! terminated by `\n`, immediately followed by a JSON request body, sent
//! as a single write. The daemon answers with one JSON response and
//! closes the connection. This module defines the on-the-wire schema and
//! the frame splitter so both ends agree on the contract.

use serde::{Deserialize, Serialize};

/// First loopback port the daemon tries to bind.
pub const PORT_RANGE_START: u16 = 8080;
/// Last loopback port the daemon tries before giving up.
pub const PORT_RANGE_END: u16 = 8099;

/// Fixed size of the per-connection read buffer. A frame whose credential
/// line plus body exceeds this is truncated; there is no negotiated
/// maximum and no continuation. Kept at the historical 4096 bytes on
/// purpose.
pub const MAX_FRAME_BYTES: usize = 4096;

/// The closed set of operations the daemon performs for the companion.
///
/// `Unknown` absorbs any unrecognized tag so the dispatcher can answer a
/// well-formed failure instead of a decode error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum Operation {
    RunCommand,
    GetSystemStatus,
    CheckPrivileges,
    DeviceControl,
    #[serde(other)]
    Unknown,
}

/// A decoded request body.
#[derive(Debug, Deserialize, Serialize)]
pub struct RequestEnvelope {
    #[serde(rename = "type")]
    pub operation: Operation,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub arguments: Option<String>,
    #[serde(default)]
    pub data: Option<String>,
}

impl RequestEnvelope {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            command: None,
            arguments: None,
            data: None,
        }
    }
}

/// The response written back for every dispatched request.
#[derive(Debug, Deserialize, Serialize)]
pub struct ResponseEnvelope {
    pub success: bool,
    pub message: String,
    pub output: String,
    #[serde(rename = "exitCode", skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
}

impl ResponseEnvelope {
    pub fn ok(message: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            output: output.into(),
            exit_code: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            output: String::new(),
            exit_code: None,
        }
    }

    pub fn unknown_request() -> Self {
        Self::failure("Unknown request type")
    }
}

/// Splits a received frame at the first newline into credential and body.
///
/// Returns `None` when no newline is present, which means the client
/// never sent a credential line and the frame cannot be authenticated.
pub fn split_frame(frame: &[u8]) -> Option<(&[u8], &[u8])> {
    let index = frame.iter().position(|b| *b == b'\n')?;
    Some((&frame[..index], &frame[index + 1..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_operation_tags_decode() {
        for (tag, expected) in [
            ("RunCommand", Operation::RunCommand),
            ("GetSystemStatus", Operation::GetSystemStatus),
            ("CheckPrivileges", Operation::CheckPrivileges),
            ("DeviceControl", Operation::DeviceControl),
        ] {
            let json = format!(r#"{{"type":"{}"}}"#, tag);
            let request: RequestEnvelope = serde_json::from_str(&json).unwrap();
            assert_eq!(request.operation, expected);
        }
    }

    #[test]
    fn unrecognized_tag_decodes_to_unknown() {
        let request: RequestEnvelope =
            serde_json::from_str(r#"{"type":"FormatDisk","command":"x"}"#).unwrap();
        assert_eq!(request.operation, Operation::Unknown);
        assert_eq!(request.command.as_deref(), Some("x"));
    }

    #[test]
    fn missing_type_is_a_decode_error() {
        assert!(serde_json::from_str::<RequestEnvelope>(r#"{"command":"ls"}"#).is_err());
    }

    #[test]
    fn exit_code_is_omitted_when_absent() {
        let response = ResponseEnvelope::failure("nope");
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("exitCode"));

        let with_code = ResponseEnvelope {
            exit_code: Some(2),
            ..ResponseEnvelope::ok("done", "")
        };
        let json = serde_json::to_string(&with_code).unwrap();
        assert!(json.contains(r#""exitCode":2"#));
    }

    #[test]
    fn split_frame_separates_credential_and_body() {
        let (credential, body) = split_frame(b"secret\n{\"type\":\"CheckPrivileges\"}").unwrap();
        assert_eq!(credential, b"secret");
        assert_eq!(body, b"{\"type\":\"CheckPrivileges\"}");
    }

    #[test]
    fn split_frame_without_newline_is_none() {
        assert!(split_frame(b"no credential line here").is_none());
    }

    #[test]
    fn split_frame_with_empty_body() {
        let (credential, body) = split_frame(b"secret\n").unwrap();
        assert_eq!(credential, b"secret");
        assert!(body.is_empty());
    }
}
