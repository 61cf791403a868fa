//! Per-connection handling for the loopback relay.
//!
//! One request per connection: a single bounded read into a fixed buffer,
//! split at the first newline into credential and JSON body, then auth,
//! dispatch, one response write, close. A frame larger than the buffer is
//! truncated; that limit is historical and preserved (see
//! [`selfcare_relay_protocol::MAX_FRAME_BYTES`]).

use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use selfcare_relay_protocol::{split_frame, RequestEnvelope, ResponseEnvelope, MAX_FRAME_BYTES};
use tracing::{debug, warn};

use crate::auth::RelaySecret;
use crate::dispatch::Dispatcher;

const IO_TIMEOUT: Duration = Duration::from_secs(2);

pub struct RelayContext {
    pub secret: RelaySecret,
    pub dispatcher: Dispatcher,
}

/// Runs one full request/response cycle. Any failure is confined to this
/// connection; the accept loop never sees it.
pub fn handle_connection(mut stream: TcpStream, ctx: Arc<RelayContext>) {
    let _ = stream.set_read_timeout(Some(IO_TIMEOUT));
    let _ = stream.set_write_timeout(Some(IO_TIMEOUT));

    let mut buffer = [0u8; MAX_FRAME_BYTES];
    let received = match stream.read(&mut buffer) {
        Ok(n) => n,
        Err(err) => {
            warn!(error = %err, "Failed to read relay frame");
            return;
        }
    };

    let (credential, body) = match split_frame(&buffer[..received]) {
        Some(parts) => parts,
        None => {
            warn!("Relay frame had no credential line; closing");
            return;
        }
    };

    // Silent close on bad credentials: no response, no reason, no oracle.
    if !ctx.secret.verify(credential) {
        warn!("Relay authentication failed; closing without response");
        return;
    }

    let response = match serde_json::from_slice::<RequestEnvelope>(body) {
        Ok(request) => ctx.dispatcher.handle(request),
        Err(err) => ResponseEnvelope::failure(format!("Invalid request body: {}", err)),
    };

    write_response(&mut stream, &response);
}

fn write_response(stream: &mut TcpStream, response: &ResponseEnvelope) {
    let payload = match serde_json::to_vec(response) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(error = %err, "Failed to serialize relay response");
            return;
        }
    };
    if let Err(err) = stream.write_all(&payload) {
        warn!(error = %err, "Failed to write relay response");
        return;
    }
    debug!(bytes = payload.len(), "Relay response written");
}
