//! Client helper for talking to the selfcare daemon relay.
//!
//! Discovers the port from the published files, reads the per-boot
//! secret, and runs the one-request-per-connection cycle: a single write
//! of `<credential>\n<json-body>`, then read the response until the
//! daemon closes the connection.

use std::env;
use std::io::{Read, Write};
use std::net::{Ipv4Addr, TcpStream};
use std::path::PathBuf;
use std::time::Duration;

use selfcare_core::paths;
use selfcare_relay_protocol::{RequestEnvelope, ResponseEnvelope};

const PORT_ENV: &str = "SELFCARE_PORT";
const SECRET_FILE_ENV: &str = "SELFCARE_SECRET_FILE";
const WRITE_TIMEOUT: Duration = Duration::from_secs(2);
// Commands run to completion before the daemon answers, so the read
// timeout is generous.
const READ_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_RESPONSE_BYTES: usize = 1024 * 1024;

/// Finds the relay port: env override first, then the owner-only file,
/// then the world-readable temp copy.
pub fn discover_port() -> Result<u16, String> {
    if let Ok(value) = env::var(PORT_ENV) {
        return value
            .trim()
            .parse()
            .map_err(|_| format!("{} is not a valid port: {}", PORT_ENV, value));
    }

    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Ok(private) = paths::port_file_path() {
        candidates.push(private);
    }
    candidates.push(paths::shared_port_file_path());

    for path in &candidates {
        if let Ok(contents) = fs_err::read_to_string(path) {
            if let Ok(port) = contents.trim().parse() {
                return Ok(port);
            }
        }
    }

    Err("Daemon port not found; is selfcare-daemon running?".to_string())
}

/// Reads the per-boot relay secret.
pub fn read_secret() -> Result<String, String> {
    let path = match env::var(SECRET_FILE_ENV) {
        Ok(path) => PathBuf::from(path),
        Err(_) => paths::secret_file_path()
            .map_err(|err| format!("Failed to resolve secret path: {}", err))?,
    };
    let contents = fs_err::read_to_string(&path)
        .map_err(|err| format!("Failed to read relay secret: {}", err))?;
    Ok(contents.trim().to_string())
}

/// Sends one request and reads the daemon's single response.
pub fn send_request(request: &RequestEnvelope) -> Result<ResponseEnvelope, String> {
    let port = discover_port()?;
    let secret = read_secret()?;

    let mut stream = TcpStream::connect((Ipv4Addr::LOCALHOST, port))
        .map_err(|err| format!("Failed to connect to daemon on port {}: {}", port, err))?;
    let _ = stream.set_read_timeout(Some(READ_TIMEOUT));
    let _ = stream.set_write_timeout(Some(WRITE_TIMEOUT));
    tracing::debug!(port, "Connected to daemon relay");

    let body = serde_json::to_vec(request)
        .map_err(|err| format!("Failed to serialize request: {}", err))?;
    let mut frame = Vec::with_capacity(secret.len() + 1 + body.len());
    frame.extend_from_slice(secret.as_bytes());
    frame.push(b'\n');
    frame.extend_from_slice(&body);

    // Credential and body go out in a single write; the daemon reads the
    // whole frame in one bounded read.
    stream
        .write_all(&frame)
        .map_err(|err| format!("Failed to write request: {}", err))?;
    stream.flush().ok();

    read_response(&mut stream)
}

fn read_response(stream: &mut TcpStream) -> Result<ResponseEnvelope, String> {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];

    // The daemon writes one response and closes, so read to EOF.
    loop {
        match stream.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                buffer.extend_from_slice(&chunk[..n]);
                if buffer.len() > MAX_RESPONSE_BYTES {
                    return Err("Response exceeded maximum size".to_string());
                }
            }
            Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                return Err("Timed out waiting for daemon response".to_string());
            }
            Err(err) => return Err(format!("Failed to read response: {}", err)),
        }
    }

    if buffer.is_empty() {
        return Err(
            "Daemon closed the connection without a response (authentication refused?)"
                .to_string(),
        );
    }

    serde_json::from_slice(&buffer).map_err(|err| format!("Failed to parse response: {}", err))
}
