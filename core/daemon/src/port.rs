//! Loopback port allocation and discovery-file publication.
//!
//! The daemon binds the first free port in a fixed range and publishes
//! the decimal port number to two files: an owner-only copy under
//! `~/.selfcare/` and a world-readable copy in the shared temp directory
//! for clients at a different privilege tier. The shared copy is an
//! explicit trade-off: it leaks which port we listen on, never the
//! credential needed to speak to it.

use std::net::{Ipv4Addr, SocketAddr, TcpListener};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

/// Binds the first free loopback port in `[start, end]`, ascending.
///
/// Exhausting the range is a startup-fatal error for the caller.
pub fn bind_first_free(start: u16, end: u16) -> Result<(TcpListener, u16), String> {
    for port in start..=end {
        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
        match TcpListener::bind(addr) {
            Ok(listener) => {
                info!(port, "Relay listener bound");
                return Ok((listener, port));
            }
            Err(err) => {
                warn!(port, error = %err, "Port unavailable, trying next");
            }
        }
    }
    Err(format!(
        "No available loopback port in range {}-{}",
        start, end
    ))
}

/// The bound port plus every discovery file it was published to.
/// Transient: recreated each run, removed on shutdown.
pub struct PortRecord {
    pub port: u16,
    paths: Vec<PathBuf>,
}

impl PortRecord {
    /// Writes the port number as plain text to the private and shared
    /// discovery files. The private copy gets mode 0600 where supported;
    /// a failed shared copy is logged and skipped, not fatal.
    pub fn publish(port: u16, private_path: &Path, shared_path: &Path) -> Result<Self, String> {
        let mut paths = Vec::new();

        if let Some(parent) = private_path.parent() {
            fs_err::create_dir_all(parent)
                .map_err(|err| format!("Failed to create discovery directory: {}", err))?;
        }
        fs_err::write(private_path, port.to_string())
            .map_err(|err| format!("Failed to write port file: {}", err))?;
        restrict_to_owner(private_path);
        paths.push(private_path.to_path_buf());

        match fs_err::write(shared_path, port.to_string()) {
            Ok(()) => paths.push(shared_path.to_path_buf()),
            Err(err) => {
                warn!(error = %err, path = %shared_path.display(), "Failed to write shared port file");
            }
        }

        info!(port, files = paths.len(), "Discovery files published");
        Ok(Self { port, paths })
    }

    /// Deletes every discovery file this record published.
    pub fn remove(&self) {
        for path in &self.paths {
            if let Err(err) = fs_err::remove_file(path) {
                warn!(error = %err, path = %path.display(), "Failed to remove discovery file");
            }
        }
    }
}

fn restrict_to_owner(path: &Path) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(err) = fs_err::set_permissions(path, std::fs::Permissions::from_mode(0o600)) {
            warn!(error = %err, path = %path.display(), "Failed to restrict port file permissions");
        }
    }
}
