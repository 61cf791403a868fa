//! Well-known paths for the agent and its companion.

use std::path::PathBuf;

use crate::error::CoreError;

const STATE_DIR_NAME: &str = ".selfcare";
const SKIP_STATE_FILE: &str = "uptime_skip_state.json";
const PORT_FILE: &str = "relay.port";
const SECRET_FILE: &str = "relay.secret";
const SHARED_PORT_FILE: &str = "selfcare_port.txt";

/// `~/.selfcare/`, created on demand by callers that write into it.
pub fn state_dir() -> Result<PathBuf, CoreError> {
    let home = dirs::home_dir().ok_or(CoreError::HomeDirNotFound)?;
    Ok(home.join(STATE_DIR_NAME))
}

pub fn skip_state_path() -> Result<PathBuf, CoreError> {
    Ok(state_dir()?.join(SKIP_STATE_FILE))
}

/// Owner-only discovery file with the bound port.
pub fn port_file_path() -> Result<PathBuf, CoreError> {
    Ok(state_dir()?.join(PORT_FILE))
}

/// Per-boot relay secret, mode 0600.
pub fn secret_file_path() -> Result<PathBuf, CoreError> {
    Ok(state_dir()?.join(SECRET_FILE))
}

/// World-readable discovery copy in the shared temp directory, kept for
/// clients running at a different privilege tier. An explicit trade-off:
/// it leaks the port, never the credential.
pub fn shared_port_file_path() -> PathBuf {
    std::env::temp_dir().join(SHARED_PORT_FILE)
}
