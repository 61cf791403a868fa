//! Per-boot relay credential.
//!
//! A fresh random token is generated at every daemon start and written to
//! a file only the same-privilege tier can read (mode 0600). The client
//! sends it back verbatim as the credential line; validation is exact
//! string equality. On mismatch the connection is closed with no response
//! bytes so a probing peer learns nothing.
//!
//! Earlier protocol generations used an AES-GCM token, a hostname/time
//! hash, and finally a static shared password. Those are compatibility
//! history, not a security target, and are deliberately not implemented.

use std::path::{Path, PathBuf};

use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::warn;

const TOKEN_LEN: usize = 48;

pub struct RelaySecret {
    token: String,
    path: PathBuf,
}

impl RelaySecret {
    /// Generates a fresh token and persists it at `path` with owner-only
    /// permissions.
    pub fn generate(path: &Path) -> Result<Self, String> {
        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LEN)
            .map(char::from)
            .collect();

        if let Some(parent) = path.parent() {
            fs_err::create_dir_all(parent)
                .map_err(|err| format!("Failed to create secret directory: {}", err))?;
        }
        fs_err::write(path, &token)
            .map_err(|err| format!("Failed to write relay secret: {}", err))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs_err::set_permissions(path, std::fs::Permissions::from_mode(0o600))
                .map_err(|err| format!("Failed to restrict relay secret permissions: {}", err))?;
        }

        Ok(Self {
            token,
            path: path.to_path_buf(),
        })
    }

    #[cfg(test)]
    pub fn fixed(token: &str) -> Self {
        Self {
            token: token.to_string(),
            path: PathBuf::new(),
        }
    }

    /// Exact-equality check against the client-supplied credential line.
    pub fn verify(&self, candidate: &[u8]) -> bool {
        candidate == self.token.as_bytes()
    }

    /// Removes the secret file at shutdown so a stale token never
    /// outlives the boot it was minted for.
    pub fn remove(&self) {
        if self.path.as_os_str().is_empty() {
            return;
        }
        if let Err(err) = fs_err::remove_file(&self.path) {
            warn!(error = %err, "Failed to remove relay secret file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_token_round_trips_through_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay.secret");
        let secret = RelaySecret::generate(&path).unwrap();

        let on_disk = fs_err::read_to_string(&path).unwrap();
        assert_eq!(on_disk.len(), TOKEN_LEN);
        assert!(secret.verify(on_disk.as_bytes()));
        assert!(!secret.verify(b"wrong"));
    }

    #[test]
    fn secret_file_is_owner_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay.secret");
        let _secret = RelaySecret::generate(&path).unwrap();

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs_err::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn remove_deletes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay.secret");
        let secret = RelaySecret::generate(&path).unwrap();
        secret.remove();
        assert!(!path.exists());
    }
}
