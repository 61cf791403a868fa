//! Error types for selfcare-core operations.

use std::path::PathBuf;

/// All errors that can occur in selfcare-core operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Failed to read {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize state: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Device control failed: {0}")]
    DeviceControl(String),
}
