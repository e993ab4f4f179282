//! Error types for manifest loading.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ManifestError>;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read dependency manifest {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed dependency manifest {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ManifestError {
    /// Path of the manifest that failed to load.
    pub fn path(&self) -> &std::path::Path {
        match self {
            ManifestError::Io { path, .. } | ManifestError::Parse { path, .. } => path,
        }
    }
}
