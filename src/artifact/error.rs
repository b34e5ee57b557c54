//! Error types for the artifact layer.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by artifact containers and artifact notifiers.
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("Entry {path} is not a container")]
    NotAContainer { path: String },

    #[error("Notification container {path} is not the root of this notifier")]
    ForeignContainer { path: String },

    #[error("Cannot watch {path}: {reason}")]
    WatchFailed { path: PathBuf, reason: String },

    #[error("Artifact tree has been shut down")]
    Closed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<notify::Error> for ArtifactError {
    fn from(e: notify::Error) -> Self {
        let path = e.paths.first().cloned().unwrap_or_default();
        ArtifactError::WatchFailed {
            path,
            reason: e.to_string(),
        }
    }
}

pub type ArtifactResult<T> = Result<T, ArtifactError>;
