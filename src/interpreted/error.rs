//! Error types for the interpreted layer.

use thiserror::Error;

use crate::artifact::ArtifactError;

/// Errors from interpreted notifier operations.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// The notification's container does not belong to the notifier's root.
    /// Nothing was registered.
    #[error("Notification container under root {found} does not belong to notifier root {expected}")]
    ScopeMismatch { expected: String, found: String },

    #[error("Invalid notification path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Interpreted tree has been dropped")]
    Detached,

    #[error("Artifact layer error: {0}")]
    Artifact(#[from] ArtifactError),
}

impl NotifyError {
    /// Whether the caller passed an argument the notifier cannot accept.
    pub fn is_illegal_argument(&self) -> bool {
        matches!(
            self,
            NotifyError::ScopeMismatch { .. } | NotifyError::InvalidPath { .. }
        )
    }
}

pub type NotifyResult<T> = Result<T, NotifyError>;
