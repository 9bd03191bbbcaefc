//! Errors returned by queue operations.

use crate::{UploadId, ValidationError};

/// Error type for queue operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    #[error("Upload not found: {0}")]
    NotFound(UploadId),

    #[error("Upload already queued: {0}")]
    DuplicateId(UploadId),

    #[error("Upload {id} cannot go from {from} to {to}")]
    InvalidTransition {
        id: UploadId,
        from: &'static str,
        to: &'static str,
    },

    #[error("Upload {id} attempt {attempt} is no longer current")]
    StaleAttempt { id: UploadId, attempt: u32 },

    #[error("Queue is full ({0} active uploads)")]
    QueueFull(usize),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}
