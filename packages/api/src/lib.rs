//! Server API functions for the photo upload queue.
//!
//! This crate contains the shared fullstack server functions for:
//! - Accepting files (validate, stage, enqueue)
//! - Listing uploads and per-status counts
//! - Pause, resume, retry, remove and clear-completed

mod uploads;

#[cfg(feature = "server")]
mod init;

pub use uploads::*;

#[cfg(feature = "server")]
pub use init::*;

// Re-export core types for convenience
pub use upload_core::{
    FailureKind, FileRules, QueueCounts, QueuedUpload, UploadFailure, UploadFilter, UploadId,
    UploadMetadata, UploadStatus, ValidationError,
};
