//! Core domain types for the photo upload queue.
//!
//! This crate contains shared types used across all packages:
//! - QueuedUpload and UploadStatus for upload jobs
//! - UploadQueueStore, the in-memory job tracker
//! - File acceptance rules and failure categories
//! - Events for real-time updates

mod error;
mod events;
mod failure;
mod queue;
mod store;
mod upload;
mod validation;

pub use error::QueueError;
pub use events::UploadEvent;
pub use failure::{FailureKind, UploadFailure};
pub use queue::{QueueConfig, QueueCounts, UploadFilter};
pub use store::UploadQueueStore;
pub use upload::{
    QueuedUpload, SourceFile, UploadId, UploadMetadata, UploadProgress, UploadStatus,
    UploadedPhoto,
};
pub use validation::{DEFAULT_MAX_FILE_BYTES, FileRules, ValidationError, resolve_content_type};
