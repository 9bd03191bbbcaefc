//! HTTP client for the photo backend.
//!
//! Only the multipart photo-upload call lives here. Responses are turned into
//! `UploadedPhoto` on success or a categorized `UploadFailure` otherwise.

mod client;
mod config;
mod error;
mod progress;

pub use client::{BackendClient, PhotoUpload};
pub use config::BackendConfig;
pub use error::ClientError;
pub use progress::{ProgressFn, ProgressStream};
