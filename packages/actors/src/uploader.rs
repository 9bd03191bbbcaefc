//! Uploader trait and implementations.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use backend::{BackendClient, PhotoUpload};
use storage::Storage;
use upload_core::{QueuedUpload, UploadFailure, UploadProgress};

use crate::messages::UploadOutcome;

/// Callback receiving byte progress for the current attempt.
pub type ProgressSink = backend::ProgressFn;

/// Future type for async uploads.
pub type UploadFuture = Pin<Box<dyn Future<Output = UploadOutcome> + Send>>;

/// Sends one queued upload somewhere.
///
/// The returned future may be dropped mid-flight when the user pauses; an
/// implementation must not rely on running to completion.
pub trait Uploader: Send + Sync + 'static {
    fn upload(&self, upload: &QueuedUpload, progress: ProgressSink) -> UploadFuture;
}

/// Reads staged bytes from storage and posts them to the photo backend.
pub struct BackendUploader {
    client: BackendClient,
    storage: Arc<Storage>,
}

impl BackendUploader {
    pub fn new(client: BackendClient, storage: Arc<Storage>) -> Self {
        Self { client, storage }
    }
}

impl Uploader for BackendUploader {
    fn upload(&self, upload: &QueuedUpload, progress: ProgressSink) -> UploadFuture {
        let client = self.client.clone();
        let storage = Arc::clone(&self.storage);
        let upload = upload.clone();

        Box::pin(async move {
            let bytes = storage
                .get_bytes(&upload.source.key)
                .await
                .map_err(|e| UploadFailure::source_missing(e.to_string()))?;

            progress(UploadProgress::new(0, bytes.len() as u64));

            client
                .upload_photo(
                    PhotoUpload {
                        file_name: upload.source.file_name,
                        content_type: upload.source.content_type,
                        bytes,
                        metadata: upload.metadata,
                    },
                    progress,
                )
                .await
        })
    }
}

/// A simple function-based uploader.
pub struct FnUploader<F>
where
    F: Fn(QueuedUpload, ProgressSink) -> UploadFuture + Send + Sync + 'static,
{
    upload: F,
}

impl<F> FnUploader<F>
where
    F: Fn(QueuedUpload, ProgressSink) -> UploadFuture + Send + Sync + 'static,
{
    pub fn new(upload: F) -> Self {
        Self { upload }
    }
}

impl<F> Uploader for FnUploader<F>
where
    F: Fn(QueuedUpload, ProgressSink) -> UploadFuture + Send + Sync + 'static,
{
    fn upload(&self, upload: &QueuedUpload, progress: ProgressSink) -> UploadFuture {
        (self.upload)(upload.clone(), progress)
    }
}
