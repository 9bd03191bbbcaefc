//! Upload queue server functions.

use dioxus::prelude::*;
use serde::{Deserialize, Serialize};
use upload_core::{FileRules, QueueCounts, QueuedUpload, UploadId, UploadMetadata};

/// A file picked in the browser plus its metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnqueueUploadRequest {
    pub file_name: String,
    /// MIME type reported by the browser, if any.
    #[serde(default)]
    pub content_type: Option<String>,
    /// File contents, sent as base64 text.
    #[serde(with = "base64_data")]
    pub data: Vec<u8>,
    #[serde(default)]
    pub metadata: UploadMetadata,
}

/// Validate, stage and enqueue one file.
#[post("/api/uploads/enqueue")]
pub async fn enqueue_upload(request: EnqueueUploadRequest) -> Result<QueuedUpload, ServerFnError> {
    #[cfg(feature = "server")]
    {
        use upload_core::SourceFile;

        let system = crate::init::upload_system().await?;
        let queue = crate::init::queue().await?;

        let size = request.data.len() as u64;
        let content_type = system
            .rules
            .validate(&request.file_name, size, request.content_type.as_deref())
            .map_err(|e| ServerFnError::new(e.to_string()))?;

        let id = UploadId::new();
        let key = storage::staging_key(id, &request.file_name);
        system
            .storage
            .put_bytes(&key, bytes::Bytes::from(request.data))
            .await
            .map_err(|e| ServerFnError::new(format!("Failed to stage file: {}", e)))?;

        let upload = QueuedUpload::new(
            id,
            SourceFile {
                file_name: request.file_name,
                size,
                content_type,
                key: key.clone(),
            },
        )
        .with_metadata(request.metadata);

        match queue.enqueue(upload).await {
            Ok(upload) => Ok(upload),
            Err(e) => {
                if let Err(cleanup) = system.storage.delete(&key).await {
                    tracing::warn!("Failed to release staged file {}: {}", key, cleanup);
                }
                Err(crate::init::server_error(e))
            }
        }
    }

    #[cfg(not(feature = "server"))]
    {
        Err(ServerFnError::new("Server-only function"))
    }
}

/// List uploads for a view filter (`all`, `active`, `completed`, `error`).
#[post("/api/uploads/list")]
pub async fn list_uploads(filter: String) -> Result<Vec<QueuedUpload>, ServerFnError> {
    #[cfg(feature = "server")]
    {
        let filter: upload_core::UploadFilter = filter
            .parse()
            .map_err(|e: upload_core::QueueError| ServerFnError::new(e.to_string()))?;

        crate::init::queue()
            .await?
            .list(filter)
            .await
            .map_err(crate::init::server_error)
    }

    #[cfg(not(feature = "server"))]
    {
        Err(ServerFnError::new("Server-only function"))
    }
}

/// Get an upload by ID.
#[get("/api/uploads/item/:id")]
pub async fn get_upload(id: String) -> Result<Option<QueuedUpload>, ServerFnError> {
    #[cfg(feature = "server")]
    {
        let id = crate::init::parse_id(&id)?;
        let queue = crate::init::queue().await?;
        queue.get(id).await.map_err(crate::init::server_error)
    }

    #[cfg(not(feature = "server"))]
    {
        Err(ServerFnError::new("Server-only function"))
    }
}

/// Per-status counts.
#[get("/api/uploads/counts")]
pub async fn queue_counts() -> Result<QueueCounts, ServerFnError> {
    #[cfg(feature = "server")]
    {
        let queue = crate::init::queue().await?;
        queue.counts().await.map_err(crate::init::server_error)
    }

    #[cfg(not(feature = "server"))]
    {
        Err(ServerFnError::new("Server-only function"))
    }
}

/// Pause a pending or in-flight upload.
#[post("/api/uploads/:id/pause")]
pub async fn pause_upload(id: String) -> Result<QueuedUpload, ServerFnError> {
    #[cfg(feature = "server")]
    {
        let id = crate::init::parse_id(&id)?;
        let queue = crate::init::queue().await?;
        queue.pause(id).await.map_err(crate::init::server_error)
    }

    #[cfg(not(feature = "server"))]
    {
        Err(ServerFnError::new("Server-only function"))
    }
}

/// Resume a paused upload.
#[post("/api/uploads/:id/resume")]
pub async fn resume_upload(id: String) -> Result<QueuedUpload, ServerFnError> {
    #[cfg(feature = "server")]
    {
        let id = crate::init::parse_id(&id)?;
        let queue = crate::init::queue().await?;
        queue.resume(id).await.map_err(crate::init::server_error)
    }

    #[cfg(not(feature = "server"))]
    {
        Err(ServerFnError::new("Server-only function"))
    }
}

/// Retry a failed upload.
#[post("/api/uploads/:id/retry")]
pub async fn retry_upload(id: String) -> Result<QueuedUpload, ServerFnError> {
    #[cfg(feature = "server")]
    {
        let id = crate::init::parse_id(&id)?;
        let queue = crate::init::queue().await?;
        queue.retry(id).await.map_err(crate::init::server_error)
    }

    #[cfg(not(feature = "server"))]
    {
        Err(ServerFnError::new("Server-only function"))
    }
}

/// Remove a completed or failed upload.
#[post("/api/uploads/:id/remove")]
pub async fn remove_upload(id: String) -> Result<QueuedUpload, ServerFnError> {
    #[cfg(feature = "server")]
    {
        let id = crate::init::parse_id(&id)?;
        let queue = crate::init::queue().await?;
        queue.remove(id).await.map_err(crate::init::server_error)
    }

    #[cfg(not(feature = "server"))]
    {
        Err(ServerFnError::new("Server-only function"))
    }
}

/// Drop every completed upload, returning their IDs.
#[post("/api/uploads/clear-completed")]
pub async fn clear_completed() -> Result<Vec<UploadId>, ServerFnError> {
    #[cfg(feature = "server")]
    {
        crate::init::queue()
            .await?
            .clear_completed()
            .await
            .map_err(crate::init::server_error)
    }

    #[cfg(not(feature = "server"))]
    {
        Err(ServerFnError::new("Server-only function"))
    }
}

/// File acceptance rules, for client-side checks before sending bytes.
#[get("/api/uploads/rules")]
pub async fn upload_rules() -> Result<FileRules, ServerFnError> {
    #[cfg(feature = "server")]
    {
        let system = crate::init::upload_system().await?;
        Ok(system.rules.clone())
    }

    #[cfg(not(feature = "server"))]
    {
        Err(ServerFnError::new("Server-only function"))
    }
}

/// Serde adapter carrying bytes as one base64 string instead of a number array.
mod base64_data {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_data_travels_as_base64_text() -> Result<(), serde_json::Error> {
        let request = EnqueueUploadRequest {
            file_name: "beach.jpg".to_string(),
            content_type: Some("image/jpeg".to_string()),
            data: vec![0xFF, 0xD8, 0xFF, 0xE0],
            metadata: UploadMetadata::default(),
        };

        let json = serde_json::to_value(&request)?;
        assert_eq!(json["data"], "/9j/4A==");

        let back: EnqueueUploadRequest = serde_json::from_value(json)?;
        assert_eq!(back.data, request.data);
        Ok(())
    }

    #[test]
    fn malformed_file_data_is_rejected() {
        let parsed = serde_json::from_str::<EnqueueUploadRequest>(
            r#"{"file_name":"a.jpg","data":"not base64!"}"#,
        );
        assert!(parsed.is_err());
    }
}
