use bytes::Bytes;
use futures_util::stream;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use upload_core::{UploadFailure, UploadMetadata, UploadedPhoto};
use url::Url;

use crate::error::transport_failure;
use crate::progress::{ProgressFn, ProgressStream, chunked};
use crate::{BackendConfig, ClientError};

const CHUNK_SIZE: usize = 64 * 1024;

/// Form field carrying the file.
pub const PHOTO_FIELD: &str = "photo";

/// One photo plus the metadata sent with it.
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
    pub metadata: UploadMetadata,
}

/// Client for the backend's photo-upload endpoint.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    upload_url: Url,
    auth_token: Option<String>,
}

impl BackendClient {
    pub fn new(config: &BackendConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            upload_url: config.upload_url()?,
            auth_token: config.auth_token.clone(),
        })
    }

    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(&BackendConfig::from_env()?)
    }

    pub fn upload_url(&self) -> &Url {
        &self.upload_url
    }

    /// Send one photo as a multipart request.
    ///
    /// `on_progress` is called as body chunks are handed to the transport.
    /// Non-success statuses and transport errors come back as a categorized
    /// [`UploadFailure`].
    pub async fn upload_photo(
        &self,
        photo: PhotoUpload,
        on_progress: ProgressFn,
    ) -> Result<UploadedPhoto, UploadFailure> {
        let size = photo.bytes.len() as u64;
        let content_type = photo.content_type.clone();
        // Only the file part's MIME type can fail here, before anything is sent
        let form = build_form(photo, on_progress).map_err(|e| {
            UploadFailure::validation(format!("invalid content type {content_type:?}: {e}"))
        })?;

        let mut request = self.http.post(self.upload_url.clone()).multipart(form);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        tracing::debug!(url = %self.upload_url, size, "Sending photo upload");
        let response = request.send().await.map_err(|e| transport_failure(&e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| transport_failure(&e))?;

        if status.is_success() {
            Ok(photo_from_body(&body))
        } else {
            tracing::warn!(status = status.as_u16(), "Photo upload rejected");
            Err(UploadFailure::from_status(
                status.as_u16(),
                error_detail(&body),
            ))
        }
    }
}

fn build_form(photo: PhotoUpload, on_progress: ProgressFn) -> Result<Form, reqwest::Error> {
    let size = photo.bytes.len() as u64;
    let chunks = stream::iter(chunked(photo.bytes, CHUNK_SIZE));
    let body = reqwest::Body::wrap_stream(ProgressStream::new(chunks, size, on_progress));

    let file_part = Part::stream_with_length(body, size)
        .file_name(photo.file_name)
        .mime_str(&photo.content_type)?;

    let meta = photo.metadata;
    Ok(Form::new()
        .part(PHOTO_FIELD, file_part)
        .text("title", meta.title)
        .text("description", meta.description)
        .text("category", meta.category)
        .text("tags", meta.tags.join(","))
        .text("comments", meta.comments)
        .text("featured", meta.featured.to_string()))
}

/// Read the stored photo from a success body.
///
/// Accepts the fields at the top level or under `photo` / `data`. An empty or
/// non-JSON body still counts as success.
fn photo_from_body(body: &str) -> UploadedPhoto {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return UploadedPhoto::default();
    };
    let node = ["photo", "data"]
        .iter()
        .find_map(|k| value.get(*k).filter(|v| v.is_object()))
        .unwrap_or(&value);

    UploadedPhoto {
        id: node.get("id").and_then(scalar_string),
        url: node.get("url").and_then(scalar_string),
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Human-readable reason from an error body, if the backend sent one.
fn error_detail(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => ["message", "error", "detail"]
            .iter()
            .find_map(|k| value.get(*k).and_then(Value::as_str))
            .map(str::to_string),
        Err(_) if trimmed.len() <= 200 && !trimmed.starts_with('<') => Some(trimmed.to_string()),
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;
    use upload_core::FailureKind;

    #[test]
    fn photo_from_body_reads_nested_and_numeric_ids() {
        assert_eq!(
            photo_from_body(r#"{"id":"abc","url":"https://cdn/x.jpg"}"#),
            UploadedPhoto {
                id: Some("abc".to_string()),
                url: Some("https://cdn/x.jpg".to_string()),
            }
        );
        assert_eq!(
            photo_from_body(r#"{"photo":{"id":42}}"#).id.as_deref(),
            Some("42")
        );
        assert_eq!(photo_from_body(""), UploadedPhoto::default());
        assert_eq!(photo_from_body("OK"), UploadedPhoto::default());
    }

    #[test]
    fn error_detail_prefers_message_fields() {
        assert_eq!(
            error_detail(r#"{"message":"File exceeds 10MB"}"#).as_deref(),
            Some("File exceeds 10MB")
        );
        assert_eq!(
            error_detail(r#"{"error":"bad token"}"#).as_deref(),
            Some("bad token")
        );
        assert_eq!(error_detail("<html>502</html>"), None);
        assert_eq!(error_detail("  "), None);
        assert_eq!(error_detail("quota exceeded").as_deref(), Some("quota exceeded"));
    }

    fn request_complete(buf: &[u8]) -> bool {
        buf.windows(4).any(|w| w == b"\r\n\r\n")
            && (buf.ends_with(b"--\r\n") || buf.ends_with(b"0\r\n\r\n"))
    }

    /// Accept one request, answer with the given status and body, and hand
    /// back the raw request bytes.
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> std::io::Result<(String, JoinHandle<Vec<u8>>)> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            let mut received = Vec::new();
            let Ok((mut socket, _)) = listener.accept().await else {
                return received;
            };
            let mut buf = [0u8; 8192];
            loop {
                match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        received.extend_from_slice(&buf[..n]);
                        if request_complete(&received) {
                            break;
                        }
                    }
                }
            }
            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
            received
        });

        Ok((format!("http://{addr}"), handle))
    }

    fn sample_photo() -> PhotoUpload {
        PhotoUpload {
            file_name: "beach.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            bytes: Bytes::from(vec![0xFFu8; 200 * 1024]),
            metadata: UploadMetadata {
                title: "Beach day".to_string(),
                tags: vec!["sea".to_string(), "summer".to_string()],
                featured: true,
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn uploads_multipart_with_auth_and_progress() -> Result<(), Box<dyn std::error::Error>> {
        let (base, server) = serve_once("201 Created", r#"{"id":"p-9","url":"/p/9.jpg"}"#).await?;
        let client = BackendClient::new(&BackendConfig::new(base).with_auth_token("secret"))?;

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let on_progress: ProgressFn = Arc::new(move |p| sink.lock().unwrap().push(p.percent()));

        let photo = client.upload_photo(sample_photo(), on_progress).await?;
        assert_eq!(photo.id.as_deref(), Some("p-9"));
        assert_eq!(photo.url.as_deref(), Some("/p/9.jpg"));

        let request = String::from_utf8_lossy(&server.await?).to_string();
        assert!(request.starts_with("POST /api/photos/upload "));
        assert!(request.to_ascii_lowercase().contains("authorization: bearer secret"));
        assert!(request.contains(r#"name="photo"; filename="beach.jpg""#));
        assert!(request.contains("Beach day"));
        assert!(request.contains("sea,summer"));

        let seen = seen.lock().unwrap();
        assert!(seen.len() > 1);
        assert_eq!(seen.last(), Some(&100));
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        Ok(())
    }

    #[tokio::test]
    async fn maps_rejections_to_failure_kinds() -> Result<(), Box<dyn std::error::Error>> {
        let (base, _server) =
            serve_once("413 Payload Too Large", r#"{"message":"limit is 100KB"}"#).await?;
        let client = BackendClient::new(&BackendConfig::new(base))?;

        let err = client
            .upload_photo(sample_photo(), Arc::new(|_| {}))
            .await
            .err()
            .ok_or("expected a failure")?;

        assert_eq!(err.kind, FailureKind::TooLarge);
        assert_eq!(err.status, Some(413));
        assert_eq!(err.detail.as_deref(), Some("limit is 100KB"));
        Ok(())
    }

    #[tokio::test]
    async fn malformed_content_type_is_a_validation_failure()
    -> Result<(), Box<dyn std::error::Error>> {
        let client = BackendClient::new(&BackendConfig::new("http://127.0.0.1:1"))?;
        let photo = PhotoUpload {
            content_type: "not a mime type".to_string(),
            ..sample_photo()
        };

        let err = client
            .upload_photo(photo, Arc::new(|_| {}))
            .await
            .err()
            .ok_or("expected a failure")?;

        assert_eq!(err.kind, FailureKind::Validation);
        assert_eq!(err.status, None);
        assert!(err.detail.is_some_and(|d| d.contains("not a mime type")));
        Ok(())
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_network_failure() -> Result<(), Box<dyn std::error::Error>> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        drop(listener);

        let client = BackendClient::new(&BackendConfig::new(format!("http://{addr}")))?;
        let err = client
            .upload_photo(sample_photo(), Arc::new(|_| {}))
            .await
            .err()
            .ok_or("expected a failure")?;

        assert_eq!(err.kind, FailureKind::Network);
        assert_eq!(err.status, None);
        Ok(())
    }
}
