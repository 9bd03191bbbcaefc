//! Upload job types: one record per file waiting for, or going through, upload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::UploadFailure;

/// Unique identifier for an upload, using ULID for chronological sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UploadId(pub Ulid);

impl UploadId {
    /// Create a new unique upload ID.
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Parse an upload ID from a string.
    pub fn parse(s: &str) -> Result<Self, ulid::DecodeError> {
        Ok(Self(Ulid::from_string(s)?))
    }
}

impl Default for UploadId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UploadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the backend returned for a stored photo.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadedPhoto {
    /// Backend identifier of the new photo.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Public URL of the stored photo, when the backend reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Current status of an upload in its lifecycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UploadStatus {
    /// Waiting for a processor to pick it up.
    #[default]
    Pending,
    /// The upload request is in flight.
    Uploading {
        started_at: DateTime<Utc>,
        attempt: u32,
    },
    /// Held back by the user; not dispatched until resumed.
    Paused { paused_at: DateTime<Utc> },
    /// The backend stored the photo.
    Completed {
        completed_at: DateTime<Utc>,
        photo: UploadedPhoto,
    },
    /// The request failed; waits for a manual retry or removal.
    Error {
        failed_at: DateTime<Utc>,
        failure: UploadFailure,
    },
}

impl UploadStatus {
    /// Get a simple status string for display.
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStatus::Pending => "pending",
            UploadStatus::Uploading { .. } => "uploading",
            UploadStatus::Paused { .. } => "paused",
            UploadStatus::Completed { .. } => "completed",
            UploadStatus::Error { .. } => "error",
        }
    }

    /// Pending, uploading or paused.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            UploadStatus::Pending | UploadStatus::Uploading { .. } | UploadStatus::Paused { .. }
        )
    }

    /// Only settled uploads may be removed from the queue.
    pub fn can_remove(&self) -> bool {
        matches!(self, UploadStatus::Completed { .. } | UploadStatus::Error { .. })
    }

    pub fn can_pause(&self) -> bool {
        matches!(self, UploadStatus::Pending | UploadStatus::Uploading { .. })
    }

    pub fn can_resume(&self) -> bool {
        matches!(self, UploadStatus::Paused { .. })
    }

    pub fn can_retry(&self) -> bool {
        matches!(self, UploadStatus::Error { .. })
    }

    /// The attempt number of an in-flight upload.
    pub fn attempt(&self) -> Option<u32> {
        match self {
            UploadStatus::Uploading { attempt, .. } => Some(*attempt),
            _ => None,
        }
    }

    /// User-facing error text for failed uploads.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            UploadStatus::Error { failure, .. } => Some(&failure.message),
            _ => None,
        }
    }
}

/// Descriptive fields sent along with the photo.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadMetadata {
    pub title: String,
    pub description: String,
    pub category: String,
    pub tags: Vec<String>,
    pub comments: String,
    pub featured: bool,
}

impl UploadMetadata {
    /// Split a comma separated tag string, dropping blanks and duplicates.
    pub fn parse_tags(input: &str) -> Vec<String> {
        let mut tags: Vec<String> = Vec::new();
        for tag in input.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            if !tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
                tags.push(tag.to_string());
            }
        }
        tags
    }
}

/// The accepted file, staged until the upload settles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub file_name: String,
    pub size: u64,
    pub content_type: String,
    /// Staging area key holding the file bytes.
    pub key: String,
}

/// One file's upload attempt with its metadata and status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedUpload {
    pub id: UploadId,
    pub source: SourceFile,
    pub status: UploadStatus,
    /// Percent sent, 0..=100.
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub metadata: UploadMetadata,
    /// Number of times the upload has been dispatched.
    #[serde(default)]
    pub attempts: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl QueuedUpload {
    /// Create a new pending upload for a staged file.
    pub fn new(id: UploadId, source: SourceFile) -> Self {
        let now = Utc::now();
        let metadata = UploadMetadata {
            title: file_stem(&source.file_name).to_string(),
            ..Default::default()
        };
        Self {
            id,
            source,
            status: UploadStatus::Pending,
            progress: 0,
            metadata,
            attempts: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the metadata; a blank title falls back to the file stem.
    pub fn with_metadata(mut self, mut metadata: UploadMetadata) -> Self {
        if metadata.title.trim().is_empty() {
            metadata.title = file_stem(&self.source.file_name).to_string();
        }
        self.metadata = metadata;
        self
    }

    pub fn error_message(&self) -> Option<&str> {
        self.status.error_message()
    }
}

/// Bytes sent so far for an in-flight request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadProgress {
    pub bytes_sent: u64,
    pub total_bytes: u64,
}

impl UploadProgress {
    pub fn new(bytes_sent: u64, total_bytes: u64) -> Self {
        Self {
            bytes_sent,
            total_bytes,
        }
    }

    /// Whole percent sent, clamped to 0..=100. An empty body counts as done.
    pub fn percent(&self) -> u8 {
        if self.total_bytes == 0 {
            return 100;
        }
        let pct = self.bytes_sent.saturating_mul(100) / self.total_bytes;
        pct.min(100) as u8
    }
}

fn file_stem(file_name: &str) -> &str {
    match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(name: &str) -> SourceFile {
        SourceFile {
            file_name: name.to_string(),
            size: 10,
            content_type: "image/jpeg".to_string(),
            key: format!("uploads/{name}"),
        }
    }

    #[test]
    fn blank_title_falls_back_to_file_stem() {
        let upload = QueuedUpload::new(UploadId::new(), source("sunset.beach.jpg"))
            .with_metadata(UploadMetadata {
                title: "  ".to_string(),
                featured: true,
                ..Default::default()
            });
        assert_eq!(upload.metadata.title, "sunset.beach");
        assert!(upload.metadata.featured);
        assert_eq!(upload.status, UploadStatus::Pending);
        assert_eq!(upload.progress, 0);
    }

    #[test]
    fn dotfile_keeps_full_name_as_title() {
        let upload = QueuedUpload::new(UploadId::new(), source(".hidden"));
        assert_eq!(upload.metadata.title, ".hidden");
    }

    #[test]
    fn progress_percent_is_clamped() {
        assert_eq!(UploadProgress::new(0, 200).percent(), 0);
        assert_eq!(UploadProgress::new(199, 200).percent(), 99);
        assert_eq!(UploadProgress::new(250, 200).percent(), 100);
        assert_eq!(UploadProgress::new(0, 0).percent(), 100);
    }

    #[test]
    fn parse_tags_trims_and_dedupes() {
        let tags = UploadMetadata::parse_tags(" Travel, sea ,,travel, Night ");
        assert_eq!(tags, vec!["Travel", "sea", "Night"]);
    }

    #[test]
    fn status_serializes_with_tag() -> Result<(), serde_json::Error> {
        let json = serde_json::to_value(UploadStatus::Pending)?;
        assert_eq!(json["status"], "pending");

        let status = UploadStatus::Uploading {
            started_at: Utc::now(),
            attempt: 2,
        };
        let back: UploadStatus = serde_json::from_value(serde_json::to_value(&status)?)?;
        assert_eq!(back.attempt(), Some(2));
        assert_eq!(back.as_str(), "uploading");
        Ok(())
    }

    #[test]
    fn only_settled_uploads_can_be_removed() {
        assert!(!UploadStatus::Pending.can_remove());
        assert!(
            !UploadStatus::Paused {
                paused_at: Utc::now()
            }
            .can_remove()
        );
        assert!(
            UploadStatus::Completed {
                completed_at: Utc::now(),
                photo: UploadedPhoto::default(),
            }
            .can_remove()
        );
    }
}
