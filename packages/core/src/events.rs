//! Event types for real-time updates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{QueueCounts, QueuedUpload, UploadFailure, UploadId, UploadedPhoto};

/// Events emitted by the upload queue for real-time updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum UploadEvent {
    /// A file was accepted into the queue.
    Enqueued {
        upload: QueuedUpload,
        timestamp: DateTime<Utc>,
    },
    /// A processor started sending the file.
    Started {
        upload_id: UploadId,
        attempt: u32,
        processor_id: String,
        timestamp: DateTime<Utc>,
    },
    /// The in-flight request advanced.
    Progress {
        upload_id: UploadId,
        percent: u8,
        timestamp: DateTime<Utc>,
    },
    /// The backend stored the photo.
    Completed {
        upload_id: UploadId,
        photo: UploadedPhoto,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
    /// The request failed.
    Failed {
        upload_id: UploadId,
        failure: UploadFailure,
        timestamp: DateTime<Utc>,
    },
    /// An in-flight attempt lost its processor and went back in line.
    Requeued {
        upload_id: UploadId,
        attempt: u32,
        timestamp: DateTime<Utc>,
    },
    /// The user paused the upload.
    Paused {
        upload_id: UploadId,
        aborted_request: bool,
        timestamp: DateTime<Utc>,
    },
    /// The user resumed a paused upload.
    Resumed {
        upload_id: UploadId,
        timestamp: DateTime<Utc>,
    },
    /// The user retried a failed upload.
    Retried {
        upload_id: UploadId,
        timestamp: DateTime<Utc>,
    },
    /// The user removed a settled upload.
    Removed {
        upload_id: UploadId,
        timestamp: DateTime<Utc>,
    },
    /// Completed uploads were cleared.
    ClearedCompleted {
        upload_ids: Vec<UploadId>,
        timestamp: DateTime<Utc>,
    },
    /// Per-status counts changed.
    CountsUpdated {
        counts: QueueCounts,
        timestamp: DateTime<Utc>,
    },
}

impl UploadEvent {
    /// Get the timestamp of the event.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            UploadEvent::Enqueued { timestamp, .. } => *timestamp,
            UploadEvent::Started { timestamp, .. } => *timestamp,
            UploadEvent::Progress { timestamp, .. } => *timestamp,
            UploadEvent::Completed { timestamp, .. } => *timestamp,
            UploadEvent::Failed { timestamp, .. } => *timestamp,
            UploadEvent::Requeued { timestamp, .. } => *timestamp,
            UploadEvent::Paused { timestamp, .. } => *timestamp,
            UploadEvent::Resumed { timestamp, .. } => *timestamp,
            UploadEvent::Retried { timestamp, .. } => *timestamp,
            UploadEvent::Removed { timestamp, .. } => *timestamp,
            UploadEvent::ClearedCompleted { timestamp, .. } => *timestamp,
            UploadEvent::CountsUpdated { timestamp, .. } => *timestamp,
        }
    }

    /// Get the upload ID associated with this event, if any.
    pub fn upload_id(&self) -> Option<UploadId> {
        match self {
            UploadEvent::Enqueued { upload, .. } => Some(upload.id),
            UploadEvent::Started { upload_id, .. } => Some(*upload_id),
            UploadEvent::Progress { upload_id, .. } => Some(*upload_id),
            UploadEvent::Completed { upload_id, .. } => Some(*upload_id),
            UploadEvent::Failed { upload_id, .. } => Some(*upload_id),
            UploadEvent::Requeued { upload_id, .. } => Some(*upload_id),
            UploadEvent::Paused { upload_id, .. } => Some(*upload_id),
            UploadEvent::Resumed { upload_id, .. } => Some(*upload_id),
            UploadEvent::Retried { upload_id, .. } => Some(*upload_id),
            UploadEvent::Removed { upload_id, .. } => Some(*upload_id),
            UploadEvent::ClearedCompleted { .. } | UploadEvent::CountsUpdated { .. } => None,
        }
    }

    /// Get a short description of this event for logging.
    pub fn description(&self) -> String {
        match self {
            UploadEvent::Enqueued { upload, .. } => {
                format!("Upload {} ({}) enqueued", upload.id, upload.source.file_name)
            }
            UploadEvent::Started {
                upload_id,
                attempt,
                processor_id,
                ..
            } => format!(
                "Upload {} attempt {} started by {}",
                upload_id, attempt, processor_id
            ),
            UploadEvent::Progress {
                upload_id, percent, ..
            } => format!("Upload {} at {}%", upload_id, percent),
            UploadEvent::Completed {
                upload_id,
                duration_ms,
                ..
            } => format!("Upload {} completed in {}ms", upload_id, duration_ms),
            UploadEvent::Failed {
                upload_id, failure, ..
            } => format!("Upload {} failed: {}", upload_id, failure),
            UploadEvent::Requeued {
                upload_id, attempt, ..
            } => format!("Upload {} requeued after attempt {}", upload_id, attempt),
            UploadEvent::Paused {
                upload_id,
                aborted_request,
                ..
            } => {
                let aborted = if *aborted_request {
                    " (request aborted)"
                } else {
                    ""
                };
                format!("Upload {} paused{}", upload_id, aborted)
            }
            UploadEvent::Resumed { upload_id, .. } => format!("Upload {} resumed", upload_id),
            UploadEvent::Retried { upload_id, .. } => format!("Upload {} retried", upload_id),
            UploadEvent::Removed { upload_id, .. } => format!("Upload {} removed", upload_id),
            UploadEvent::ClearedCompleted { upload_ids, .. } => {
                format!("Cleared {} completed uploads", upload_ids.len())
            }
            UploadEvent::CountsUpdated { counts, .. } => format!(
                "Queue counts: {} active, {} completed, {} failed",
                counts.active(),
                counts.completed,
                counts.error
            ),
        }
    }
}
