//! Upload repository for queue persistence.

use serde::{Deserialize, Serialize};
use upload_core::{QueueCounts, QueuedUpload, UploadFilter, UploadId};

use crate::{DbError, get_db};

const TABLE: &str = "upload";

/// Repository for upload persistence operations.
pub struct UploadRepository;

/// Stored document: the upload plus columns used by queries.
#[derive(Debug, Serialize, Deserialize)]
struct UploadDoc {
    upload: QueuedUpload,
    status_name: String,
    created_ms: i64,
}

impl From<&QueuedUpload> for UploadDoc {
    fn from(upload: &QueuedUpload) -> Self {
        Self {
            upload: upload.clone(),
            status_name: upload.status.as_str().to_string(),
            created_ms: upload.created_at.timestamp_millis(),
        }
    }
}

/// Status names covered by a view filter; `None` means no restriction.
fn filter_statuses(filter: UploadFilter) -> Option<Vec<String>> {
    let names: &[&str] = match filter {
        UploadFilter::All => return None,
        UploadFilter::Active => &["pending", "uploading", "paused"],
        UploadFilter::Completed => &["completed"],
        UploadFilter::Error => &["error"],
    };
    Some(names.iter().map(|s| s.to_string()).collect())
}

impl UploadRepository {
    /// Insert or replace an upload record.
    pub async fn upsert(upload: &QueuedUpload) -> Result<QueuedUpload, DbError> {
        let db = get_db()?;

        let record: Option<UploadDoc> = db
            .upsert((TABLE, upload.id.to_string()))
            .content(UploadDoc::from(upload))
            .await?;

        record
            .map(|r| r.upload)
            .ok_or_else(|| DbError::Query(format!("Failed to save upload {}", upload.id)))
    }

    /// Get an upload by ID.
    pub async fn get(id: UploadId) -> Result<QueuedUpload, DbError> {
        let db = get_db()?;

        let record: Option<UploadDoc> = db.select((TABLE, id.to_string())).await?;

        record
            .map(|r| r.upload)
            .ok_or_else(|| DbError::NotFound(format!("Upload not found: {}", id)))
    }

    /// List uploads matching the filter, oldest first.
    pub async fn list(filter: UploadFilter) -> Result<Vec<QueuedUpload>, DbError> {
        let db = get_db()?;

        let mut response = match filter_statuses(filter) {
            Some(statuses) => {
                db.query(
                    "SELECT * FROM upload WHERE status_name IN $statuses ORDER BY created_ms ASC",
                )
                .bind(("statuses", statuses))
                .await?
            }
            None => {
                db.query("SELECT * FROM upload ORDER BY created_ms ASC")
                    .await?
            }
        };

        let records: Vec<UploadDoc> = response.take(0)?;
        Ok(records.into_iter().map(|r| r.upload).collect())
    }

    /// Delete an upload record. Deleting a missing record is not an error.
    pub async fn delete(id: UploadId) -> Result<(), DbError> {
        let db = get_db()?;

        let _: Option<UploadDoc> = db.delete((TABLE, id.to_string())).await?;

        Ok(())
    }

    /// Delete every completed upload, returning the removed ids.
    pub async fn delete_completed() -> Result<Vec<UploadId>, DbError> {
        let db = get_db()?;

        let mut response = db
            .query("DELETE upload WHERE status_name = 'completed' RETURN BEFORE")
            .await?;
        let records: Vec<UploadDoc> = response.take(0)?;

        Ok(records.into_iter().map(|r| r.upload.id).collect())
    }

    /// Count stored uploads per status.
    pub async fn count_by_status() -> Result<QueueCounts, DbError> {
        let db = get_db()?;

        let mut response = db
            .query("SELECT status_name, count() AS count FROM upload GROUP BY status_name")
            .await?;

        #[derive(Deserialize)]
        struct StatusCount {
            status_name: String,
            count: i64,
        }

        let rows: Vec<StatusCount> = response.take(0)?;

        let mut counts = QueueCounts::default();
        for row in rows {
            let n = row.count.max(0) as u64;
            match row.status_name.as_str() {
                "pending" => counts.pending = n,
                "uploading" => counts.uploading = n,
                "paused" => counts.paused = n,
                "completed" => counts.completed = n,
                "error" => counts.error = n,
                other => tracing::warn!("Unknown upload status in database: {}", other),
            }
        }

        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_filter_covers_three_statuses() {
        assert_eq!(filter_statuses(UploadFilter::All), None);
        assert_eq!(
            filter_statuses(UploadFilter::Active).map(|s| s.len()),
            Some(3)
        );
        assert_eq!(
            filter_statuses(UploadFilter::Error),
            Some(vec!["error".to_string()])
        );
    }
}
