#![allow(clippy::disallowed_methods)]

mod common;

use chrono::{Duration, Utc};
use std::error::Error;
use upload_core::{
    QueuedUpload, SourceFile, UploadFailure, UploadFilter, UploadId, UploadStatus, UploadedPhoto,
};

use db::{DbError, repositories::UploadRepository};

fn upload(name: &str, offset_secs: i64) -> QueuedUpload {
    let id = UploadId::new();
    let mut upload = QueuedUpload::new(
        id,
        SourceFile {
            file_name: name.to_string(),
            size: 2048,
            content_type: "image/jpeg".to_string(),
            key: format!("uploads/{id}/{name}"),
        },
    );
    upload.created_at = Utc::now() + Duration::seconds(offset_secs);
    upload
}

async fn reset_db() -> Result<(), DbError> {
    db::get_db()?.query("DELETE upload;").await?;
    Ok(())
}

// Single test: the in-memory engine is bound to the runtime that opened it.
#[tokio::test]
async fn test_upload_repository() -> Result<(), Box<dyn Error>> {
    let _guard = common::setup_db().await?;

    // upsert / get / update / delete
    let mut first = upload("first.jpg", 0);
    first.metadata.tags = vec!["travel".to_string()];
    let saved = UploadRepository::upsert(&first).await?;
    assert_eq!(saved.id, first.id);
    assert_eq!(saved.metadata.tags, vec!["travel".to_string()]);

    let loaded = UploadRepository::get(first.id).await?;
    assert_eq!(loaded.source.file_name, "first.jpg");
    assert_eq!(loaded.status, UploadStatus::Pending);

    first.status = UploadStatus::Error {
        failed_at: Utc::now(),
        failure: UploadFailure::from_status(413, Some("limit 10MB".to_string())),
    };
    UploadRepository::upsert(&first).await?;
    let loaded = UploadRepository::get(first.id).await?;
    assert_eq!(
        loaded.error_message(),
        Some("The photo is too large to upload.")
    );

    UploadRepository::delete(first.id).await?;
    let missing = UploadRepository::get(first.id).await;
    assert!(matches!(missing, Err(DbError::NotFound(_))));
    UploadRepository::delete(first.id).await?;

    // list keeps creation order and honours filters
    reset_db().await?;
    let pending = upload("pending.jpg", 2);
    let mut done = upload("done.jpg", 1);
    done.status = UploadStatus::Completed {
        completed_at: Utc::now(),
        photo: UploadedPhoto {
            id: Some("p-1".to_string()),
            url: None,
        },
    };
    done.progress = 100;
    let mut paused = upload("paused.jpg", 0);
    paused.status = UploadStatus::Paused {
        paused_at: Utc::now(),
    };
    for u in [&pending, &done, &paused] {
        UploadRepository::upsert(u).await?;
    }

    let all: Vec<UploadId> = UploadRepository::list(UploadFilter::All)
        .await?
        .into_iter()
        .map(|u| u.id)
        .collect();
    assert_eq!(all, vec![paused.id, done.id, pending.id]);

    let active = UploadRepository::list(UploadFilter::Active).await?;
    assert_eq!(active.len(), 2);
    assert!(active.iter().all(|u| u.status.is_active()));

    let completed = UploadRepository::list(UploadFilter::Completed).await?;
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].progress, 100);

    // counts and clearing completed
    let counts = UploadRepository::count_by_status().await?;
    assert_eq!(counts.pending, 1);
    assert_eq!(counts.paused, 1);
    assert_eq!(counts.completed, 1);
    assert_eq!(counts.total(), 3);

    let cleared = UploadRepository::delete_completed().await?;
    assert_eq!(cleared, vec![done.id]);
    let counts = UploadRepository::count_by_status().await?;
    assert_eq!(counts.completed, 0);
    assert_eq!(counts.active(), 2);

    Ok(())
}
