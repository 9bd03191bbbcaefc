//! In-memory upload queue state.
//!
//! `UploadQueueStore` is a pure state container: it enforces the status
//! transitions and keeps insertion order, but does no I/O. The queue actor
//! owns one and layers persistence, staging cleanup and events on top.

use std::collections::HashMap;

use chrono::Utc;

use crate::{
    QueueConfig, QueueCounts, QueueError, QueuedUpload, UploadFailure, UploadFilter, UploadId,
    UploadStatus, UploadedPhoto,
};

/// Upload records keyed by id, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct UploadQueueStore {
    config: QueueConfig,
    order: Vec<UploadId>,
    uploads: HashMap<UploadId, QueuedUpload>,
}

impl UploadQueueStore {
    /// Create an empty store.
    pub fn new(config: QueueConfig) -> Self {
        Self {
            config,
            order: Vec::new(),
            uploads: HashMap::new(),
        }
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, id: UploadId) -> Option<&QueuedUpload> {
        self.uploads.get(&id)
    }

    /// Uploads matching the filter, oldest first.
    pub fn list(&self, filter: UploadFilter) -> impl Iterator<Item = &QueuedUpload> {
        self.order
            .iter()
            .filter_map(|id| self.uploads.get(id))
            .filter(move |u| filter.matches(&u.status))
    }

    pub fn counts(&self) -> QueueCounts {
        let mut counts = QueueCounts::default();
        for upload in self.uploads.values() {
            counts.record(&upload.status);
        }
        counts
    }

    /// Append a new upload.
    pub fn add_to_queue(&mut self, upload: QueuedUpload) -> Result<&QueuedUpload, QueueError> {
        let id = upload.id;
        if self.uploads.contains_key(&id) {
            return Err(QueueError::DuplicateId(id));
        }
        if let Some(max_size) = self.config.max_queue_size
            && self.counts().active() as usize >= max_size
        {
            return Err(QueueError::QueueFull(max_size));
        }

        self.order.push(id);
        Ok(self.uploads.entry(id).or_insert(upload))
    }

    /// Remove a completed or failed upload.
    pub fn remove_from_queue(&mut self, id: UploadId) -> Result<QueuedUpload, QueueError> {
        let upload = self.uploads.get(&id).ok_or(QueueError::NotFound(id))?;
        if !upload.status.can_remove() {
            return Err(QueueError::InvalidTransition {
                id,
                from: upload.status.as_str(),
                to: "removed",
            });
        }

        self.order.retain(|u| *u != id);
        self.uploads.remove(&id).ok_or(QueueError::NotFound(id))
    }

    /// Pause a pending or uploading upload, returning its previous status.
    ///
    /// When the previous status is `Uploading` the caller must abort the
    /// in-flight request.
    pub fn pause_upload(&mut self, id: UploadId) -> Result<UploadStatus, QueueError> {
        let upload = self.get_mut(id)?;
        if !upload.status.can_pause() {
            return Err(invalid(id, &upload.status, "paused"));
        }

        let now = Utc::now();
        let previous = std::mem::replace(&mut upload.status, UploadStatus::Paused { paused_at: now });
        upload.progress = 0;
        upload.updated_at = now;
        Ok(previous)
    }

    /// Put a paused upload back in line for dispatch.
    pub fn resume_upload(&mut self, id: UploadId) -> Result<&QueuedUpload, QueueError> {
        let upload = self.get_mut(id)?;
        if !upload.status.can_resume() {
            return Err(invalid(id, &upload.status, "pending"));
        }

        upload.status = UploadStatus::Pending;
        upload.updated_at = Utc::now();
        Ok(upload)
    }

    /// Re-arm a failed upload.
    pub fn retry_upload(&mut self, id: UploadId) -> Result<&QueuedUpload, QueueError> {
        let upload = self.get_mut(id)?;
        if !upload.status.can_retry() {
            return Err(invalid(id, &upload.status, "pending"));
        }

        upload.status = UploadStatus::Pending;
        upload.progress = 0;
        upload.updated_at = Utc::now();
        Ok(upload)
    }

    /// Drop every completed upload, returning the removed records.
    pub fn clear_completed(&mut self) -> Vec<QueuedUpload> {
        let completed: Vec<UploadId> = self
            .list(UploadFilter::Completed)
            .map(|u| u.id)
            .collect();

        self.order.retain(|id| !completed.contains(id));
        completed
            .into_iter()
            .filter_map(|id| self.uploads.remove(&id))
            .collect()
    }

    /// The oldest pending upload.
    pub fn next_pending(&self) -> Option<UploadId> {
        self.order.iter().copied().find(|id| {
            self.uploads
                .get(id)
                .is_some_and(|u| u.status == UploadStatus::Pending)
        })
    }

    /// Mark a pending upload as in flight and hand out a copy for the processor.
    pub fn start_upload(&mut self, id: UploadId) -> Result<QueuedUpload, QueueError> {
        let upload = self.get_mut(id)?;
        if upload.status != UploadStatus::Pending {
            return Err(invalid(id, &upload.status, "uploading"));
        }

        let now = Utc::now();
        upload.attempts = upload.attempts.saturating_add(1);
        upload.status = UploadStatus::Uploading {
            started_at: now,
            attempt: upload.attempts,
        };
        upload.progress = 0;
        upload.updated_at = now;
        Ok(upload.clone())
    }

    /// Record progress for the current attempt. Returns whether it changed.
    pub fn set_progress(
        &mut self,
        id: UploadId,
        attempt: u32,
        percent: u8,
    ) -> Result<bool, QueueError> {
        let upload = self.current_attempt(id, attempt)?;
        let percent = percent.min(100);
        if percent <= upload.progress {
            return Ok(false);
        }

        upload.progress = percent;
        upload.updated_at = Utc::now();
        Ok(true)
    }

    /// Settle the current attempt as stored by the backend.
    pub fn complete_upload(
        &mut self,
        id: UploadId,
        attempt: u32,
        photo: UploadedPhoto,
    ) -> Result<&QueuedUpload, QueueError> {
        let upload = self.current_attempt(id, attempt)?;
        let now = Utc::now();
        upload.status = UploadStatus::Completed {
            completed_at: now,
            photo,
        };
        upload.progress = 100;
        upload.updated_at = now;
        Ok(upload)
    }

    /// Settle the current attempt as failed.
    pub fn fail_upload(
        &mut self,
        id: UploadId,
        attempt: u32,
        failure: UploadFailure,
    ) -> Result<&QueuedUpload, QueueError> {
        let upload = self.current_attempt(id, attempt)?;
        let now = Utc::now();
        upload.status = UploadStatus::Error {
            failed_at: now,
            failure,
        };
        upload.updated_at = now;
        Ok(upload)
    }

    /// Put an in-flight attempt back in line without counting it as failed.
    ///
    /// Used when the processor holding it went away before settling.
    pub fn requeue_upload(
        &mut self,
        id: UploadId,
        attempt: u32,
    ) -> Result<&QueuedUpload, QueueError> {
        let upload = self.current_attempt(id, attempt)?;
        upload.status = UploadStatus::Pending;
        upload.progress = 0;
        upload.updated_at = Utc::now();
        Ok(upload)
    }

    /// Load records saved by a previous run, oldest first.
    ///
    /// Records that were mid-flight come back paused; duplicates are skipped.
    /// Returns the number of records loaded.
    pub fn restore(&mut self, mut uploads: Vec<QueuedUpload>) -> usize {
        uploads.sort_by_key(|u| u.created_at);

        let mut loaded = 0;
        for mut upload in uploads {
            if self.uploads.contains_key(&upload.id) {
                continue;
            }
            if let UploadStatus::Uploading { .. } = upload.status {
                upload.status = UploadStatus::Paused {
                    paused_at: Utc::now(),
                };
                upload.progress = 0;
            }
            self.order.push(upload.id);
            self.uploads.insert(upload.id, upload);
            loaded += 1;
        }
        loaded
    }

    fn get_mut(&mut self, id: UploadId) -> Result<&mut QueuedUpload, QueueError> {
        self.uploads.get_mut(&id).ok_or(QueueError::NotFound(id))
    }

    fn current_attempt(
        &mut self,
        id: UploadId,
        attempt: u32,
    ) -> Result<&mut QueuedUpload, QueueError> {
        let upload = self.get_mut(id)?;
        if upload.status.attempt() != Some(attempt) {
            return Err(QueueError::StaleAttempt { id, attempt });
        }
        Ok(upload)
    }
}

fn invalid(id: UploadId, from: &UploadStatus, to: &'static str) -> QueueError {
    QueueError::InvalidTransition {
        id,
        from: from.as_str(),
        to,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FailureKind, SourceFile};

    fn upload(name: &str) -> QueuedUpload {
        QueuedUpload::new(
            UploadId::new(),
            SourceFile {
                file_name: name.to_string(),
                size: 1024,
                content_type: "image/jpeg".to_string(),
                key: format!("uploads/{name}"),
            },
        )
    }

    fn store_with(names: &[&str]) -> Result<(UploadQueueStore, Vec<UploadId>), QueueError> {
        let mut store = UploadQueueStore::new(QueueConfig::default());
        let mut ids = Vec::new();
        for name in names {
            ids.push(store.add_to_queue(upload(name))?.id);
        }
        Ok((store, ids))
    }

    #[test]
    fn dispatches_in_insertion_order() -> Result<(), QueueError> {
        let (mut store, ids) = store_with(&["a.jpg", "b.jpg", "c.jpg"])?;

        assert_eq!(store.next_pending(), Some(ids[0]));
        store.start_upload(ids[0])?;
        assert_eq!(store.next_pending(), Some(ids[1]));

        store.pause_upload(ids[1])?;
        assert_eq!(store.next_pending(), Some(ids[2]));
        Ok(())
    }

    #[test]
    fn duplicate_ids_are_rejected() -> Result<(), QueueError> {
        let (mut store, _) = store_with(&[])?;
        let first = upload("a.jpg");
        let copy = first.clone();
        store.add_to_queue(first)?;
        assert_eq!(store.add_to_queue(copy.clone()), Err(QueueError::DuplicateId(copy.id)));
        assert_eq!(store.len(), 1);
        Ok(())
    }

    #[test]
    fn full_queue_counts_only_active_uploads() -> Result<(), QueueError> {
        let config = QueueConfig {
            max_queue_size: Some(1),
            ..Default::default()
        };
        let mut store = UploadQueueStore::new(config);
        let id = store.add_to_queue(upload("a.jpg"))?.id;
        assert_eq!(store.add_to_queue(upload("b.jpg")).map(|u| u.id), Err(QueueError::QueueFull(1)));

        store.start_upload(id)?;
        store.complete_upload(id, 1, UploadedPhoto::default())?;
        assert!(store.add_to_queue(upload("b.jpg")).is_ok());
        Ok(())
    }

    #[test]
    fn full_lifecycle_with_retry() -> Result<(), QueueError> {
        let (mut store, ids) = store_with(&["a.jpg"])?;
        let id = ids[0];

        let dispatched = store.start_upload(id)?;
        assert_eq!(dispatched.attempts, 1);
        assert!(store.set_progress(id, 1, 40)?);
        assert!(!store.set_progress(id, 1, 30)?);
        assert_eq!(store.get(id).map(|u| u.progress), Some(40));

        store.fail_upload(id, 1, UploadFailure::from_status(500, None))?;
        assert_eq!(
            store.get(id).and_then(|u| u.error_message().map(str::to_string)),
            Some("The server failed to process the upload. Try again later.".to_string())
        );

        let retried = store.retry_upload(id)?;
        assert_eq!(retried.status, UploadStatus::Pending);
        assert_eq!(retried.progress, 0);

        let second = store.start_upload(id)?;
        assert_eq!(second.status.attempt(), Some(2));
        store.complete_upload(id, 2, UploadedPhoto::default())?;
        assert_eq!(store.get(id).map(|u| u.progress), Some(100));
        Ok(())
    }

    #[test]
    fn requeue_returns_lost_attempt_to_the_front() -> Result<(), QueueError> {
        let (mut store, ids) = store_with(&["a.jpg", "b.jpg"])?;
        store.start_upload(ids[0])?;
        store.set_progress(ids[0], 1, 40)?;

        assert_eq!(
            store.requeue_upload(ids[0], 2).map(|_| ()),
            Err(QueueError::StaleAttempt { id: ids[0], attempt: 2 })
        );

        let upload = store.requeue_upload(ids[0], 1)?;
        assert_eq!(upload.status, UploadStatus::Pending);
        assert_eq!(upload.progress, 0);
        assert_eq!(store.next_pending(), Some(ids[0]));

        assert_eq!(store.start_upload(ids[0])?.attempts, 2);
        Ok(())
    }

    #[test]
    fn stale_settlement_is_ignored() -> Result<(), QueueError> {
        let (mut store, ids) = store_with(&["a.jpg"])?;
        let id = ids[0];

        store.start_upload(id)?;
        let previous = store.pause_upload(id)?;
        assert_eq!(previous.attempt(), Some(1));

        let late = store.complete_upload(id, 1, UploadedPhoto::default()).map(|u| u.id);
        assert_eq!(late, Err(QueueError::StaleAttempt { id, attempt: 1 }));

        store.resume_upload(id)?;
        store.start_upload(id)?;
        let late = store.fail_upload(id, 1, UploadFailure::network("reset")).map(|u| u.id);
        assert_eq!(late, Err(QueueError::StaleAttempt { id, attempt: 1 }));
        assert!(store.complete_upload(id, 2, UploadedPhoto::default()).is_ok());
        Ok(())
    }

    #[test]
    fn invalid_transitions_are_rejected() -> Result<(), QueueError> {
        let (mut store, ids) = store_with(&["a.jpg"])?;
        let id = ids[0];

        assert!(matches!(
            store.resume_upload(id),
            Err(QueueError::InvalidTransition { from: "pending", .. })
        ));
        assert!(matches!(
            store.retry_upload(id),
            Err(QueueError::InvalidTransition { .. })
        ));
        assert!(matches!(
            store.remove_from_queue(id),
            Err(QueueError::InvalidTransition { to: "removed", .. })
        ));

        store.start_upload(id)?;
        store.complete_upload(id, 1, UploadedPhoto::default())?;
        assert!(matches!(
            store.pause_upload(id),
            Err(QueueError::InvalidTransition { from: "completed", .. })
        ));
        assert!(matches!(
            store.start_upload(id),
            Err(QueueError::InvalidTransition { .. })
        ));
        Ok(())
    }

    #[test]
    fn remove_and_clear_completed() -> Result<(), QueueError> {
        let (mut store, ids) = store_with(&["a.jpg", "b.jpg", "c.jpg"])?;
        for (attempt_id, ok) in [(ids[0], true), (ids[1], false)] {
            store.start_upload(attempt_id)?;
            if ok {
                store.complete_upload(attempt_id, 1, UploadedPhoto::default())?;
            } else {
                store.fail_upload(attempt_id, 1, UploadFailure::from_status(413, None))?;
            }
        }

        let counts = store.counts();
        assert_eq!((counts.completed, counts.error, counts.pending), (1, 1, 1));

        let cleared = store.clear_completed();
        assert_eq!(cleared.len(), 1);
        assert_eq!(cleared[0].id, ids[0]);

        let removed = store.remove_from_queue(ids[1])?;
        assert!(matches!(
            removed.status,
            UploadStatus::Error { ref failure, .. } if failure.kind == FailureKind::TooLarge
        ));
        assert_eq!(store.list(UploadFilter::All).map(|u| u.id).collect::<Vec<_>>(), vec![ids[2]]);
        assert_eq!(store.remove_from_queue(ids[1]).map(|u| u.id), Err(QueueError::NotFound(ids[1])));
        Ok(())
    }

    #[test]
    fn restore_pauses_interrupted_uploads() {
        let mut older = upload("old.jpg");
        older.status = UploadStatus::Uploading {
            started_at: Utc::now(),
            attempt: 1,
        };
        older.progress = 70;
        let mut newer = upload("new.jpg");
        newer.created_at = older.created_at + chrono::Duration::seconds(5);

        let mut store = UploadQueueStore::new(QueueConfig::default());
        let loaded = store.restore(vec![newer.clone(), older.clone(), newer.clone()]);
        assert_eq!(loaded, 2);

        let order: Vec<UploadId> = store.list(UploadFilter::All).map(|u| u.id).collect();
        assert_eq!(order, vec![older.id, newer.id]);
        let restored = store.get(older.id);
        assert!(matches!(restored.map(|u| &u.status), Some(UploadStatus::Paused { .. })));
        assert_eq!(restored.map(|u| u.progress), Some(0));
    }
}
