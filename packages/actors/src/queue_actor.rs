//! Queue actor owning the upload queue state.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use db::repositories::UploadRepository;
use ractor::{Actor, ActorProcessingErr, ActorRef};
use storage::Storage;
use tokio::sync::broadcast;
use upload_core::{
    QueueConfig, QueueError, QueuedUpload, UploadEvent, UploadFilter, UploadId, UploadQueueStore,
    UploadStatus,
};

use crate::messages::{ProcessorMessage, QueueMessage, UploadOutcome};

/// Queue actor arguments.
pub struct QueueActorArgs {
    pub config: QueueConfig,
    /// Write every change through `db::UploadRepository` and restore on start.
    pub persist: bool,
    /// Staging area; settled uploads release their bytes here.
    pub storage: Option<Arc<Storage>>,
    pub event_tx: broadcast::Sender<UploadEvent>,
}

/// State for the queue actor.
pub struct QueueActorState {
    store: UploadQueueStore,
    persist: bool,
    storage: Option<Arc<Storage>>,
    event_tx: broadcast::Sender<UploadEvent>,
    /// Processor holding each in-flight upload.
    in_flight: HashMap<UploadId, ActorRef<ProcessorMessage>>,
}

impl QueueActorState {
    fn broadcast(&self, event: UploadEvent) {
        tracing::debug!("{}", event.description());
        let _ = self.event_tx.send(event);
    }

    fn broadcast_counts(&self) {
        self.broadcast(UploadEvent::CountsUpdated {
            counts: self.store.counts(),
            timestamp: Utc::now(),
        });
    }

    async fn save(&self, upload: &QueuedUpload) {
        if !self.persist {
            return;
        }
        if let Err(e) = UploadRepository::upsert(upload).await {
            tracing::warn!("Failed to persist upload {}: {}", upload.id, e);
        }
    }

    async fn save_id(&self, id: UploadId) {
        if let Some(upload) = self.store.get(id) {
            self.save(upload).await;
        }
    }

    async fn forget(&self, upload: &QueuedUpload) {
        if self.persist
            && let Err(e) = UploadRepository::delete(upload.id).await
        {
            tracing::warn!("Failed to delete upload {} from DB: {}", upload.id, e);
        }
        self.release_staged(upload).await;
    }

    async fn release_staged(&self, upload: &QueuedUpload) {
        if let Some(storage) = &self.storage
            && let Err(e) = storage.delete(&upload.source.key).await
        {
            tracing::warn!(
                "Failed to release staged file {} for upload {}: {}",
                upload.source.key,
                upload.id,
                e
            );
        }
    }

    /// Put an attempt whose processor is gone back in line.
    async fn requeue(&mut self, id: UploadId, attempt: u32) {
        self.in_flight.remove(&id);
        match self.store.requeue_upload(id, attempt) {
            Ok(_) => {
                tracing::warn!("Upload {} lost its processor, requeued", id);
                self.save_id(id).await;
                self.broadcast(UploadEvent::Requeued {
                    upload_id: id,
                    attempt,
                    timestamp: Utc::now(),
                });
                self.broadcast_counts();
            }
            Err(QueueError::StaleAttempt { .. }) => {}
            Err(e) => tracing::warn!("Failed to requeue upload {}: {}", id, e),
        }
    }

    async fn settle(&mut self, id: UploadId, attempt: u32, outcome: UploadOutcome) {
        let started_at = match self.store.get(id).map(|u| &u.status) {
            Some(UploadStatus::Uploading { started_at, .. }) => *started_at,
            _ => Utc::now(),
        };

        let result = match outcome {
            Ok(photo) => self
                .store
                .complete_upload(id, attempt, photo.clone())
                .map(|_| {
                    let now = Utc::now();
                    UploadEvent::Completed {
                        upload_id: id,
                        photo,
                        duration_ms: (now - started_at).num_milliseconds().max(0) as u64,
                        timestamp: now,
                    }
                }),
            Err(failure) => self
                .store
                .fail_upload(id, attempt, failure.clone())
                .map(|_| UploadEvent::Failed {
                    upload_id: id,
                    failure,
                    timestamp: Utc::now(),
                }),
        };

        match result {
            Ok(event) => {
                self.in_flight.remove(&id);
                self.save_id(id).await;
                match &event {
                    UploadEvent::Failed { failure, .. } => {
                        tracing::warn!("Upload {} failed: {}", id, failure)
                    }
                    _ => tracing::info!("Upload {} completed", id),
                }
                self.broadcast(event);
                self.broadcast_counts();
            }
            Err(QueueError::StaleAttempt { .. }) => {
                tracing::debug!("Ignoring settlement of stale attempt {} for {}", attempt, id);
            }
            Err(e) => tracing::warn!("Failed to settle upload {}: {}", id, e),
        }
    }
}

/// Queue actor that owns the uploads and hands them to processors.
pub struct QueueActor;

impl Actor for QueueActor {
    type Msg = QueueMessage;
    type State = QueueActorState;
    type Arguments = QueueActorArgs;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        tracing::info!(
            "Starting upload queue (concurrency {}, persistence {})",
            args.config.concurrency,
            if args.persist { "on" } else { "off" }
        );

        let mut state = QueueActorState {
            store: UploadQueueStore::new(args.config),
            persist: args.persist,
            storage: args.storage,
            event_tx: args.event_tx,
            in_flight: HashMap::new(),
        };

        if state.persist {
            match UploadRepository::list(UploadFilter::All).await {
                Ok(saved) => {
                    let interrupted: Vec<UploadId> = saved
                        .iter()
                        .filter(|u| matches!(u.status, UploadStatus::Uploading { .. }))
                        .map(|u| u.id)
                        .collect();
                    let loaded = state.store.restore(saved);
                    for id in interrupted {
                        state.save_id(id).await;
                    }
                    if loaded > 0 {
                        tracing::info!("Restored {} uploads", loaded);
                    }
                }
                Err(e) => tracing::warn!("Failed to restore uploads: {}", e),
            }
        }

        Ok(state)
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            QueueMessage::Enqueue { upload, reply } => {
                let upload = match state.store.add_to_queue(*upload) {
                    Ok(u) => u.clone(),
                    Err(e) => {
                        let _ = reply.send(Err(e));
                        return Ok(());
                    }
                };

                state.save(&upload).await;
                tracing::info!("Enqueued upload {} ({})", upload.id, upload.source.file_name);
                state.broadcast(UploadEvent::Enqueued {
                    upload: upload.clone(),
                    timestamp: Utc::now(),
                });
                state.broadcast_counts();

                let _ = reply.send(Ok(upload));
            }

            QueueMessage::Remove { id, reply } => match state.store.remove_from_queue(id) {
                Ok(upload) => {
                    state.forget(&upload).await;
                    state.broadcast(UploadEvent::Removed {
                        upload_id: id,
                        timestamp: Utc::now(),
                    });
                    state.broadcast_counts();
                    let _ = reply.send(Ok(upload));
                }
                Err(e) => {
                    let _ = reply.send(Err(e));
                }
            },

            QueueMessage::Pause { id, reply } => {
                let previous = match state.store.pause_upload(id) {
                    Ok(previous) => previous,
                    Err(e) => {
                        let _ = reply.send(Err(e));
                        return Ok(());
                    }
                };

                let mut aborted_request = false;
                if let UploadStatus::Uploading { .. } = previous
                    && let Some(processor) = state.in_flight.remove(&id)
                {
                    aborted_request = processor
                        .send_message(ProcessorMessage::Abort { id })
                        .is_ok();
                }

                state.save_id(id).await;
                state.broadcast(UploadEvent::Paused {
                    upload_id: id,
                    aborted_request,
                    timestamp: Utc::now(),
                });
                state.broadcast_counts();

                let _ = reply.send(state.store.get(id).cloned().ok_or(QueueError::NotFound(id)));
            }

            QueueMessage::Resume { id, reply } => {
                let result = state.store.resume_upload(id).cloned();
                if result.is_ok() {
                    state.save_id(id).await;
                    state.broadcast(UploadEvent::Resumed {
                        upload_id: id,
                        timestamp: Utc::now(),
                    });
                    state.broadcast_counts();
                }
                let _ = reply.send(result);
            }

            QueueMessage::Retry { id, reply } => {
                let result = state.store.retry_upload(id).cloned();
                if result.is_ok() {
                    state.save_id(id).await;
                    state.broadcast(UploadEvent::Retried {
                        upload_id: id,
                        timestamp: Utc::now(),
                    });
                    state.broadcast_counts();
                }
                let _ = reply.send(result);
            }

            QueueMessage::ClearCompleted { reply } => {
                let cleared = state.store.clear_completed();

                if state.persist
                    && let Err(e) = UploadRepository::delete_completed().await
                {
                    tracing::warn!("Failed to clear completed uploads from DB: {}", e);
                }
                for upload in &cleared {
                    state.release_staged(upload).await;
                }

                let upload_ids: Vec<UploadId> = cleared.iter().map(|u| u.id).collect();
                if !upload_ids.is_empty() {
                    tracing::info!("Cleared {} completed uploads", upload_ids.len());
                    state.broadcast(UploadEvent::ClearedCompleted {
                        upload_ids: upload_ids.clone(),
                        timestamp: Utc::now(),
                    });
                    state.broadcast_counts();
                }

                let _ = reply.send(upload_ids);
            }

            QueueMessage::RequestUpload {
                processor_id,
                processor,
                reply,
            } => {
                let Some(id) = state.store.next_pending() else {
                    let _ = reply.send(None);
                    return Ok(());
                };

                let upload = match state.store.start_upload(id) {
                    Ok(upload) => upload,
                    Err(e) => {
                        tracing::warn!("Failed to start upload {}: {}", id, e);
                        let _ = reply.send(None);
                        return Ok(());
                    }
                };

                let attempt = upload.attempts;
                state.in_flight.insert(id, processor);
                state.save(&upload).await;
                state.broadcast(UploadEvent::Started {
                    upload_id: id,
                    attempt,
                    processor_id,
                    timestamp: Utc::now(),
                });
                state.broadcast_counts();

                // The processor gave up waiting; nobody will send this attempt
                if reply.send(Some(upload)).is_err() {
                    state.requeue(id, attempt).await;
                }
            }

            QueueMessage::ProcessorLost { processor } => {
                let orphaned: Vec<(UploadId, u32)> = state
                    .in_flight
                    .iter()
                    .filter(|(_, holder)| holder.get_id() == processor)
                    .filter_map(|(id, _)| {
                        let attempt = state.store.get(*id)?.status.attempt()?;
                        Some((*id, attempt))
                    })
                    .collect();
                for (id, attempt) in orphaned {
                    state.requeue(id, attempt).await;
                }
            }

            QueueMessage::Progress {
                id,
                attempt,
                percent,
            } => {
                if let Ok(true) = state.store.set_progress(id, attempt, percent) {
                    state.broadcast(UploadEvent::Progress {
                        upload_id: id,
                        percent,
                        timestamp: Utc::now(),
                    });
                }
            }

            QueueMessage::Settled {
                id,
                attempt,
                outcome,
            } => {
                state.settle(id, attempt, outcome).await;
            }

            QueueMessage::GetUpload { id, reply } => {
                let _ = reply.send(state.store.get(id).cloned());
            }

            QueueMessage::List { filter, reply } => {
                let _ = reply.send(state.store.list(filter).cloned().collect());
            }

            QueueMessage::Counts { reply } => {
                let _ = reply.send(state.store.counts());
            }

            QueueMessage::Shutdown => {
                tracing::info!("Shutting down upload queue");
                myself.stop(None);
            }
        }

        Ok(())
    }
}
