//! Processor actor that sends uploads one at a time.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use ractor::{Actor, ActorProcessingErr, ActorRef};
use tokio::task::AbortHandle;
use upload_core::{UploadFailure, UploadId, UploadProgress};

use crate::messages::{ProcessorMessage, QueueMessage};
use crate::uploader::{ProgressSink, Uploader};

/// How often an idle processor polls the queue.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_millis(100);

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// The request a processor currently has on the wire.
struct InFlight {
    id: UploadId,
    attempt: u32,
    abort: AbortHandle,
}

/// State for the processor actor.
pub struct ProcessorState {
    pub processor_id: String,
    queue: ActorRef<QueueMessage>,
    uploader: Arc<dyn Uploader>,
    current: Option<InFlight>,
    running: bool,
}

impl ProcessorState {
    fn is_idle(&self) -> bool {
        self.current.is_none()
    }
}

/// Processor actor arguments.
pub struct ProcessorArgs {
    pub processor_id: String,
    pub queue: ActorRef<QueueMessage>,
    pub uploader: Arc<dyn Uploader>,
}

/// Processor actor that runs upload attempts.
pub struct ProcessorActor;

impl Actor for ProcessorActor {
    type Msg = ProcessorMessage;
    type State = ProcessorState;
    type Arguments = ProcessorArgs;

    async fn pre_start(
        &self,
        myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        tracing::info!("Starting processor: {}", args.processor_id);

        let myself_clone = myself.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(HEARTBEAT_INTERVAL).await;
                if myself_clone.send_message(ProcessorMessage::Heartbeat).is_err() {
                    break;
                }
            }
        });

        Ok(ProcessorState {
            processor_id: args.processor_id,
            queue: args.queue,
            uploader: args.uploader,
            current: None,
            running: true,
        })
    }

    async fn post_stop(
        &self,
        _myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        if let Some(in_flight) = state.current.take() {
            in_flight.abort.abort();
        }
        Ok(())
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            ProcessorMessage::Heartbeat => {
                if !state.running {
                    myself.stop(None);
                    return Ok(());
                }
                if !state.is_idle() {
                    return Ok(());
                }

                let result = ractor::rpc::call(
                    &state.queue,
                    |reply| QueueMessage::RequestUpload {
                        processor_id: state.processor_id.clone(),
                        processor: myself.clone(),
                        reply,
                    },
                    Some(REQUEST_TIMEOUT),
                )
                .await;

                let Ok(ractor::rpc::CallResult::Success(Some(upload))) = result else {
                    return Ok(());
                };
                let Some(attempt) = upload.status.attempt() else {
                    tracing::warn!("Queue handed out upload {} that is not in flight", upload.id);
                    return Ok(());
                };

                let id = upload.id;
                let progress = progress_sink(state.queue.clone(), id, attempt);
                let request = state.uploader.upload(&upload, progress);
                let queue = state.queue.clone();
                let processor = myself.clone();

                // The request runs in its own task so a panic surfaces as a JoinError
                let request = tokio::spawn(request);
                let abort = request.abort_handle();
                tokio::spawn(async move {
                    let outcome = match request.await {
                        Ok(outcome) => Some(outcome),
                        Err(e) if e.is_panic() => {
                            tracing::error!("Upload {} (attempt {}) panicked", id, attempt);
                            Some(Err(UploadFailure::unexpected("The upload stopped unexpectedly")))
                        }
                        // Aborted by pause or shutdown; the queue already knows
                        Err(_) => None,
                    };
                    if let Some(outcome) = outcome {
                        let _ = queue.send_message(QueueMessage::Settled {
                            id,
                            attempt,
                            outcome,
                        });
                    }
                    let _ = processor.send_message(ProcessorMessage::Finished { id, attempt });
                });

                tracing::debug!(
                    "Processor {} sending upload {} (attempt {})",
                    state.processor_id,
                    id,
                    attempt
                );
                state.current = Some(InFlight { id, attempt, abort });
            }

            ProcessorMessage::Abort { id } => {
                if state.current.as_ref().is_some_and(|f| f.id == id)
                    && let Some(in_flight) = state.current.take()
                {
                    in_flight.abort.abort();
                    tracing::info!(
                        "Processor {} aborted upload {} (attempt {})",
                        state.processor_id,
                        id,
                        in_flight.attempt
                    );
                }
            }

            ProcessorMessage::Finished { id, attempt } => {
                if state
                    .current
                    .as_ref()
                    .is_some_and(|f| f.id == id && f.attempt == attempt)
                {
                    state.current = None;
                }
            }

            ProcessorMessage::Shutdown => {
                tracing::info!("Shutting down processor: {}", state.processor_id);
                state.running = false;
                if let Some(in_flight) = state.current.take() {
                    in_flight.abort.abort();
                }
                myself.stop(None);
            }
        }

        Ok(())
    }
}

/// Forward byte progress to the queue, once per whole-percent increase.
fn progress_sink(queue: ActorRef<QueueMessage>, id: UploadId, attempt: u32) -> ProgressSink {
    let last = AtomicU8::new(0);
    Arc::new(move |progress: UploadProgress| {
        let percent = progress.percent();
        if percent > last.fetch_max(percent, Ordering::Relaxed) {
            let _ = queue.send_message(QueueMessage::Progress {
                id,
                attempt,
                percent,
            });
        }
    })
}
