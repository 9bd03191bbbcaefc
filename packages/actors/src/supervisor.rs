//! Supervisor actor for the queue and its processors.

use std::collections::HashMap;
use std::sync::Arc;

use ractor::{Actor, ActorId, ActorProcessingErr, ActorRef, SupervisionEvent};
use storage::Storage;
use tokio::sync::broadcast;
use upload_core::{QueueConfig, UploadEvent};

use crate::messages::{ProcessorMessage, QueueMessage, SupervisorMessage};
use crate::processor_actor::{ProcessorActor, ProcessorArgs};
use crate::queue_actor::{QueueActor, QueueActorArgs};
use crate::uploader::Uploader;

const EVENT_CAPACITY: usize = 1024;

/// Everything needed to start the upload system.
pub struct SupervisorArgs {
    pub config: QueueConfig,
    pub persist: bool,
    pub storage: Option<Arc<Storage>>,
    pub uploader: Arc<dyn Uploader>,
}

/// State for the supervisor actor.
pub struct SupervisorState {
    queue: ActorRef<QueueMessage>,
    processors: HashMap<ActorId, (String, ActorRef<ProcessorMessage>)>,
    event_tx: broadcast::Sender<UploadEvent>,
    uploader: Arc<dyn Uploader>,
    processor_counter: u64,
    shutting_down: bool,
}

impl SupervisorState {
    fn next_processor_id(&mut self) -> String {
        self.processor_counter += 1;
        format!("processor-{}", self.processor_counter)
    }
}

async fn spawn_processor(
    myself: &ActorRef<SupervisorMessage>,
    state: &mut SupervisorState,
) -> Result<(), ActorProcessingErr> {
    let processor_id = state.next_processor_id();
    let args = ProcessorArgs {
        processor_id: processor_id.clone(),
        queue: state.queue.clone(),
        uploader: Arc::clone(&state.uploader),
    };

    let (processor, _handle) = Actor::spawn_linked(None, ProcessorActor, args, myself.get_cell())
        .await
        .map_err(|e| ActorProcessingErr::from(format!("Failed to spawn processor: {}", e)))?;

    state
        .processors
        .insert(processor.get_id(), (processor_id, processor));
    Ok(())
}

/// Supervisor actor that owns the queue and its processors.
pub struct Supervisor;

impl Actor for Supervisor {
    type Msg = SupervisorMessage;
    type State = SupervisorState;
    type Arguments = SupervisorArgs;

    async fn pre_start(
        &self,
        myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        tracing::info!("Starting upload supervisor");

        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);
        let concurrency = args.config.concurrency;

        let queue_args = QueueActorArgs {
            config: args.config,
            persist: args.persist,
            storage: args.storage,
            event_tx: event_tx.clone(),
        };
        let (queue, _handle) = Actor::spawn_linked(None, QueueActor, queue_args, myself.get_cell())
            .await
            .map_err(|e| ActorProcessingErr::from(format!("Failed to spawn queue: {}", e)))?;

        let mut state = SupervisorState {
            queue,
            processors: HashMap::new(),
            event_tx,
            uploader: args.uploader,
            processor_counter: 0,
            shutting_down: false,
        };

        for _ in 0..concurrency {
            spawn_processor(&myself, &mut state).await?;
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
            SupervisorMessage::GetQueue { reply } => {
                let _ = reply.send(state.queue.clone());
            }

            SupervisorMessage::Subscribe { reply } => {
                let _ = reply.send(state.event_tx.subscribe());
            }

            SupervisorMessage::ProcessorCount { reply } => {
                let _ = reply.send(state.processors.len());
            }

            SupervisorMessage::Shutdown => {
                tracing::info!("Shutting down upload supervisor");
                state.shutting_down = true;
                for (_, processor) in state.processors.values() {
                    let _ = processor.send_message(ProcessorMessage::Shutdown);
                }
                let _ = state.queue.send_message(QueueMessage::Shutdown);
                myself.stop(None);
            }
        }

        Ok(())
    }

    async fn handle_supervisor_evt(
        &self,
        myself: ActorRef<Self::Msg>,
        message: SupervisionEvent,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        let (cell, reason) = match message {
            SupervisionEvent::ActorTerminated(cell, _, reason) => {
                (cell, reason.unwrap_or_else(|| "stopped".to_string()))
            }
            SupervisionEvent::ActorFailed(cell, err) => (cell, err.to_string()),
            _ => return Ok(()),
        };

        let id = cell.get_id();
        if id == state.queue.get_id() {
            if !state.shutting_down {
                tracing::error!("Upload queue terminated: {}", reason);
                myself.stop(Some("upload queue terminated".to_string()));
            }
            return Ok(());
        }

        let Some((processor_id, _)) = state.processors.remove(&id) else {
            return Ok(());
        };
        if state.shutting_down {
            return Ok(());
        }

        let _ = state
            .queue
            .send_message(QueueMessage::ProcessorLost { processor: id });
        tracing::warn!("Processor {} terminated ({}), respawning", processor_id, reason);
        spawn_processor(&myself, state).await?;
        Ok(())
    }
}

/// Start the supervisor, the queue and its processors.
pub async fn start_upload_system(
    args: SupervisorArgs,
) -> Result<(ActorRef<SupervisorMessage>, tokio::task::JoinHandle<()>), ractor::SpawnErr> {
    Actor::spawn(None, Supervisor, args).await
}
