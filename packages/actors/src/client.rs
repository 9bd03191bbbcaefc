//! Request/reply wrapper around the queue actor.

use std::time::Duration;

use ractor::rpc::CallResult;
use ractor::{ActorRef, Message, RpcReplyPort};
use tokio::sync::broadcast;
use upload_core::{QueueCounts, QueueError, QueuedUpload, UploadEvent, UploadFilter, UploadId};

use crate::messages::{ActorError, QueueMessage, SupervisorMessage};

const CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Send a request to an actor and wait for its reply.
pub async fn call_actor<M, T, F>(actor: &ActorRef<M>, build: F) -> Result<T, ActorError>
where
    M: Message,
    T: Send + 'static,
    F: FnOnce(RpcReplyPort<T>) -> M,
{
    match ractor::rpc::call(actor, build, Some(CALL_TIMEOUT)).await {
        Ok(CallResult::Success(value)) => Ok(value),
        Ok(CallResult::Timeout) => Err(ActorError::Timeout),
        Ok(CallResult::SenderError) => Err(ActorError::Unavailable("reply dropped".into())),
        Err(e) => Err(ActorError::Unavailable(e.to_string())),
    }
}

/// The queue actor owned by a supervisor.
pub async fn queue_of(
    supervisor: &ActorRef<SupervisorMessage>,
) -> Result<ActorRef<QueueMessage>, ActorError> {
    call_actor(supervisor, |reply| SupervisorMessage::GetQueue { reply }).await
}

/// Receive every upload event from now on.
pub async fn subscribe(
    supervisor: &ActorRef<SupervisorMessage>,
) -> Result<broadcast::Receiver<UploadEvent>, ActorError> {
    call_actor(supervisor, |reply| SupervisorMessage::Subscribe { reply }).await
}

/// Number of live processors.
pub async fn processor_count(supervisor: &ActorRef<SupervisorMessage>) -> Result<usize, ActorError> {
    call_actor(supervisor, |reply| SupervisorMessage::ProcessorCount { reply }).await
}

/// Typed calls into a running queue actor.
#[derive(Debug, Clone)]
pub struct QueueClient {
    queue: ActorRef<QueueMessage>,
}

impl QueueClient {
    pub fn new(queue: ActorRef<QueueMessage>) -> Self {
        Self { queue }
    }

    pub fn actor(&self) -> &ActorRef<QueueMessage> {
        &self.queue
    }

    async fn call<T, F>(&self, build: F) -> Result<T, ActorError>
    where
        T: Send + 'static,
        F: FnOnce(RpcReplyPort<T>) -> QueueMessage,
    {
        call_actor(&self.queue, build).await
    }

    async fn call_queue<F>(&self, build: F) -> Result<QueuedUpload, ActorError>
    where
        F: FnOnce(RpcReplyPort<Result<QueuedUpload, QueueError>>) -> QueueMessage,
    {
        Ok(self.call(build).await??)
    }

    pub async fn enqueue(&self, upload: QueuedUpload) -> Result<QueuedUpload, ActorError> {
        self.call_queue(|reply| QueueMessage::Enqueue {
            upload: Box::new(upload),
            reply,
        })
        .await
    }

    pub async fn remove(&self, id: UploadId) -> Result<QueuedUpload, ActorError> {
        self.call_queue(|reply| QueueMessage::Remove { id, reply }).await
    }

    pub async fn pause(&self, id: UploadId) -> Result<QueuedUpload, ActorError> {
        self.call_queue(|reply| QueueMessage::Pause { id, reply }).await
    }

    pub async fn resume(&self, id: UploadId) -> Result<QueuedUpload, ActorError> {
        self.call_queue(|reply| QueueMessage::Resume { id, reply }).await
    }

    pub async fn retry(&self, id: UploadId) -> Result<QueuedUpload, ActorError> {
        self.call_queue(|reply| QueueMessage::Retry { id, reply }).await
    }

    pub async fn clear_completed(&self) -> Result<Vec<UploadId>, ActorError> {
        self.call(|reply| QueueMessage::ClearCompleted { reply })
            .await
    }

    pub async fn get(&self, id: UploadId) -> Result<Option<QueuedUpload>, ActorError> {
        self.call(|reply| QueueMessage::GetUpload { id, reply }).await
    }

    pub async fn list(&self, filter: UploadFilter) -> Result<Vec<QueuedUpload>, ActorError> {
        self.call(|reply| QueueMessage::List { filter, reply }).await
    }

    pub async fn counts(&self) -> Result<QueueCounts, ActorError> {
        self.call(|reply| QueueMessage::Counts { reply }).await
    }
}
