//! Message types for actor communication.

use ractor::{ActorId, ActorRef, RpcReplyPort};
use tokio::sync::broadcast;
use upload_core::{
    QueueCounts, QueueError, QueuedUpload, UploadEvent, UploadFailure, UploadFilter, UploadId,
    UploadedPhoto,
};

/// Outcome of one upload attempt.
pub type UploadOutcome = Result<UploadedPhoto, UploadFailure>;

/// Messages for the QueueActor.
#[derive(Debug)]
pub enum QueueMessage {
    /// Accept a staged file into the queue.
    Enqueue {
        upload: Box<QueuedUpload>,
        reply: RpcReplyPort<Result<QueuedUpload, QueueError>>,
    },

    /// Remove a completed or failed upload.
    Remove {
        id: UploadId,
        reply: RpcReplyPort<Result<QueuedUpload, QueueError>>,
    },

    /// Pause a pending or in-flight upload.
    Pause {
        id: UploadId,
        reply: RpcReplyPort<Result<QueuedUpload, QueueError>>,
    },

    /// Put a paused upload back in line.
    Resume {
        id: UploadId,
        reply: RpcReplyPort<Result<QueuedUpload, QueueError>>,
    },

    /// Put a failed upload back in line.
    Retry {
        id: UploadId,
        reply: RpcReplyPort<Result<QueuedUpload, QueueError>>,
    },

    /// Drop every completed upload.
    ClearCompleted { reply: RpcReplyPort<Vec<UploadId>> },

    /// Hand the oldest pending upload to an idle processor.
    RequestUpload {
        processor_id: String,
        processor: ActorRef<ProcessorMessage>,
        reply: RpcReplyPort<Option<QueuedUpload>>,
    },

    /// Progress of an in-flight attempt.
    Progress {
        id: UploadId,
        attempt: u32,
        percent: u8,
    },

    /// An attempt finished.
    Settled {
        id: UploadId,
        attempt: u32,
        outcome: UploadOutcome,
    },

    /// A processor stopped; its in-flight attempts go back in line.
    ProcessorLost { processor: ActorId },

    GetUpload {
        id: UploadId,
        reply: RpcReplyPort<Option<QueuedUpload>>,
    },

    List {
        filter: UploadFilter,
        reply: RpcReplyPort<Vec<QueuedUpload>>,
    },

    Counts { reply: RpcReplyPort<QueueCounts> },

    /// Stop the queue.
    Shutdown,
}

/// Messages for the ProcessorActor.
#[derive(Debug)]
pub enum ProcessorMessage {
    /// Poll tick; an idle processor asks the queue for work.
    Heartbeat,

    /// Cancel the in-flight request for this upload, if it is ours.
    Abort { id: UploadId },

    /// The spawned upload task ended.
    Finished { id: UploadId, attempt: u32 },

    /// Stop the processor, aborting any in-flight request.
    Shutdown,
}

/// Messages for the Supervisor.
#[derive(Debug)]
pub enum SupervisorMessage {
    /// Get the queue actor.
    GetQueue {
        reply: RpcReplyPort<ActorRef<QueueMessage>>,
    },

    /// Subscribe to upload events.
    Subscribe {
        reply: RpcReplyPort<broadcast::Receiver<UploadEvent>>,
    },

    /// Number of live processors.
    ProcessorCount { reply: RpcReplyPort<usize> },

    /// Stop the queue and every processor.
    Shutdown,
}

/// Error type for calls into the actor system.
#[derive(Debug, thiserror::Error)]
pub enum ActorError {
    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error("Actor unavailable: {0}")]
    Unavailable(String),

    #[error("Timeout")]
    Timeout,
}
