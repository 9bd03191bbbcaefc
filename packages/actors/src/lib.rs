//! Actor system for the photo upload queue.
//!
//! # Architecture
//!
//! - `Supervisor` - Owns the queue actor and restarts processors that die
//! - `QueueActor` - Owns the upload records, persistence and events
//! - `ProcessorActor` - Pulls pending uploads and runs them through an `Uploader`
//!
//! # Usage
//!
//! ```ignore
//! use actors::{SupervisorArgs, start_upload_system};
//!
//! let (supervisor, handle) = start_upload_system(SupervisorArgs {
//!     config: QueueConfig::default(),
//!     persist: false,
//!     storage: None,
//!     uploader: Arc::new(uploader),
//! })
//! .await?;
//! ```

mod client;
mod messages;
mod processor_actor;
mod queue_actor;
pub mod registry;
mod supervisor;
mod uploader;

pub use client::{QueueClient, call_actor, processor_count, queue_of, subscribe};
pub use messages::{ActorError, ProcessorMessage, QueueMessage, SupervisorMessage, UploadOutcome};
pub use processor_actor::{HEARTBEAT_INTERVAL, ProcessorActor, ProcessorArgs};
pub use queue_actor::{QueueActor, QueueActorArgs};
pub use registry::{ActorRegistry, global_registry};
pub use supervisor::{Supervisor, SupervisorArgs, start_upload_system};
pub use uploader::{BackendUploader, FnUploader, ProgressSink, UploadFuture, Uploader};

/// Re-export ractor types for convenience.
pub use ractor::{Actor, ActorRef, RpcReplyPort, SpawnErr, concurrency};
