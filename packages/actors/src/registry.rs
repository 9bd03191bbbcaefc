//! Actor registry for discovering the running upload queue.

use std::sync::{PoisonError, RwLock};

use ractor::ActorRef;

use crate::client::QueueClient;
use crate::messages::QueueMessage;

/// Global actor registry.
///
/// Server functions look the queue up here instead of threading actor
/// references through every call.
pub struct ActorRegistry {
    queue: RwLock<Option<ActorRef<QueueMessage>>>,
}

impl ActorRegistry {
    pub fn new() -> Self {
        Self {
            queue: RwLock::new(None),
        }
    }

    /// Replace the registered queue, e.g. after the system restarts.
    pub fn register_queue(&self, queue: ActorRef<QueueMessage>) {
        *self.queue.write().unwrap_or_else(PoisonError::into_inner) = Some(queue);
    }

    pub fn get_queue(&self) -> Option<ActorRef<QueueMessage>> {
        self.queue
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Client for the registered queue, if the system is running.
    pub fn queue_client(&self) -> Option<QueueClient> {
        self.get_queue().map(QueueClient::new)
    }
}

impl Default for ActorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Global registry instance.
static REGISTRY: std::sync::LazyLock<ActorRegistry> = std::sync::LazyLock::new(ActorRegistry::new);

/// Get the global actor registry.
pub fn global_registry() -> &'static ActorRegistry {
    &REGISTRY
}
