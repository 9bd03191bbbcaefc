//! Server initialization for the photo upload queue.

use std::sync::Arc;
use std::time::Duration;

use actors::{
    ActorError, BackendUploader, FnUploader, QueueClient, SupervisorArgs, UploadFuture, Uploader,
    global_registry, queue_of, start_upload_system,
};
use backend::{BackendClient, BackendConfig, ClientError};
use db::{DbConfig, DbError};
use dioxus::prelude::ServerFnError;
use storage::{Storage, StorageError};
use tokio::sync::OnceCell;
use upload_core::{
    FileRules, QueueConfig, QueueError, QueuedUpload, UploadId, UploadProgress, UploadedPhoto,
};

/// Handles shared by every server function.
///
/// The queue itself is published through the actor registry.
pub struct UploadSystem {
    pub storage: Arc<Storage>,
    pub rules: FileRules,
}

/// Errors raised while bringing the upload system up.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("Invalid queue config: {0}")]
    Config(#[from] QueueError),

    #[error("Database error: {0}")]
    Db(#[from] DbError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Backend client error: {0}")]
    Backend(#[from] ClientError),

    #[error("Failed to start actors: {0}")]
    Spawn(#[from] actors::SpawnErr),

    #[error(transparent)]
    Actor(#[from] ActorError),
}

static SYSTEM: OnceCell<UploadSystem> = OnceCell::const_new();

/// Ensure the upload system is initialized (lazy initialization).
///
/// Server functions call this first; only the first call does any work.
pub async fn ensure_initialized() -> Result<&'static UploadSystem, InitError> {
    SYSTEM.get_or_try_init(init_upload_system).await
}

/// Initialize the upload system.
///
/// Reads configuration from the environment:
/// - `UPLOAD_PERSIST` (default: true) keeps uploads in SurrealDB across restarts
/// - `UPLOAD_DB_PATH` selects file-backed SurrealDB instead of `mem://`
/// - `PHOTO_API_BASE_URL` and friends configure the backend; when unset a
///   simulated uploader is used
/// - `UPLOAD_*` queue settings and `STORAGE_*` staging settings
pub async fn init_upload_system() -> Result<UploadSystem, InitError> {
    tracing::info!("Initializing upload system...");

    let config = QueueConfig::from_env()?;
    let rules = config.rules.clone();

    let persist = std::env::var("UPLOAD_PERSIST")
        .map(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "false" | "0" | "no"))
        .unwrap_or(true);

    if persist {
        db::init(DbConfig::from_env()).await?;
    }

    let storage = Arc::new(Storage::from_env().await?);
    let uploader = build_uploader(Arc::clone(&storage))?;

    let (supervisor, _handle) = start_upload_system(SupervisorArgs {
        config,
        persist,
        storage: Some(Arc::clone(&storage)),
        uploader,
    })
    .await?;
    global_registry().register_queue(queue_of(&supervisor).await?);

    tracing::info!("Upload system initialized");
    Ok(UploadSystem {
        storage,
        rules,
    })
}

fn build_uploader(storage: Arc<Storage>) -> Result<Arc<dyn Uploader>, InitError> {
    if std::env::var("PHOTO_API_BASE_URL").is_err() {
        tracing::warn!("PHOTO_API_BASE_URL not set; uploads are simulated");
        return Ok(Arc::new(simulated_uploader()));
    }

    let client = BackendClient::new(&BackendConfig::from_env()?)?;
    tracing::info!("Uploading photos to {}", client.upload_url());
    Ok(Arc::new(BackendUploader::new(client, storage)))
}

/// Reports progress over about two seconds, then succeeds.
fn simulated_uploader() -> impl Uploader {
    FnUploader::new(|upload: QueuedUpload, progress| -> UploadFuture {
        Box::pin(async move {
            let total = upload.source.size.max(1);
            for step in 1..=10u64 {
                tokio::time::sleep(Duration::from_millis(200)).await;
                progress(UploadProgress::new(total * step / 10, total));
            }
            Ok(UploadedPhoto {
                id: Some(upload.id.to_string()),
                url: None,
            })
        })
    })
}

/// Lazily initialize and fetch the shared handles.
pub(crate) async fn upload_system() -> Result<&'static UploadSystem, ServerFnError> {
    ensure_initialized()
        .await
        .map_err(|e| ServerFnError::new(format!("Initialization failed: {}", e)))
}

/// Lazily initialize and look the queue up in the registry.
pub(crate) async fn queue() -> Result<QueueClient, ServerFnError> {
    upload_system().await?;
    global_registry()
        .queue_client()
        .ok_or_else(|| ServerFnError::new("Upload queue is not running"))
}

pub(crate) fn parse_id(id: &str) -> Result<UploadId, ServerFnError> {
    UploadId::parse(id).map_err(|e| ServerFnError::new(format!("Invalid upload ID: {}", e)))
}

pub(crate) fn server_error(err: ActorError) -> ServerFnError {
    ServerFnError::new(err.to_string())
}
