//! Connection to the embedded SurrealDB holding the upload queue.

use std::sync::LazyLock;
use surrealdb::Surreal;
use surrealdb::engine::any::{Any, connect};
use thiserror::Error;
use tokio::sync::OnceCell;

static DB: LazyLock<OnceCell<Surreal<Any>>> = LazyLock::new(OnceCell::new);

pub type Database = Surreal<Any>;

const DEFAULT_NAMESPACE: &str = "photos";
const DEFAULT_DATABASE: &str = "uploads";

/// Where the queue records live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    /// `mem://` or `rocksdb://<path>` (the latter needs the `rocksdb` feature)
    pub endpoint: String,
    pub namespace: String,
    pub database: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self::memory()
    }
}

impl DbConfig {
    /// Records vanish with the process.
    pub fn memory() -> Self {
        Self {
            endpoint: "mem://".to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            database: DEFAULT_DATABASE.to_string(),
        }
    }

    /// Records survive restarts in an on-disk store at `path`.
    pub fn file(path: impl AsRef<str>) -> Self {
        Self {
            endpoint: format!("rocksdb://{}", path.as_ref()),
            ..Self::memory()
        }
    }

    /// Build from `UPLOAD_DB_PATH`, `UPLOAD_DB_NAMESPACE` and `UPLOAD_DB_NAME`.
    ///
    /// A missing or blank path selects the in-memory store.
    pub fn from_env() -> Self {
        let mut config = match non_blank("UPLOAD_DB_PATH") {
            Some(path) => Self::file(path),
            None => Self::memory(),
        };
        if let Some(namespace) = non_blank("UPLOAD_DB_NAMESPACE") {
            config.namespace = namespace;
        }
        if let Some(database) = non_blank("UPLOAD_DB_NAME") {
            config.database = database;
        }
        config
    }

    pub fn is_memory(&self) -> bool {
        self.endpoint.starts_with("mem://")
    }
}

fn non_blank(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Database not initialized - call db::init first")]
    NotInitialized,
    #[error("Connection error: {0}")]
    Connection(#[from] surrealdb::Error),
    #[error("Query error: {0}")]
    Query(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Unsupported endpoint {0}: build with the `rocksdb` feature for on-disk storage")]
    Unsupported(String),
}

/// Reject endpoints whose storage engine is not compiled in.
fn check_engine(config: &DbConfig) -> Result<(), DbError> {
    if config.is_memory() || cfg!(feature = "rocksdb") {
        Ok(())
    } else {
        Err(DbError::Unsupported(config.endpoint.clone()))
    }
}

/// Open the connection once; later calls return it and ignore `config`.
pub async fn init_db(config: DbConfig) -> Result<&'static Database, DbError> {
    DB.get_or_try_init(|| async {
        check_engine(&config)?;
        tracing::info!("Opening upload store at {}", config.endpoint);

        let db = connect(&config.endpoint).await?;
        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await?;

        if config.is_memory() {
            tracing::warn!("Upload store is in memory; the queue is lost on restart");
        }
        Ok(db)
    })
    .await
}

pub fn get_db() -> Result<&'static Database, DbError> {
    DB.get().ok_or(DbError::NotInitialized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_config_keeps_default_names() {
        let config = DbConfig::file("/var/lib/photos");
        assert_eq!(config.endpoint, "rocksdb:///var/lib/photos");
        assert_eq!(config.namespace, DEFAULT_NAMESPACE);
        assert_eq!(config.database, DEFAULT_DATABASE);
        assert!(!config.is_memory());
        assert!(DbConfig::default().is_memory());
    }

    #[test]
    fn memory_engine_is_always_available() {
        assert!(check_engine(&DbConfig::memory()).is_ok());
    }

    #[cfg(not(feature = "rocksdb"))]
    #[test]
    fn file_endpoint_needs_rocksdb_feature() {
        let err = check_engine(&DbConfig::file("/var/lib/photos"));
        assert!(matches!(err, Err(DbError::Unsupported(ref e)) if e == "rocksdb:///var/lib/photos"));
    }
}
