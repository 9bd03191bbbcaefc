//! Staging area for accepted photo bytes.
//!
//! A dropped file is written here before its upload job is queued, and the
//! processor reads it back when the job is dispatched. Backends:
//! - S3-compatible storage in production
//! - On-disk storage for local dev
//! - In-memory storage for tests
//!
//! The backends themselves come from `object_store`; this crate only picks one
//! from the environment and maps upload ids to object keys.

use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use object_store::ObjectStore;
use object_store::ObjectStoreExt;
use object_store::path::Path;
use upload_core::UploadId;

/// Default on-disk root for the filesystem backend.
const DEFAULT_FS_ROOT: &str = "./data/staging";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("invalid storage config: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("object_store error: {0}")]
    ObjectStore(#[from] object_store::Error),
}

impl StorageError {
    /// True when the object does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StorageError::ObjectStore(object_store::Error::NotFound { .. })
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    S3,
    Filesystem,
    Memory,
}

impl StorageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StorageKind::S3 => "s3",
            StorageKind::Filesystem => "filesystem",
            StorageKind::Memory => "memory",
        }
    }
}

/// Where staged bytes go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StagingBackend {
    /// S3-compatible bucket; credentials come from the standard `AWS_*` variables.
    S3 {
        bucket: String,
        endpoint: Option<String>,
    },
    Filesystem {
        root: PathBuf,
    },
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub backend: StagingBackend,
    /// Optional key prefix applied to all object keys.
    pub prefix: Option<String>,
}

impl StorageConfig {
    pub fn memory() -> Self {
        Self {
            backend: StagingBackend::Memory,
            prefix: None,
        }
    }

    pub fn filesystem(root: impl Into<PathBuf>) -> Self {
        Self {
            backend: StagingBackend::Filesystem { root: root.into() },
            prefix: None,
        }
    }

    /// Build a config from environment variables.
    ///
    /// - `STORAGE_BACKEND`: `s3`, `filesystem` (or `fs`), `memory` (or `mem`);
    ///   unset means filesystem under `STORAGE_FS_ROOT` (default `./data/staging`)
    /// - `S3_BUCKET` (required for `s3`), `S3_ENDPOINT` for MinIO and friends
    /// - `STORAGE_PREFIX` (optional, e.g. `portfolio/`)
    pub fn from_env() -> Result<Self, StorageError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`StorageConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, StorageError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).and_then(non_empty);

        let backend = match var("STORAGE_BACKEND").as_deref() {
            Some("s3") => StagingBackend::S3 {
                bucket: var("S3_BUCKET").ok_or_else(|| {
                    StorageError::InvalidConfig("S3_BUCKET is required for s3 backend".into())
                })?,
                endpoint: var("S3_ENDPOINT"),
            },
            Some("filesystem") | Some("fs") | None => StagingBackend::Filesystem {
                root: var("STORAGE_FS_ROOT")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_FS_ROOT)),
            },
            Some("memory") | Some("mem") => StagingBackend::Memory,
            Some(other) => {
                return Err(StorageError::InvalidConfig(format!(
                    "unsupported STORAGE_BACKEND={other} (expected s3|filesystem|memory)"
                )));
            }
        };

        Ok(Self {
            backend,
            prefix: var("STORAGE_PREFIX"),
        })
    }
}

/// Object key for a staged upload: `uploads/{id}/{sanitised file name}`.
pub fn staging_key(id: UploadId, file_name: &str) -> String {
    let name: String = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let name = name.trim_start_matches('.');
    let name = if name.is_empty() { "file" } else { name };
    format!("uploads/{id}/{name}")
}

#[derive(Clone)]
pub struct Storage {
    kind: StorageKind,
    store: Arc<dyn ObjectStore>,
    prefix: Option<String>,
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("kind", &self.kind)
            .field("prefix", &self.prefix)
            .finish()
    }
}

impl Storage {
    pub fn kind(&self) -> StorageKind {
        self.kind
    }

    pub async fn new(cfg: StorageConfig) -> Result<Self, StorageError> {
        let (kind, store) = match cfg.backend {
            StagingBackend::S3 { bucket, endpoint } => {
                (StorageKind::S3, Arc::new(build_s3(bucket, endpoint)?) as _)
            }
            StagingBackend::Filesystem { root } => {
                std::fs::create_dir_all(&root)?;
                let fs = object_store::local::LocalFileSystem::new_with_prefix(&root)?;
                (StorageKind::Filesystem, Arc::new(fs) as _)
            }
            StagingBackend::Memory => {
                let mem = object_store::memory::InMemory::new();
                (StorageKind::Memory, Arc::new(mem) as _)
            }
        };

        tracing::info!("Staging storage ready: {}", kind.as_str());

        Ok(Self {
            kind,
            store,
            prefix: cfg.prefix.and_then(non_empty),
        })
    }

    pub async fn from_env() -> Result<Self, StorageError> {
        Self::new(StorageConfig::from_env()?).await
    }

    fn to_path(&self, key: &str) -> Result<Path, StorageError> {
        let key = key.trim_start_matches('/');
        if key.is_empty() {
            return Err(StorageError::InvalidConfig(
                "object key must not be empty".to_string(),
            ));
        }

        let joined = match self.prefix.as_deref().map(|p| p.trim_matches('/')) {
            Some(prefix) if !prefix.is_empty() => format!("{prefix}/{key}"),
            _ => key.to_string(),
        };

        Ok(Path::from(joined))
    }

    pub async fn put_bytes(&self, key: &str, bytes: Bytes) -> Result<(), StorageError> {
        let path = self.to_path(key)?;
        self.store
            .put(&path, object_store::PutPayload::from(bytes))
            .await?;
        tracing::debug!("Staged {}", path);
        Ok(())
    }

    pub async fn get_bytes(&self, key: &str) -> Result<Bytes, StorageError> {
        let path = self.to_path(key)?;
        let res = self.store.get(&path).await?;
        Ok(res.bytes().await?)
    }

    /// Delete a staged object. A missing object is not an error.
    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.to_path(key)?;
        match self.store.delete(&path).await {
            Ok(()) => Ok(()),
            Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn build_s3(
    bucket: String,
    endpoint: Option<String>,
) -> Result<object_store::aws::AmazonS3, StorageError> {
    let mut builder = object_store::aws::AmazonS3Builder::from_env().with_bucket_name(bucket);
    if let Some(endpoint) = endpoint {
        let plain_http = endpoint.to_ascii_lowercase().starts_with("http://");
        builder = builder.with_endpoint(endpoint).with_allow_http(plain_http);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::disallowed_methods)]

    use super::*;

    #[test]
    fn staging_key_strips_directories_and_odd_characters() {
        let id = UploadId::new();
        assert_eq!(
            staging_key(id, "../../etc/My Photo (1).JPG"),
            format!("uploads/{id}/My_Photo__1_.JPG")
        );
        assert_eq!(staging_key(id, "C:\\pics\\a.png"), format!("uploads/{id}/a.png"));
        assert_eq!(staging_key(id, "..."), format!("uploads/{id}/file"));
    }

    #[tokio::test]
    async fn in_memory_round_trip() -> Result<(), StorageError> {
        let storage = Storage::new(StorageConfig::memory()).await?;
        let key = staging_key(UploadId::new(), "beach.jpg");
        storage.put_bytes(&key, Bytes::from("jpeg bytes")).await?;
        let got = storage.get_bytes(&key).await?;
        assert_eq!(got, Bytes::from("jpeg bytes"));
        Ok(())
    }

    #[tokio::test]
    async fn delete_releases_staged_bytes() -> Result<(), StorageError> {
        let storage = Storage::new(StorageConfig::memory()).await?;
        let key = staging_key(UploadId::new(), "beach.jpg");
        storage.put_bytes(&key, Bytes::from("x")).await?;

        storage.delete(&key).await?;
        let missing = storage.get_bytes(&key).await;
        assert!(missing.is_err_and(|e| e.is_not_found()));

        // Deleting twice is fine.
        storage.delete(&key).await?;
        Ok(())
    }

    #[tokio::test]
    async fn filesystem_round_trip_with_prefix() -> Result<(), StorageError> {
        let dir = tempfile::tempdir()?;
        let cfg = StorageConfig {
            prefix: Some("/portfolio/".to_string()),
            ..StorageConfig::filesystem(dir.path())
        };
        let storage = Storage::new(cfg).await?;
        assert_eq!(storage.kind(), StorageKind::Filesystem);

        let key = staging_key(UploadId::new(), "night.png");
        storage.put_bytes(&key, Bytes::from_static(b"\x89PNG")).await?;
        assert_eq!(storage.get_bytes(&key).await?, Bytes::from_static(b"\x89PNG"));
        assert!(dir.path().join("portfolio").join(&key).exists());
        Ok(())
    }

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |name| {
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.to_string())
        }
    }

    #[test]
    fn config_defaults_to_filesystem() -> Result<(), StorageError> {
        let cfg = StorageConfig::from_lookup(lookup(&[("STORAGE_PREFIX", "  ")]))?;
        assert_eq!(cfg, StorageConfig::filesystem(DEFAULT_FS_ROOT));
        Ok(())
    }

    #[test]
    fn config_reads_s3_settings() -> Result<(), StorageError> {
        let cfg = StorageConfig::from_lookup(lookup(&[
            ("STORAGE_BACKEND", "s3"),
            ("S3_BUCKET", "photos"),
            ("S3_ENDPOINT", "http://localhost:9000"),
            ("STORAGE_PREFIX", "portfolio/"),
        ]))?;
        assert_eq!(
            cfg.backend,
            StagingBackend::S3 {
                bucket: "photos".to_string(),
                endpoint: Some("http://localhost:9000".to_string()),
            }
        );
        assert_eq!(cfg.prefix.as_deref(), Some("portfolio/"));
        Ok(())
    }

    #[test]
    fn config_rejects_bad_backend_settings() {
        let missing_bucket = StorageConfig::from_lookup(lookup(&[("STORAGE_BACKEND", "s3")]));
        assert!(matches!(missing_bucket, Err(StorageError::InvalidConfig(_))));

        let unknown = StorageConfig::from_lookup(lookup(&[("STORAGE_BACKEND", "ftp")]));
        assert!(matches!(unknown, Err(StorageError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn empty_key_is_rejected() -> Result<(), StorageError> {
        let storage = Storage::new(StorageConfig::memory()).await?;
        let err = storage.put_bytes("/", Bytes::new()).await;
        assert!(matches!(err, Err(StorageError::InvalidConfig(_))));
        Ok(())
    }
}
