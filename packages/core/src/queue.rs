//! Queue-wide types: configuration, counts and view filters.

use serde::{Deserialize, Serialize};

use crate::{FileRules, QueueError, UploadStatus};

/// Configuration for queue behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Number of uploads allowed in flight at once.
    pub concurrency: u32,
    /// Maximum number of active (unsettled) uploads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_queue_size: Option<usize>,
    /// File acceptance rules.
    pub rules: FileRules,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            concurrency: 1,
            max_queue_size: None,
            rules: FileRules::default(),
        }
    }
}

impl QueueConfig {
    /// Build a config from environment variables.
    ///
    /// - `UPLOAD_CONCURRENCY` (default: 1, must be at least 1)
    /// - `UPLOAD_MAX_QUEUE_SIZE` (optional)
    /// - `UPLOAD_MAX_FILE_BYTES` (default: 20 MiB)
    pub fn from_env() -> Result<Self, QueueError> {
        let mut cfg = Self::default();

        if let Some(concurrency) = parse_env::<u32>("UPLOAD_CONCURRENCY")? {
            if concurrency == 0 {
                return Err(QueueError::InvalidConfig(
                    "UPLOAD_CONCURRENCY must be at least 1".into(),
                ));
            }
            cfg.concurrency = concurrency;
        }
        cfg.max_queue_size = parse_env::<usize>("UPLOAD_MAX_QUEUE_SIZE")?;
        if let Some(max) = parse_env::<u64>("UPLOAD_MAX_FILE_BYTES")? {
            cfg.rules = cfg.rules.with_max_file_bytes(max);
        }

        Ok(cfg)
    }
}

fn parse_env<T: std::str::FromStr>(var_name: &str) -> Result<Option<T>, QueueError> {
    let raw = match std::env::var(var_name) {
        Ok(v) if !v.trim().is_empty() => v,
        _ => return Ok(None),
    };
    raw.trim()
        .parse::<T>()
        .map(Some)
        .map_err(|_| QueueError::InvalidConfig(format!("invalid value for {var_name}={raw}")))
}

/// Number of uploads per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueCounts {
    pub pending: u64,
    pub uploading: u64,
    pub paused: u64,
    pub completed: u64,
    pub error: u64,
}

impl QueueCounts {
    /// Count one upload with the given status.
    pub fn record(&mut self, status: &UploadStatus) {
        match status {
            UploadStatus::Pending => self.pending += 1,
            UploadStatus::Uploading { .. } => self.uploading += 1,
            UploadStatus::Paused { .. } => self.paused += 1,
            UploadStatus::Completed { .. } => self.completed += 1,
            UploadStatus::Error { .. } => self.error += 1,
        }
    }

    /// Uploads not yet settled.
    pub fn active(&self) -> u64 {
        self.pending + self.uploading + self.paused
    }

    pub fn total(&self) -> u64 {
        self.active() + self.completed + self.error
    }

    pub fn has_active(&self) -> bool {
        self.active() > 0
    }

    /// Count for a view filter tab.
    pub fn for_filter(&self, filter: UploadFilter) -> u64 {
        match filter {
            UploadFilter::All => self.total(),
            UploadFilter::Active => self.active(),
            UploadFilter::Completed => self.completed,
            UploadFilter::Error => self.error,
        }
    }
}

/// Grouping used by the queue view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadFilter {
    #[default]
    All,
    Active,
    Completed,
    Error,
}

impl UploadFilter {
    pub const ALL: [UploadFilter; 4] = [
        UploadFilter::All,
        UploadFilter::Active,
        UploadFilter::Completed,
        UploadFilter::Error,
    ];

    pub fn matches(&self, status: &UploadStatus) -> bool {
        match self {
            UploadFilter::All => true,
            UploadFilter::Active => status.is_active(),
            UploadFilter::Completed => matches!(status, UploadStatus::Completed { .. }),
            UploadFilter::Error => matches!(status, UploadStatus::Error { .. }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UploadFilter::All => "all",
            UploadFilter::Active => "active",
            UploadFilter::Completed => "completed",
            UploadFilter::Error => "error",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            UploadFilter::All => "All",
            UploadFilter::Active => "Active",
            UploadFilter::Completed => "Completed",
            UploadFilter::Error => "Failed",
        }
    }
}

impl std::str::FromStr for UploadFilter {
    type Err = QueueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" | "" => Ok(UploadFilter::All),
            "active" => Ok(UploadFilter::Active),
            "completed" => Ok(UploadFilter::Completed),
            "error" => Ok(UploadFilter::Error),
            other => Err(QueueError::InvalidConfig(format!("unknown filter: {other}"))),
        }
    }
}

impl std::fmt::Display for UploadFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
