//! Acceptance rules for files dropped into the queue.

use serde::{Deserialize, Serialize};

/// Default size limit for a single photo (20 MiB).
pub const DEFAULT_MAX_FILE_BYTES: u64 = 20 * 1024 * 1024;

const DEFAULT_ACCEPTED_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/heic",
    "image/heif",
    "image/tiff",
];

/// Why a file was refused before it entered the queue.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum ValidationError {
    #[error("{file_name} is empty")]
    Empty { file_name: String },

    #[error("{file_name} is {size} bytes, the limit is {max} bytes")]
    TooLarge {
        file_name: String,
        size: u64,
        max: u64,
    },

    #[error("{file_name} has unsupported type {content_type}")]
    UnsupportedType {
        file_name: String,
        content_type: String,
    },
}

/// Size and type limits applied to every accepted file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRules {
    pub max_file_bytes: u64,
    pub accepted_types: Vec<String>,
}

impl Default for FileRules {
    fn default() -> Self {
        Self {
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            accepted_types: DEFAULT_ACCEPTED_TYPES
                .iter()
                .map(|t| t.to_string())
                .collect(),
        }
    }
}

impl FileRules {
    /// Set the size limit.
    pub fn with_max_file_bytes(mut self, max_file_bytes: u64) -> Self {
        self.max_file_bytes = max_file_bytes;
        self
    }

    /// Check a file and return its resolved content type.
    ///
    /// A missing or generic content type is inferred from the extension.
    pub fn validate(
        &self,
        file_name: &str,
        size: u64,
        content_type: Option<&str>,
    ) -> Result<String, ValidationError> {
        if size == 0 {
            return Err(ValidationError::Empty {
                file_name: file_name.to_string(),
            });
        }
        if size > self.max_file_bytes {
            return Err(ValidationError::TooLarge {
                file_name: file_name.to_string(),
                size,
                max: self.max_file_bytes,
            });
        }

        let resolved = resolve_content_type(file_name, content_type);
        if !self
            .accepted_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(&resolved))
        {
            return Err(ValidationError::UnsupportedType {
                file_name: file_name.to_string(),
                content_type: resolved,
            });
        }

        Ok(resolved)
    }
}

/// Pick the declared content type, or guess one from the file extension.
pub fn resolve_content_type(file_name: &str, declared: Option<&str>) -> String {
    match declared.map(str::trim) {
        Some(ct) if !ct.is_empty() && ct != "application/octet-stream" => {
            ct.to_ascii_lowercase()
        }
        _ => guess_from_extension(file_name)
            .unwrap_or("application/octet-stream")
            .to_string(),
    }
}

fn guess_from_extension(file_name: &str) -> Option<&'static str> {
    let (_, ext) = file_name.rsplit_once('.')?;
    let ct = match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "heif" => "image/heif",
        "tif" | "tiff" => "image/tiff",
        _ => return None,
    };
    Some(ct)
}
