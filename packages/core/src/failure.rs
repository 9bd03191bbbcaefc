//! Upload failure categories and their user-facing messages.

use serde::{Deserialize, Serialize};

/// Category of a failed upload, decided at the network boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The backend rejected the request body (400, 422).
    Validation,
    /// The body exceeded the backend's limit (413).
    TooLarge,
    /// Missing or expired credentials (401, 403).
    Unauthorized,
    /// The backend failed (5xx).
    Server,
    /// The request never got a response.
    Network,
    /// Any other non-success status.
    Unexpected,
    /// The staged file bytes are gone.
    SourceMissing,
}

impl FailureKind {
    /// Categorize a non-success HTTP status code.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 | 422 => FailureKind::Validation,
            413 => FailureKind::TooLarge,
            401 | 403 => FailureKind::Unauthorized,
            500..=599 => FailureKind::Server,
            _ => FailureKind::Unexpected,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Validation => "validation",
            FailureKind::TooLarge => "too_large",
            FailureKind::Unauthorized => "unauthorized",
            FailureKind::Server => "server",
            FailureKind::Network => "network",
            FailureKind::Unexpected => "unexpected",
            FailureKind::SourceMissing => "source_missing",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A categorized upload failure stored on the job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadFailure {
    pub kind: FailureKind,
    /// Message shown to the user.
    pub message: String,
    /// HTTP status, when the backend answered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// The backend's own error text, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl UploadFailure {
    /// Failure for a non-success HTTP response.
    pub fn from_status(status: u16, detail: Option<String>) -> Self {
        let kind = FailureKind::from_status(status);
        let message = match kind {
            FailureKind::Unexpected => format!("Upload failed with status {}.", status),
            other => default_message(other).to_string(),
        };
        Self {
            kind,
            message,
            status: Some(status),
            detail: detail.filter(|d| !d.trim().is_empty()),
        }
    }

    /// Failure for a request that got no response.
    pub fn network(detail: impl Into<String>) -> Self {
        Self::new(FailureKind::Network, Some(detail.into()))
    }

    /// Failure for an upload whose staged bytes could not be read.
    pub fn source_missing(detail: impl Into<String>) -> Self {
        Self::new(FailureKind::SourceMissing, Some(detail.into()))
    }

    /// Failure for a request that could not be built from the upload's own data.
    pub fn validation(detail: impl Into<String>) -> Self {
        Self::new(FailureKind::Validation, Some(detail.into()))
    }

    /// Failure for an attempt that ended without a result.
    pub fn unexpected(detail: impl Into<String>) -> Self {
        Self::new(FailureKind::Unexpected, Some(detail.into()))
    }

    fn new(kind: FailureKind, detail: Option<String>) -> Self {
        Self {
            kind,
            message: default_message(kind).to_string(),
            status: None,
            detail,
        }
    }
}

impl std::fmt::Display for UploadFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{} ({})", self.message, detail),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for UploadFailure {}

fn default_message(kind: FailureKind) -> &'static str {
    match kind {
        FailureKind::Validation => "The photo was rejected: check the file and its details.",
        FailureKind::TooLarge => "The photo is too large to upload.",
        FailureKind::Unauthorized => {
            "You are not authorised to upload photos. Please sign in again."
        }
        FailureKind::Server => "The server failed to process the upload. Try again later.",
        FailureKind::Network => "Network error: check your connection and try again.",
        FailureKind::Unexpected => "Upload failed.",
        FailureKind::SourceMissing => {
            "The selected file is no longer available. Remove it and add it again."
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_categories() {
        assert_eq!(FailureKind::from_status(400), FailureKind::Validation);
        assert_eq!(FailureKind::from_status(422), FailureKind::Validation);
        assert_eq!(FailureKind::from_status(413), FailureKind::TooLarge);
        assert_eq!(FailureKind::from_status(401), FailureKind::Unauthorized);
        assert_eq!(FailureKind::from_status(403), FailureKind::Unauthorized);
        assert_eq!(FailureKind::from_status(500), FailureKind::Server);
        assert_eq!(FailureKind::from_status(503), FailureKind::Server);
        assert_eq!(FailureKind::from_status(404), FailureKind::Unexpected);
    }

    #[test]
    fn unexpected_status_names_the_code() {
        let failure = UploadFailure::from_status(409, None);
        assert_eq!(failure.message, "Upload failed with status 409.");
        assert_eq!(failure.status, Some(409));
    }

    #[test]
    fn blank_detail_is_dropped() {
        let failure = UploadFailure::from_status(500, Some("   ".to_string()));
        assert_eq!(failure.detail, None);
        assert_eq!(failure.kind, FailureKind::Server);
    }

    #[test]
    fn display_appends_detail() {
        let failure = UploadFailure::network("connection refused");
        assert_eq!(
            failure.to_string(),
            "Network error: check your connection and try again. (connection refused)"
        );
        assert_eq!(failure.status, None);
    }

    #[test]
    fn local_failures_carry_no_status() {
        let invalid = UploadFailure::validation("bad content type");
        assert_eq!(invalid.kind, FailureKind::Validation);
        assert_eq!(invalid.status, None);
        assert_eq!(invalid.detail.as_deref(), Some("bad content type"));

        let crashed = UploadFailure::unexpected("worker stopped");
        assert_eq!(crashed.kind, FailureKind::Unexpected);
        assert_eq!(crashed.message, "Upload failed.");
    }
}
