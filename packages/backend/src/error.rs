use upload_core::UploadFailure;

/// Errors raised before or outside an upload request.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid backend config: {0}")]
    InvalidConfig(String),

    #[error("invalid backend URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl From<ClientError> for UploadFailure {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Http(e) => transport_failure(&e),
            other => UploadFailure::network(other.to_string()),
        }
    }
}

/// Failure for a request that produced no HTTP response.
pub(crate) fn transport_failure(err: &reqwest::Error) -> UploadFailure {
    if err.is_timeout() {
        UploadFailure::network("request timed out")
    } else if err.is_connect() {
        UploadFailure::network(format!("could not connect: {err}"))
    } else {
        UploadFailure::network(err.to_string())
    }
}
