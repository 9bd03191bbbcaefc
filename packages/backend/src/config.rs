use std::time::Duration;

use url::Url;

use crate::ClientError;

/// Default photo-upload endpoint path.
pub const DEFAULT_UPLOAD_PATH: &str = "/api/photos/upload";

const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Where and how to reach the photo backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    /// Scheme, host and optional path prefix, e.g. `https://photos.example.com`.
    pub base_url: String,
    pub upload_path: String,
    /// Sent as a bearer token when set.
    pub auth_token: Option<String>,
    /// Whole-request timeout.
    pub timeout: Duration,
}

impl BackendConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            upload_path: DEFAULT_UPLOAD_PATH.to_string(),
            auth_token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build a config from environment variables.
    ///
    /// - `PHOTO_API_BASE_URL` (required)
    /// - `PHOTO_API_UPLOAD_PATH` (default: `/api/photos/upload`)
    /// - `PHOTO_API_TOKEN` (optional)
    /// - `PHOTO_API_TIMEOUT_SECS` (default: 300)
    pub fn from_env() -> Result<Self, ClientError> {
        let base_url = env_var("PHOTO_API_BASE_URL").ok_or_else(|| {
            ClientError::InvalidConfig("PHOTO_API_BASE_URL is required".into())
        })?;

        let mut cfg = Self::new(base_url);
        if let Some(path) = env_var("PHOTO_API_UPLOAD_PATH") {
            cfg.upload_path = path;
        }
        cfg.auth_token = env_var("PHOTO_API_TOKEN");
        if let Some(raw) = env_var("PHOTO_API_TIMEOUT_SECS") {
            let secs = raw.parse::<u64>().map_err(|_| {
                ClientError::InvalidConfig(format!("invalid PHOTO_API_TIMEOUT_SECS={raw}"))
            })?;
            cfg.timeout = Duration::from_secs(secs);
        }

        cfg.upload_url()?;
        Ok(cfg)
    }

    /// Full URL of the upload endpoint.
    pub fn upload_url(&self) -> Result<Url, ClientError> {
        let base = self.base_url.trim().trim_end_matches('/');
        let path = self.upload_path.trim().trim_start_matches('/');
        let url = Url::parse(&format!("{base}/{path}"))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::InvalidConfig(format!(
                "unsupported scheme in {url} (expected http or https)"
            )));
        }
        Ok(url)
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_url_joins_base_and_path() -> Result<(), ClientError> {
        let cfg = BackendConfig::new("https://photos.example.com/");
        assert_eq!(
            cfg.upload_url()?.as_str(),
            "https://photos.example.com/api/photos/upload"
        );

        let cfg = BackendConfig {
            upload_path: "v2/upload".to_string(),
            ..BackendConfig::new("http://localhost:8080/backend")
        };
        assert_eq!(
            cfg.upload_url()?.as_str(),
            "http://localhost:8080/backend/v2/upload"
        );
        Ok(())
    }

    #[test]
    fn rejects_non_http_urls() {
        assert!(matches!(
            BackendConfig::new("ftp://example.com").upload_url(),
            Err(ClientError::InvalidConfig(_))
        ));
        assert!(matches!(
            BackendConfig::new("not a url").upload_url(),
            Err(ClientError::InvalidUrl(_))
        ));
    }
}
