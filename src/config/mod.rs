//! Client configuration (code > environment > defaults).

use std::path::PathBuf;
use std::time::Duration;

use bon::Builder;

use crate::auth::StorageKind;
use crate::error::{PlintoError, Result};

/// Used when neither code nor environment names an API URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Settings for a [`crate::PlintoClient`].
///
/// # Example
/// ```
/// use std::time::Duration;
/// use plinto::auth::StorageKind;
/// use plinto::config::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .base_url("https://auth.example.com")
///     .storage(StorageKind::Memory)
///     .timeout(Duration::from_secs(10))
///     .build();
/// assert_eq!(config.refresh_buffer, Duration::from_secs(300));
/// ```
#[derive(Debug, Clone, Builder)]
pub struct ClientConfig {
    #[builder(into)]
    pub base_url: String,
    /// Sent as `X-API-Key` on every request.
    #[builder(into)]
    pub api_key: Option<String>,
    #[builder(default)]
    pub storage: StorageKind,
    /// Overrides the directory of file-backed storage.
    pub storage_dir: Option<PathBuf>,
    #[builder(default = Duration::from_secs(30))]
    pub timeout: Duration,
    /// How often the background task looks at the access token.
    #[builder(default = Duration::from_secs(60))]
    pub auto_refresh_interval: Duration,
    /// Tokens expiring within this window are refreshed ahead of time.
    #[builder(default = Duration::from_secs(300))]
    pub refresh_buffer: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::builder().base_url(DEFAULT_BASE_URL).build()
    }
}

impl ClientConfig {
    /// Load from `PLINTO_*` environment variables (and `.env` if present).
    ///
    /// `PLINTO_API_URL` wins over `NEXT_PUBLIC_API_URL`, which lets a web
    /// app's existing environment drive the SDK.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let base_url = lookup("PLINTO_API_URL")
            .or_else(|| lookup("NEXT_PUBLIC_API_URL"))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let mut config = Self::builder().base_url(base_url).build();
        config.api_key = lookup("PLINTO_API_KEY").filter(|key| !key.is_empty());
        config.storage_dir = lookup("PLINTO_STORAGE_DIR").map(PathBuf::from);

        if let Some(storage) = lookup("PLINTO_STORAGE") {
            config.storage = storage.parse().map_err(|_| {
                PlintoError::Configuration(format!(
                    "PLINTO_STORAGE must be local, session or memory (got '{storage}')"
                ))
            })?;
        }
        if let Some(secs) = lookup("PLINTO_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|_| {
                PlintoError::Configuration(format!(
                    "PLINTO_TIMEOUT_SECS must be a whole number of seconds (got '{secs}')"
                ))
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Parsed base URL with any trailing slash removed.
    pub(crate) fn api_url(&self) -> Result<reqwest::Url> {
        let trimmed = self.base_url.trim_end_matches('/');
        let url = reqwest::Url::parse(trimmed).map_err(|e| {
            PlintoError::Configuration(format!("invalid base URL '{}': {e}", self.base_url))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(PlintoError::Configuration(format!(
                "base URL must use http or https (got '{}')",
                self.base_url
            )));
        }
        Ok(url)
    }
}
