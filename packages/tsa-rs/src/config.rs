use std::env;
use std::time::Duration;

pub const DEFAULT_DATA_API_URL: &str = "https://api.e-cyanobacterium.org/";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Data API connection settings
#[derive(Debug, Clone, PartialEq)]
pub struct DataApiConfig {
    /// Base URL, always ending in `/`
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl DataApiConfig {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: normalize_base_url(base_url.into())?,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Load configuration from environment variables (and `.env` if present)
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let base_url =
            env::var("TSA_DATA_API_URL").unwrap_or_else(|_| DEFAULT_DATA_API_URL.to_string());

        let timeout_secs = match env::var("TSA_DATA_API_TIMEOUT_SECS") {
            Ok(raw) => raw
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidTimeout(raw))?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self::new(base_url)?.with_timeout(Duration::from_secs(timeout_secs)))
    }

    /// URL of an API path relative to the base
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }
}

fn normalize_base_url(mut url: String) -> Result<String, ConfigError> {
    let trimmed = url.trim();
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::InvalidValue(format!(
            "Data API URL must start with http:// or https://, got '{}'",
            trimmed
        )));
    }
    url = trimmed.to_string();
    if !url.ends_with('/') {
        url.push('/');
    }
    Ok(url)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid timeout in seconds: {0}")]
    InvalidTimeout(String),
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}
