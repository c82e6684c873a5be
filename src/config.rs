//! Client configuration
//!
//! Values come from the environment (a `.env` file is honoured, see [`crate::init`]),
//! falling back to defaults suitable for a local backend.

use std::time::Duration;

const DEFAULT_API_URL: &str = "http://localhost:8000/api";

/// Configuration shared by the API client and the workflow driver
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL for API calls, without a trailing slash
    pub base_url: String,

    /// Dwell time of each narrated processing step
    pub step_interval: Duration,

    /// Request timeout for document uploads
    pub upload_timeout: Duration,

    /// Request timeout for follow-up questions
    pub chat_timeout: Duration,

    /// Retries for idempotent lookups (429 or transport failure)
    pub max_retries: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            step_interval: Duration::from_millis(1000),
            upload_timeout: Duration::from_secs(120),
            chat_timeout: Duration::from_secs(60),
            max_retries: 3,
        }
    }
}

impl ClientConfig {
    /// Read configuration from `INTERPRET_*` environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("INTERPRET_API_URL") {
            if !url.trim().is_empty() {
                config.base_url = url;
            }
        }
        if let Some(ms) = env_u64("INTERPRET_STEP_INTERVAL_MS") {
            config.step_interval = Duration::from_millis(ms);
        }
        if let Some(secs) = env_u64("INTERPRET_UPLOAD_TIMEOUT_SECS") {
            config.upload_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = env_u64("INTERPRET_CHAT_TIMEOUT_SECS") {
            config.chat_timeout = Duration::from_secs(secs);
        }

        let base_url = config.base_url.clone();
        config.with_base_url(base_url)
    }

    /// Replace the base URL, trimming any trailing slashes
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.base_url = url.trim().trim_end_matches('/').to_string();
        self
    }

    pub fn with_step_interval(mut self, interval: Duration) -> Self {
        self.step_interval = interval;
        self
    }

    /// Join an endpoint path onto the base URL
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

fn env_u64(key: &str) -> Option<u64> {
    match std::env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(key, value = %raw, "Ignoring non-numeric config value");
                None
            }
        },
        Err(_) => None,
    }
}
