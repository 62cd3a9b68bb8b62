//! Service configuration.

use crate::error::{Error, Result};
use crate::grounding::DEFAULT_STALE_THRESHOLD_DAYS;
use crate::llm::ClientConfig;
use crate::trace::DEFAULT_LOG_TIMEOUT_SECS;

/// Default endpoint of the trace logging service.
pub const DEFAULT_LOG_ENDPOINT: &str = "http://localhost:8000/log-trace";

/// Default model for grounded answers.
pub const DEFAULT_MODEL: &str = "gemini-2.5-pro";

/// Configuration for a [`crate::GroundingSentinel`].
#[derive(Debug, Clone, PartialEq)]
pub struct SentinelConfig {
    /// Model API key. Only needed when a live client is built.
    pub api_key: Option<String>,
    /// Model used for grounded answers.
    pub model: String,
    /// Base URL override for the model API.
    pub api_base_url: Option<String>,
    /// Model request timeout in seconds.
    pub model_timeout_secs: u64,
    /// Endpoint receiving traces.
    pub log_endpoint: String,
    /// Trace delivery timeout in seconds.
    pub log_timeout_secs: u64,
    /// Sources older than this many days are stale.
    pub stale_threshold_days: i64,
}

impl Default for SentinelConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_base_url: None,
            model_timeout_secs: 120,
            log_endpoint: DEFAULT_LOG_ENDPOINT.to_string(),
            log_timeout_secs: DEFAULT_LOG_TIMEOUT_SECS,
            stale_threshold_days: DEFAULT_STALE_THRESHOLD_DAYS,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

impl SentinelConfig {
    /// Create configuration from environment variables.
    ///
    /// Unset or unparseable variables fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: std::env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty()),
            model: std::env::var("SENTINEL_MODEL").unwrap_or(defaults.model),
            api_base_url: std::env::var("SENTINEL_API_BASE_URL").ok(),
            model_timeout_secs: env_parse("SENTINEL_MODEL_TIMEOUT_SECS")
                .unwrap_or(defaults.model_timeout_secs),
            log_endpoint: std::env::var("SENTINEL_LOG_ENDPOINT").unwrap_or(defaults.log_endpoint),
            log_timeout_secs: env_parse("SENTINEL_TIMEOUT_SECS").unwrap_or(defaults.log_timeout_secs),
            stale_threshold_days: env_parse("SENTINEL_STALE_THRESHOLD_DAYS")
                .unwrap_or(defaults.stale_threshold_days),
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_log_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.log_endpoint = endpoint.into();
        self
    }

    pub fn with_stale_threshold_days(mut self, days: i64) -> Self {
        self.stale_threshold_days = days;
        self
    }

    /// Check the settings a live deployment needs.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            return Err(Error::Config("GEMINI_API_KEY is not set".to_string()));
        }
        if self.model.trim().is_empty() {
            return Err(Error::Config("model name is empty".to_string()));
        }
        if !(self.log_endpoint.starts_with("http://") || self.log_endpoint.starts_with("https://")) {
            return Err(Error::Config(format!(
                "log endpoint must be an http(s) URL: {}",
                self.log_endpoint
            )));
        }
        if self.stale_threshold_days < 0 {
            return Err(Error::Config(format!(
                "stale threshold must be non-negative, got {}",
                self.stale_threshold_days
            )));
        }
        Ok(())
    }

    /// Client configuration for the model API.
    pub fn client_config(&self) -> Result<ClientConfig> {
        let api_key = self
            .api_key
            .clone()
            .ok_or_else(|| Error::Config("GEMINI_API_KEY is not set".to_string()))?;
        let mut config = ClientConfig::new(api_key)
            .with_default_model(&self.model)
            .with_timeout(self.model_timeout_secs);
        if let Some(ref url) = self.api_base_url {
            config = config.with_base_url(url);
        }
        Ok(config)
    }
}
