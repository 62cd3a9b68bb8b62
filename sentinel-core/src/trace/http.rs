//! Trace delivery to a remote logging endpoint.

use async_trait::async_trait;
use reqwest::Client;

use crate::config::SentinelConfig;
use crate::error::{Error, Result};
use crate::llm::build_http_client;

use super::types::AgentTrace;
use super::TraceLogger;

/// Default delivery timeout in seconds.
pub const DEFAULT_LOG_TIMEOUT_SECS: u64 = 30;

/// Posts traces as JSON to an HTTP endpoint.
pub struct HttpTraceLogger {
    client: Client,
    endpoint: String,
}

impl HttpTraceLogger {
    pub fn new(endpoint: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            client: build_http_client(timeout_secs)?,
            endpoint: endpoint.into(),
        })
    }

    /// Logger for the endpoint and timeout in `config`.
    pub fn from_config(config: &SentinelConfig) -> Result<Self> {
        Self::new(&config.log_endpoint, config.log_timeout_secs)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TraceLogger for HttpTraceLogger {
    async fn log_trace(&self, trace: &AgentTrace) -> Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(trace)
            .send()
            .await
            .map_err(|e| Error::trace_log(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::trace_log(format!(
                "{} rejected trace with {}: {}",
                self.endpoint,
                status,
                body.trim()
            )));
        }

        tracing::debug!(session_id = %trace.session_id, "Trace delivered");
        Ok(())
    }
}
