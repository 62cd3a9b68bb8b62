//! Grounded LLM client trait and the Gemini implementation.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;

use crate::error::{Error, Result};

use super::response::RawModelResponse;

/// Client that answers a prompt with search grounding enabled.
#[async_trait]
pub trait GroundedClient: Send + Sync {
    /// Answer `prompt`, returning the raw response tree.
    async fn generate_grounded(&self, prompt: &str) -> Result<RawModelResponse>;

    /// Model identifier used for requests.
    fn model(&self) -> &str;
}

/// Configuration for LLM clients.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API key
    pub api_key: String,
    /// Base URL override
    pub base_url: Option<String>,
    /// Default model
    pub default_model: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
            default_model: None,
            timeout_secs: 120,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

pub(crate) fn build_http_client(timeout_secs: u64) -> Result<Client> {
    let timeout = Duration::from_secs(timeout_secs);

    // Some sandboxed macOS environments can panic during proxy auto-detection
    // in reqwest's default client builder. Fall back to no-proxy in that case.
    match catch_unwind(AssertUnwindSafe(|| {
        Client::builder().timeout(timeout).build()
    })) {
        Ok(Ok(client)) => Ok(client),
        Ok(Err(_)) | Err(_) => Client::builder()
            .no_proxy()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e))),
    }
}

/// Google Gemini client with Google Search grounding.
#[cfg(feature = "gemini")]
pub struct GeminiClient {
    config: ClientConfig,
    model: String,
    http: Client,
}

#[cfg(feature = "gemini")]
impl GeminiClient {
    const DEFAULT_BASE_URL: &'static str = "https://generativelanguage.googleapis.com";
    const DEFAULT_MODEL: &'static str = "gemini-2.5-pro";

    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(Error::Config("Gemini API key is empty".to_string()));
        }
        let http = build_http_client(config.timeout_secs)?;
        let model = config
            .default_model
            .clone()
            .unwrap_or_else(|| Self::DEFAULT_MODEL.to_string());

        Ok(Self {
            config,
            model,
            http,
        })
    }

    fn base_url(&self) -> &str {
        self.config
            .base_url
            .as_deref()
            .unwrap_or(Self::DEFAULT_BASE_URL)
    }
}

// Google Gemini API types
#[cfg(feature = "gemini")]
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    tools: Vec<GeminiTool>,
}

#[cfg(feature = "gemini")]
#[derive(Debug, Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[cfg(feature = "gemini")]
#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[cfg(feature = "gemini")]
#[derive(Debug, Serialize)]
struct GeminiTool {
    google_search: GoogleSearch,
}

#[cfg(feature = "gemini")]
#[derive(Debug, Serialize)]
struct GoogleSearch {}

#[cfg(feature = "gemini")]
#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorDetail,
}

#[cfg(feature = "gemini")]
#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: String,
    #[allow(dead_code)]
    status: Option<String>,
}

#[cfg(feature = "gemini")]
fn build_request(prompt: &str) -> GeminiRequest {
    GeminiRequest {
        contents: vec![GeminiContent {
            role: "user".to_string(),
            parts: vec![GeminiPart {
                text: prompt.to_string(),
            }],
        }],
        tools: vec![GeminiTool {
            google_search: GoogleSearch {},
        }],
    }
}

#[cfg(feature = "gemini")]
fn decode_body(status: StatusCode, body: &str) -> Result<RawModelResponse> {
    if !status.is_success() {
        if let Ok(error) = serde_json::from_str::<GeminiError>(body) {
            return Err(Error::llm_api("google", error.error.message));
        }
        return Err(Error::LLM(format!(
            "Gemini API error ({}): {}",
            status, body
        )));
    }

    RawModelResponse::from_json(body)
        .map_err(|e| Error::LLM(format!("Failed to parse response: {}", e)))
}

#[cfg(feature = "gemini")]
#[async_trait]
impl GroundedClient for GeminiClient {
    async fn generate_grounded(&self, prompt: &str) -> Result<RawModelResponse> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url(),
            self.model,
            self.config.api_key
        );

        let response = self
            .http
            .post(&url)
            .header("content-type", "application/json")
            .json(&build_request(prompt))
            .send()
            .await
            .map_err(|e| Error::LLM(format!("HTTP request failed: {}", e.without_url())))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::LLM(format!("Failed to read response: {}", e.without_url())))?;

        tracing::debug!(model = %self.model, status = %status, bytes = body.len(), "Gemini response received");

        decode_body(status, &body)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
