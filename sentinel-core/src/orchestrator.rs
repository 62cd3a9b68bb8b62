//! Verification orchestrator.
//!
//! [`GroundingSentinel`] ties the pipeline together:
//! 1. EXTRACT: normalize the raw response into grounding metadata
//! 2. ANALYZE: hallucination, staleness and confidence over that metadata
//! 3. ASSEMBLE: merge the verdicts into a [`VerificationResult`]
//! 4. LOG: hand an [`AgentTrace`] to the trace logger on a detached task
//!
//! The result never waits on step 4. A logging failure is reported on the
//! diagnostic channel only.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::config::SentinelConfig;
use crate::diagnostics::{DiagnosticEmitter, DiagnosticEvent, DiagnosticKind, TracingEmitter};
use crate::error::Result;
use crate::grounding::{
    confidence_score, detect_hallucination, stale_sources_at, MetadataExtractor,
    VerificationResult, DEFAULT_STALE_THRESHOLD_DAYS, UNVERIFIED_WARNING,
};
use crate::llm::{GroundedClient, RawModelResponse};
use crate::trace::{AgentTrace, TraceLogger};

/// Grounded-answer verification service.
pub struct GroundingSentinel {
    client: Arc<dyn GroundedClient>,
    logger: Arc<dyn TraceLogger>,
    emitter: Arc<dyn DiagnosticEmitter>,
    stale_threshold_days: i64,
}

impl GroundingSentinel {
    /// Create a sentinel that reports diagnostics through `tracing`.
    pub fn new(client: Arc<dyn GroundedClient>, logger: Arc<dyn TraceLogger>) -> Self {
        Self {
            client,
            logger,
            emitter: Arc::new(TracingEmitter),
            stale_threshold_days: DEFAULT_STALE_THRESHOLD_DAYS,
        }
    }

    /// Build a live sentinel: Gemini for answers, HTTP for traces.
    #[cfg(feature = "gemini")]
    pub fn from_config(config: &SentinelConfig) -> Result<Self> {
        use crate::llm::GeminiClient;
        use crate::trace::HttpTraceLogger;

        config.validate()?;
        let client = GeminiClient::new(config.client_config()?)?;
        let logger = HttpTraceLogger::from_config(config)?;

        Ok(Self::new(Arc::new(client), Arc::new(logger))
            .with_stale_threshold_days(config.stale_threshold_days))
    }

    pub fn with_emitter(mut self, emitter: Arc<dyn DiagnosticEmitter>) -> Self {
        self.emitter = emitter;
        self
    }

    pub fn with_stale_threshold_days(mut self, days: i64) -> Self {
        self.stale_threshold_days = days;
        self
    }

    /// Apply the threshold from `config`, keeping the collaborators.
    pub fn with_config(self, config: &SentinelConfig) -> Self {
        self.with_stale_threshold_days(config.stale_threshold_days)
    }

    pub fn stale_threshold_days(&self) -> i64 {
        self.stale_threshold_days
    }

    /// Verify a response as of now.
    pub fn verify(&self, response: &RawModelResponse) -> VerificationResult {
        self.verify_at(response, Utc::now())
    }

    /// Verify a response, judging staleness as of `now`.
    pub fn verify_at(&self, response: &RawModelResponse, now: DateTime<Utc>) -> VerificationResult {
        let metadata = MetadataExtractor::new(Arc::clone(&self.emitter)).extract(response);
        let response_text = response.text();

        let signal = detect_hallucination(&response_text, &metadata);
        if let Some(ref signal) = signal {
            self.emitter.emit(DiagnosticEvent::hallucination_flag(
                signal.check_name(),
                signal.to_string(),
            ));
        }

        let stale = stale_sources_at(&metadata, self.stale_threshold_days, now);
        if !stale.is_empty() {
            self.emitter.emit(
                DiagnosticEvent::stale_source(self.stale_threshold_days)
                    .with_metadata("stale_count", stale.len())
                    .with_metadata("oldest", stale.iter().map(|s| s.date).min().map(|d| d.to_string())),
            );
        }

        let dangling = metadata.dangling_support_indices();
        if !dangling.is_empty() {
            tracing::debug!(?dangling, "Supports reference missing chunks");
        }

        let is_hallucinated = signal.is_some();
        let warning = (metadata.support_count() == 0 && !is_hallucinated)
            .then(|| UNVERIFIED_WARNING.to_string());

        let result = VerificationResult {
            response_text,
            sources_count: metadata.chunk_count(),
            confidence_score: confidence_score(&metadata),
            grounding_metadata: metadata,
            is_hallucinated,
            is_stale: !stale.is_empty(),
            warning,
        };

        self.emitter.emit(
            DiagnosticEvent::new(
                DiagnosticKind::VerificationComplete,
                format!(
                    "Verified answer: hallucinated={} stale={} confidence={:.2}",
                    result.is_hallucinated, result.is_stale, result.confidence_score
                ),
            )
            .with_metadata("sources_count", result.sources_count)
            .with_metadata("confidence_score", result.confidence_score)
            .with_metadata("dangling_support_indices", dangling),
        );

        result
    }

    /// Verify a response and dispatch its trace without waiting on it.
    ///
    /// The handle is only useful to callers that want to observe delivery;
    /// dropping it leaves the task running. Returns `None` for the handle
    /// when there is no runtime to spawn on.
    pub fn analyze_and_log(
        &self,
        prompt: &str,
        session_id: &str,
        response: &RawModelResponse,
    ) -> (VerificationResult, Option<JoinHandle<()>>) {
        let result = self.verify(response);
        let handle = self.dispatch_trace(AgentTrace::from_result(session_id, prompt, &result));
        (result, handle)
    }

    /// Hand a trace to the logger on a detached task.
    pub fn dispatch_trace(&self, trace: AgentTrace) -> Option<JoinHandle<()>> {
        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                self.emitter
                    .emit(DiagnosticEvent::trace_log_failure(&trace.session_id, e.to_string()));
                return None;
            }
        };

        let logger = Arc::clone(&self.logger);
        let emitter = Arc::clone(&self.emitter);
        Some(runtime.spawn(async move {
            if let Err(e) = logger.log_trace(&trace).await {
                emitter.emit(DiagnosticEvent::trace_log_failure(&trace.session_id, e.to_string()));
            }
        }))
    }

    /// Ask the model with search grounding, verify the answer and log it.
    ///
    /// Only the model call can fail; logging never affects the result.
    pub async fn get_grounded_response(
        &self,
        prompt: &str,
        session_id: &str,
    ) -> Result<VerificationResult> {
        tracing::debug!(session_id, model = self.client.model(), "Requesting grounded answer");
        let response = self.client.generate_grounded(prompt).await?;
        let (result, _detached) = self.analyze_and_log(prompt, session_id, &response);
        Ok(result)
    }

    /// Run several prompts concurrently under one session.
    ///
    /// Results are in prompt order; each fails or succeeds independently.
    pub async fn get_grounded_batch(
        &self,
        prompts: &[String],
        session_id: &str,
    ) -> Vec<Result<VerificationResult>> {
        join_all(
            prompts
                .iter()
                .map(|prompt| self.get_grounded_response(prompt, session_id)),
        )
        .await
    }
}
