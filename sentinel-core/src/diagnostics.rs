//! Diagnostic channel for verification runs.
//!
//! Anomalies that the pipeline recovers from (a malformed response branch, a
//! trace that could not be delivered) never reach the caller as errors. They
//! are emitted here instead, as structured events that can be rendered
//! differently depending on the host:
//! - Services: forwarded to `tracing`
//! - Tests: collected in memory and asserted on
//! - Dashboards: streamed over a broadcast channel

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

/// Kinds of diagnostic events emitted during verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticKind {
    /// A branch of the response tree had an unexpected shape
    ExtractionAnomaly,
    /// The answer tripped a hallucination heuristic
    HallucinationFlag,
    /// A cited source predates the freshness threshold
    StaleSource,
    /// The trace logger rejected or could not receive a trace
    TraceLogFailure,
    /// A verification result was assembled
    VerificationComplete,
}

impl DiagnosticKind {
    /// Whether the event describes a recovered failure.
    pub fn is_anomaly(&self) -> bool {
        matches!(self, Self::ExtractionAnomaly | Self::TraceLogFailure)
    }
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::ExtractionAnomaly => "EXTRACTION_ANOMALY",
            Self::HallucinationFlag => "HALLUCINATION_FLAG",
            Self::StaleSource => "STALE_SOURCE",
            Self::TraceLogFailure => "TRACE_LOG_FAILURE",
            Self::VerificationComplete => "VERIFICATION_COMPLETE",
        };
        write!(f, "{}", s)
    }
}

/// A diagnostic event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticEvent {
    /// Type of the event
    pub kind: DiagnosticKind,
    /// Human-readable content describing the event
    pub content: String,
    /// Event-specific metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, Value>>,
    /// When the event occurred
    pub timestamp: DateTime<Utc>,
}

impl DiagnosticEvent {
    /// Create a new diagnostic event.
    pub fn new(kind: DiagnosticKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            metadata: None,
            timestamp: Utc::now(),
        }
    }

    /// Add metadata to the event.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Get a metadata value.
    pub fn get_metadata(&self, key: &str) -> Option<&Value> {
        self.metadata.as_ref()?.get(key)
    }

    /// Create an extraction anomaly event for the branch at `path`.
    pub fn extraction_anomaly(path: impl Into<String>, reason: impl Into<String>) -> Self {
        let path = path.into();
        let reason = reason.into();
        Self::new(
            DiagnosticKind::ExtractionAnomaly,
            format!("Error extracting grounding metadata at {}: {}", path, reason),
        )
        .with_metadata("path", path)
        .with_metadata("reason", reason)
    }

    /// Create a hallucination flag event.
    pub fn hallucination_flag(check: impl Into<String>, detail: impl Into<String>) -> Self {
        let check = check.into();
        Self::new(
            DiagnosticKind::HallucinationFlag,
            format!("Hallucination detected: {}", detail.into()),
        )
        .with_metadata("check", check)
    }

    /// Create a stale source event.
    pub fn stale_source(threshold_days: i64) -> Self {
        Self::new(
            DiagnosticKind::StaleSource,
            format!("Cited sources older than {} days", threshold_days),
        )
        .with_metadata("threshold_days", threshold_days)
    }

    /// Create a trace log failure event.
    pub fn trace_log_failure(session_id: impl Into<String>, error: impl Into<String>) -> Self {
        let error = error.into();
        Self::new(
            DiagnosticKind::TraceLogFailure,
            format!("Failed to log trace: {}", error),
        )
        .with_metadata("session_id", session_id.into())
        .with_metadata("error", error)
    }

    /// Format as a single-line log entry.
    pub fn as_log_line(&self) -> String {
        format!(
            "[{}] {}: {}",
            self.timestamp.format("%H:%M:%S%.3f"),
            self.kind,
            self.content.lines().next().unwrap_or("")
        )
    }
}

/// Sink for diagnostic events.
pub trait DiagnosticEmitter: Send + Sync {
    /// Emit a diagnostic event.
    fn emit(&self, event: DiagnosticEvent);
}

/// Emitter that forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEmitter;

impl DiagnosticEmitter for TracingEmitter {
    fn emit(&self, event: DiagnosticEvent) {
        match event.kind {
            DiagnosticKind::ExtractionAnomaly | DiagnosticKind::TraceLogFailure => {
                tracing::warn!(kind = %event.kind, "{}", event.content)
            }
            DiagnosticKind::HallucinationFlag | DiagnosticKind::StaleSource => {
                tracing::info!(kind = %event.kind, "{}", event.content)
            }
            DiagnosticKind::VerificationComplete => {
                tracing::debug!(kind = %event.kind, "{}", event.content)
            }
        }
    }
}

/// Broadcast-based emitter.
pub struct BroadcastEmitter {
    sender: broadcast::Sender<DiagnosticEvent>,
}

impl BroadcastEmitter {
    /// Create new broadcast emitter with channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to diagnostic events.
    pub fn subscribe(&self) -> broadcast::Receiver<DiagnosticEvent> {
        self.sender.subscribe()
    }

    /// Get number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl DiagnosticEmitter for BroadcastEmitter {
    fn emit(&self, event: DiagnosticEvent) {
        // No subscribers is not an error.
        let _ = self.sender.send(event);
    }
}

/// Collecting emitter that stores events in a Vec.
#[derive(Debug, Default, Clone)]
pub struct CollectingEmitter {
    events: Arc<RwLock<Vec<DiagnosticEvent>>>,
}

impl CollectingEmitter {
    /// Create new collecting emitter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get collected events.
    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events
            .read()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Get collected events of one kind.
    pub fn events_of(&self, kind: DiagnosticKind) -> Vec<DiagnosticEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.kind == kind)
            .collect()
    }

    /// Clear collected events.
    pub fn clear(&self) {
        if let Ok(mut events) = self.events.write() {
            events.clear();
        }
    }
}

impl DiagnosticEmitter for CollectingEmitter {
    fn emit(&self, event: DiagnosticEvent) {
        if let Ok(mut events) = self.events.write() {
            events.push(event);
        }
    }
}

/// Null emitter that discards all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEmitter;

impl DiagnosticEmitter for NullEmitter {
    fn emit(&self, _event: DiagnosticEvent) {}
}

/// Serialize a list of events as JSON lines.
pub fn export_events(events: &[DiagnosticEvent]) -> String {
    events
        .iter()
        .filter_map(|e| serde_json::to_string(e).ok())
        .collect::<Vec<_>>()
        .join("\n")
}
