//! # sentinel-core
//!
//! Verification of search-grounded LLM answers: is the answer backed by the
//! sources retrieval found for it, are those sources fresh, and how much
//! should a caller trust it.
//!
//! ## Core Components
//!
//! - **Grounding**: metadata extraction, hallucination and staleness
//!   detection, confidence scoring
//! - **Orchestrator**: assembles a [`VerificationResult`] and dispatches traces
//! - **LLM**: the grounded model client
//! - **Trace**: trace logging collaborators and the SQLite trace store
//! - **Diagnostics**: structured, injectable event channel
//!
//! ## Example
//!
//! ```rust,ignore
//! use sentinel_core::{GroundingSentinel, SentinelConfig};
//!
//! let sentinel = GroundingSentinel::from_config(&SentinelConfig::from_env())?;
//! let result = sentinel
//!     .get_grounded_response("Who won the 2024 Tour de France?", "session-1")
//!     .await?;
//!
//! if result.is_hallucinated {
//!     println!("unsupported answer");
//! } else if let Some(warning) = &result.warning {
//!     println!("{}", warning);
//! }
//! println!("confidence: {:.2}", result.confidence_score);
//! ```

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod grounding;
pub mod llm;
pub mod orchestrator;
pub mod trace;

// Re-exports for convenience
pub use config::SentinelConfig;
pub use diagnostics::{
    BroadcastEmitter, CollectingEmitter, DiagnosticEmitter, DiagnosticEvent, DiagnosticKind,
    NullEmitter, TracingEmitter,
};
pub use error::{Error, Result};
pub use grounding::{
    confidence_score, detect_hallucination, extract_date, is_hallucinated, is_stale,
    GroundingChunk, GroundingMetadata, GroundingSupport, HallucinationSignal, MetadataExtractor,
    VerificationResult, UNVERIFIED_WARNING,
};
#[cfg(feature = "gemini")]
pub use llm::GeminiClient;
pub use llm::{ClientConfig, GroundedClient, RawModelResponse};
pub use orchestrator::GroundingSentinel;
pub use trace::{AgentTrace, HttpTraceLogger, NullTraceLogger, SqliteTraceStore, TraceLogger, TraceStats};
