//! Trace logging collaborators.
//!
//! Every verified exchange produces an [`AgentTrace`]. The orchestrator hands
//! it to a [`TraceLogger`] on a detached task; delivery failures surface only
//! on the diagnostic channel.
//!
//! - [`HttpTraceLogger`] posts traces to a logging service
//! - [`SqliteTraceStore`] persists them locally and answers history queries
//! - [`NullTraceLogger`] drops them

mod http;
mod schema;
mod store;
mod types;

use async_trait::async_trait;

use crate::error::Result;

pub use http::{HttpTraceLogger, DEFAULT_LOG_TIMEOUT_SECS};
pub use schema::SCHEMA_VERSION;
pub use store::SqliteTraceStore;
pub use types::{AgentTrace, TraceStats};

/// Receives traces of verified exchanges.
#[async_trait]
pub trait TraceLogger: Send + Sync {
    async fn log_trace(&self, trace: &AgentTrace) -> Result<()>;
}

/// Logger that discards every trace.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTraceLogger;

#[async_trait]
impl TraceLogger for NullTraceLogger {
    async fn log_trace(&self, _trace: &AgentTrace) -> Result<()> {
        Ok(())
    }
}
