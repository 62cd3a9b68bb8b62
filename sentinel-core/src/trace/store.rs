//! SQLite-backed trace store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::grounding::GroundingMetadata;

use super::schema::{initialize_schema, is_initialized};
use super::types::{AgentTrace, TraceStats};
use super::TraceLogger;

const SELECT_COLUMNS: &str =
    "SELECT id, session_id, timestamp, prompt, response_text, grounding_metadata, is_hallucinated
     FROM agent_traces";

/// SQLite-backed trace store.
///
/// Cloning shares the underlying connection.
#[derive(Clone)]
pub struct SqliteTraceStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteTraceStore {
    /// Open or create a trace store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| Error::trace_storage(e.to_string()))?;

        if !is_initialized(&conn) {
            initialize_schema(&conn).map_err(|e| Error::trace_storage(e.to_string()))?;
        }

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create an in-memory store (for testing).
    pub fn in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| Error::trace_storage(e.to_string()))?;
        initialize_schema(&conn).map_err(|e| Error::trace_storage(e.to_string()))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| Error::Internal(format!("Failed to lock connection: {}", e)))?;
        f(&conn).map_err(|e| Error::trace_storage(e.to_string()))
    }

    /// Insert a trace and return its assigned id.
    pub fn record(&self, trace: &AgentTrace) -> Result<i64> {
        let metadata = serde_json::to_string(&trace.grounding_metadata)?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO agent_traces (
                    session_id, timestamp, prompt, response_text, grounding_metadata, is_hallucinated
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    trace.session_id,
                    trace.timestamp.to_rfc3339(),
                    trace.prompt,
                    trace.response_text,
                    metadata,
                    trace.is_hallucinated,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Get a trace by id.
    pub fn get(&self, id: i64) -> Result<Option<AgentTrace>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("{} WHERE id = ?1", SELECT_COLUMNS),
                params![id],
                Self::row_to_trace,
            )
            .optional()
        })
    }

    /// All traces of a session, oldest first.
    pub fn traces_for_session(&self, session_id: &str) -> Result<Vec<AgentTrace>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{} WHERE session_id = ?1 ORDER BY id ASC",
                SELECT_COLUMNS
            ))?;
            let rows = stmt.query_map(params![session_id], Self::row_to_trace)?;
            rows.collect()
        })
    }

    /// The most recent traces, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<AgentTrace>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("{} ORDER BY id DESC LIMIT ?1", SELECT_COLUMNS))?;
            let rows = stmt.query_map(params![limit as i64], Self::row_to_trace)?;
            rows.collect()
        })
    }

    /// Delete every trace of a session. Returns the number removed.
    pub fn delete_session(&self, session_id: &str) -> Result<usize> {
        self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM agent_traces WHERE session_id = ?1",
                params![session_id],
            )
        })
    }

    /// Get store statistics.
    pub fn stats(&self) -> Result<TraceStats> {
        self.with_conn(|conn| {
            let (total, hallucinated, sessions): (i64, i64, i64) = conn.query_row(
                "SELECT COUNT(*),
                        COALESCE(SUM(is_hallucinated), 0),
                        COUNT(DISTINCT session_id)
                 FROM agent_traces",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )?;

            Ok(TraceStats {
                total_traces: total as u64,
                hallucinated_traces: hallucinated as u64,
                sessions: sessions as u64,
            })
        })
    }

    fn row_to_trace(row: &rusqlite::Row) -> rusqlite::Result<AgentTrace> {
        let id: i64 = row.get(0)?;
        let raw_metadata: String = row.get(5)?;
        let metadata = serde_json::from_str::<GroundingMetadata>(&raw_metadata).unwrap_or_else(|e| {
            tracing::warn!(id, error = %e, "Corrupt grounding metadata in stored trace, using empty metadata");
            GroundingMetadata::default()
        });

        Ok(AgentTrace {
            id: Some(id),
            session_id: row.get(1)?,
            timestamp: parse_datetime(row.get(2)?),
            prompt: row.get(3)?,
            response_text: row.get(4)?,
            grounding_metadata: metadata,
            is_hallucinated: row.get(6)?,
        })
    }
}

#[async_trait]
impl TraceLogger for SqliteTraceStore {
    async fn log_trace(&self, trace: &AgentTrace) -> Result<()> {
        let store = self.clone();
        let trace = trace.clone();
        let id = tokio::task::spawn_blocking(move || store.record(&trace))
            .await
            .map_err(|e| Error::Internal(format!("trace store task failed: {}", e)))??;
        tracing::debug!(id, "Stored trace");
        Ok(())
    }
}

fn parse_datetime(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
