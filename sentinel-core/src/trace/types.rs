//! Trace records handed to the logging collaborator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::grounding::{GroundingMetadata, VerificationResult};

/// One verified exchange: the prompt, the answer, its grounding and verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentTrace {
    /// Assigned by the store; never sent over the wire.
    #[serde(default, skip_serializing)]
    pub id: Option<i64>,
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub prompt: String,
    pub response_text: String,
    /// Where the model got its information.
    #[serde(default)]
    pub grounding_metadata: GroundingMetadata,
    #[serde(default)]
    pub is_hallucinated: bool,
}

impl AgentTrace {
    /// Build a trace for a verification result, stamped now.
    pub fn from_result(
        session_id: impl Into<String>,
        prompt: impl Into<String>,
        result: &VerificationResult,
    ) -> Self {
        Self {
            id: None,
            session_id: session_id.into(),
            timestamp: Utc::now(),
            prompt: prompt.into(),
            response_text: result.response_text.clone(),
            grounding_metadata: result.grounding_metadata.clone(),
            is_hallucinated: result.is_hallucinated,
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Aggregate counts over stored traces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceStats {
    pub total_traces: u64,
    pub hallucinated_traces: u64,
    pub sessions: u64,
}

impl TraceStats {
    /// Fraction of traces flagged as hallucinated.
    pub fn hallucination_rate(&self) -> f64 {
        if self.total_traces == 0 {
            0.0
        } else {
            self.hallucinated_traces as f64 / self.total_traces as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grounding::GroundingChunk;
    use chrono::TimeZone;

    fn result() -> VerificationResult {
        VerificationResult {
            response_text: "Paris.".to_string(),
            grounding_metadata: GroundingMetadata::default()
                .with_chunk(GroundingChunk::new("https://en.wikipedia.org/wiki/Paris")),
            is_hallucinated: false,
            is_stale: false,
            sources_count: 1,
            confidence_score: 0.44,
            warning: None,
        }
    }

    #[test]
    fn test_wire_form_omits_id() {
        let ts = Utc.with_ymd_and_hms(2024, 6, 1, 8, 30, 0).unwrap();
        let mut trace = AgentTrace::from_result("s-1", "Capital of France?", &result()).with_timestamp(ts);
        trace.id = Some(7);

        let value = serde_json::to_value(&trace).unwrap();
        assert!(value.get("id").is_none());
        assert_eq!(value["session_id"], "s-1");
        assert_eq!(value["timestamp"], "2024-06-01T08:30:00Z");
        assert_eq!(value["response_text"], "Paris.");
        assert_eq!(value["is_hallucinated"], false);
        assert_eq!(
            value["grounding_metadata"]["grounding_chunks"][0]["uri"],
            "https://en.wikipedia.org/wiki/Paris"
        );
    }

    #[test]
    fn test_hallucination_rate() {
        assert_eq!(TraceStats::default().hallucination_rate(), 0.0);
        let stats = TraceStats {
            total_traces: 4,
            hallucinated_traces: 1,
            sessions: 2,
        };
        assert_eq!(stats.hallucination_rate(), 0.25);
    }
}
