//! Normalized grounding records and the verification verdict.

use serde::{Deserialize, Serialize};

/// Warning attached to answers that carry no claim-to-source links but were
/// not flagged as hallucinated.
pub const UNVERIFIED_WARNING: &str = "⚠️ Unverified Data - No grounding supports";

/// One retrieved source.
///
/// Position in [`GroundingMetadata::grounding_chunks`] is significant:
/// citations and supports refer to chunks by index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingChunk {
    pub uri: Option<String>,
    pub title: Option<String>,
}

impl GroundingChunk {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: Some(uri.into()),
            title: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// URI and title joined by a space, missing parts left empty.
    pub fn date_text(&self) -> String {
        format!(
            "{} {}",
            self.uri.as_deref().unwrap_or(""),
            self.title.as_deref().unwrap_or("")
        )
    }
}

/// Binds a span of the answer to the chunks that evidence it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroundingSupport {
    pub segment_text: Option<String>,
    /// Indices into the chunk list; consumers bounds-check.
    pub grounding_chunk_indices: Vec<i64>,
    pub confidence_scores: Vec<f64>,
}

impl GroundingSupport {
    pub fn new(segment_text: impl Into<String>) -> Self {
        Self {
            segment_text: Some(segment_text.into()),
            ..Self::default()
        }
    }

    /// Add a chunk reference with its confidence.
    pub fn with_chunk(mut self, index: i64, confidence: f64) -> Self {
        self.grounding_chunk_indices.push(index);
        self.confidence_scores.push(confidence);
        self
    }
}

/// Grounding evidence extracted from a model response.
///
/// Every field is always populated, possibly empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroundingMetadata {
    #[serde(default)]
    pub search_queries: Vec<String>,
    #[serde(default)]
    pub grounding_chunks: Vec<GroundingChunk>,
    #[serde(default)]
    pub grounding_supports: Vec<GroundingSupport>,
}

impl GroundingMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chunk(mut self, chunk: GroundingChunk) -> Self {
        self.grounding_chunks.push(chunk);
        self
    }

    pub fn with_support(mut self, support: GroundingSupport) -> Self {
        self.grounding_supports.push(support);
        self
    }

    pub fn with_search_query(mut self, query: impl Into<String>) -> Self {
        self.search_queries.push(query.into());
        self
    }

    pub fn chunk_count(&self) -> usize {
        self.grounding_chunks.len()
    }

    pub fn support_count(&self) -> usize {
        self.grounding_supports.len()
    }

    /// Support indices that do not name an existing chunk.
    pub fn dangling_support_indices(&self) -> Vec<i64> {
        let count = self.chunk_count() as i64;
        self.grounding_supports
            .iter()
            .flat_map(|s| s.grounding_chunk_indices.iter().copied())
            .filter(|&i| i < 0 || i >= count)
            .collect()
    }
}

/// Verdict for one grounded answer.
///
/// Serializes to the shape returned to callers: the answer text goes out as
/// `response`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    #[serde(rename = "response")]
    pub response_text: String,
    pub grounding_metadata: GroundingMetadata,
    pub is_hallucinated: bool,
    pub is_stale: bool,
    pub sources_count: usize,
    /// In [0, 1], two decimal places.
    pub confidence_score: f64,
    pub warning: Option<String>,
}

impl VerificationResult {
    /// Verified: sources and support links present, nothing flagged.
    pub fn is_verified(&self) -> bool {
        !self.is_hallucinated && self.warning.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_date_text_with_missing_parts() {
        assert_eq!(GroundingChunk::new("https://a.b/c").date_text(), "https://a.b/c ");
        assert_eq!(
            GroundingChunk::default().with_title("Report").date_text(),
            " Report"
        );
    }

    #[test]
    fn test_dangling_support_indices() {
        let metadata = GroundingMetadata::new()
            .with_chunk(GroundingChunk::new("https://a"))
            .with_support(GroundingSupport::new("x").with_chunk(0, 0.9).with_chunk(3, 0.4))
            .with_support(GroundingSupport::new("y").with_chunk(-1, 0.2));
        assert_eq!(metadata.dangling_support_indices(), vec![3, -1]);
    }

    #[test]
    fn test_metadata_defaults_on_deserialize() {
        let metadata: GroundingMetadata = serde_json::from_value(json!({})).unwrap();
        assert_eq!(metadata, GroundingMetadata::default());
    }

    #[test]
    fn test_result_wire_shape() {
        let result = VerificationResult {
            response_text: "Paris.".to_string(),
            grounding_metadata: GroundingMetadata::default(),
            is_hallucinated: false,
            is_stale: false,
            sources_count: 0,
            confidence_score: 0.0,
            warning: Some(UNVERIFIED_WARNING.to_string()),
        };

        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "response": "Paris.",
                "grounding_metadata": {
                    "search_queries": [],
                    "grounding_chunks": [],
                    "grounding_supports": []
                },
                "is_hallucinated": false,
                "is_stale": false,
                "sources_count": 0,
                "confidence_score": 0.0,
                "warning": "⚠️ Unverified Data - No grounding supports"
            })
        );
        assert!(!result.is_verified());
    }
}
