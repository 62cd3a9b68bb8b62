//! Raw model response tree.
//!
//! Mirrors the Gemini `generateContent` response, restricted to the parts
//! the verifier reads. Every node is a [`Branch`], so a response that is
//! missing half its tree, or carries a wrong-typed node somewhere deep
//! inside, still deserializes. What is absent and what is malformed stays
//! visible in the types for the extractor to act on.

use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;

use crate::error::Result;

/// One node of an optional response tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Branch<T> {
    /// The node was not sent, or was `null`.
    Absent,
    /// The node was sent and has the expected shape.
    Present(T),
    /// The node was sent with an unexpected shape.
    Malformed(String),
}

impl<T> Default for Branch<T> {
    fn default() -> Self {
        Self::Absent
    }
}

impl<T> Branch<T> {
    /// The node's value, if present and well-formed.
    pub fn present(&self) -> Option<&T> {
        match self {
            Self::Present(value) => Some(value),
            _ => None,
        }
    }

    /// The node's value, treating a malformed node as an error.
    pub fn get(&self) -> std::result::Result<Option<&T>, &str> {
        match self {
            Self::Absent => Ok(None),
            Self::Present(value) => Ok(Some(value)),
            Self::Malformed(reason) => Err(reason),
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }
}

impl<T> From<Option<T>> for Branch<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Absent, Self::Present)
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Branch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        if value.is_null() {
            return Ok(Self::Absent);
        }
        Ok(match serde_json::from_value::<T>(value) {
            Ok(node) => Self::Present(node),
            Err(e) => Self::Malformed(e.to_string()),
        })
    }
}

/// The model's answer with its (possibly partial) grounding tree.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawModelResponse {
    /// Answer text, when the producer flattened it already.
    pub text: Branch<String>,
    pub candidates: Branch<Vec<Branch<RawCandidate>>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawCandidate {
    pub content: Branch<RawContent>,
    pub grounding_metadata: Branch<RawGroundingMetadata>,
    pub finish_reason: Branch<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawContent {
    pub parts: Branch<Vec<Branch<RawPart>>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawPart {
    pub text: Branch<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawGroundingMetadata {
    pub search_entry_point: Branch<RawSearchEntryPoint>,
    pub grounding_chunks: Branch<Vec<Branch<RawGroundingChunk>>>,
    pub grounding_supports: Branch<Vec<Branch<RawGroundingSupport>>>,
}

/// Google search entry for follow-up searches.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawSearchEntryPoint {
    /// HTML snippet rendering the search suggestions.
    pub rendered_content: Branch<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawGroundingChunk {
    pub web: Branch<RawWebSource>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawWebSource {
    pub uri: Branch<String>,
    pub title: Branch<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawGroundingSupport {
    pub segment: Branch<RawSegment>,
    /// Indices into the chunk list. Not guaranteed in bounds.
    pub grounding_chunk_indices: Branch<Vec<i64>>,
    pub confidence_scores: Branch<Vec<f64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawSegment {
    pub text: Branch<String>,
}

impl RawModelResponse {
    /// A response carrying only answer text and no grounding tree.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: Branch::Present(text.into()),
            candidates: Branch::Absent,
        }
    }

    /// Parse a response from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse a response from an already-decoded JSON value.
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// The first candidate, when it is present and well-formed.
    pub fn first_candidate(&self) -> Option<&RawCandidate> {
        self.candidates.present()?.first()?.present()
    }

    /// The answer text.
    ///
    /// Uses the flattened `text` node when present, otherwise joins the
    /// text parts of the first candidate. Missing or malformed nodes
    /// contribute nothing.
    pub fn text(&self) -> String {
        if let Some(text) = self.text.present() {
            return text.clone();
        }

        self.first_candidate()
            .and_then(|c| c.content.present())
            .and_then(|content| content.parts.present())
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p.present())
                    .filter_map(|p| p.text.present())
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_branch_states() {
        let response = RawModelResponse::from_value(json!({
            "candidates": [{
                "groundingMetadata": {
                    "groundingChunks": "not a list",
                    "searchEntryPoint": null
                }
            }]
        }))
        .unwrap();

        let gm = response
            .first_candidate()
            .and_then(|c| c.grounding_metadata.present())
            .unwrap();
        assert!(gm.grounding_chunks.is_malformed());
        assert!(gm.search_entry_point.is_absent());
        assert!(gm.grounding_supports.is_absent());
    }

    #[test]
    fn test_text_from_parts() {
        let response = RawModelResponse::from_value(json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{ "text": "Paris is " }, { "text": "the capital." }]
                }
            }]
        }))
        .unwrap();
        assert_eq!(response.text(), "Paris is the capital.");
    }

    #[test]
    fn test_flattened_text_wins() {
        let response = RawModelResponse::from_value(json!({
            "text": "flat",
            "candidates": [{ "content": { "parts": [{ "text": "nested" }] } }]
        }))
        .unwrap();
        assert_eq!(response.text(), "flat");
    }

    #[test]
    fn test_text_missing_everywhere() {
        let response = RawModelResponse::from_value(json!({ "candidates": [] })).unwrap();
        assert_eq!(response.text(), "");

        let response = RawModelResponse::from_value(json!({ "text": 42 })).unwrap();
        assert!(response.text.is_malformed());
        assert_eq!(response.text(), "");
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let response = RawModelResponse::from_json(
            r#"{"candidates":[{"finishReason":"STOP","safetyRatings":[]}],"usageMetadata":{}}"#,
        )
        .unwrap();
        let candidate = response.first_candidate().unwrap();
        assert_eq!(candidate.finish_reason.present().map(String::as_str), Some("STOP"));
    }

    #[test]
    fn test_from_json_rejects_non_json() {
        assert!(RawModelResponse::from_json("<html>").is_err());
    }
}
