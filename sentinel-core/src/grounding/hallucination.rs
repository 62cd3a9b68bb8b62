//! Heuristic hallucination detection.
//!
//! Four checks run in a fixed order and the first one that trips decides:
//!
//! 1. **Ghost citation**: the answer cites `[n]` beyond the retrieved sources.
//! 2. **Empty receipt**: the answer itemizes (bullets or numbered lines) with
//!    no sources behind it.
//! 3. **Ungrounded long claim**: over 200 characters with no sources and no
//!    support links.
//! 4. **Bare substantive answer**: over 50 characters with no sources.
//!
//! Check 3 is subsumed by check 4 for every input that reaches it; both are
//! kept so the reported signal names the stronger finding.
//!
//! None of this verifies truth. It only asks whether the answer is backed by
//! the retrieval evidence it came with.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use super::types::GroundingMetadata;

static CITATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([0-9]+)\]").expect("invalid regex"));

static NUMBERED_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\d+\.").expect("invalid regex"));

static DASH_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^-").expect("invalid regex"));

/// Answers longer than this with no grounding at all are unsupported claims.
pub const LONG_ANSWER_CHARS: usize = 200;

/// Answers longer than this need at least one source.
pub const SUBSTANTIVE_ANSWER_CHARS: usize = 50;

/// The check that flagged an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum HallucinationSignal {
    /// Cited a source index that was never retrieved.
    GhostCitation { cited: u64, sources: usize },
    /// Itemized answer with zero sources.
    EmptyReceipt,
    /// Long answer with no sources and no supports.
    UngroundedLongClaim { chars: usize },
    /// Non-trivial answer with no sources.
    BareSubstantiveAnswer { chars: usize },
}

impl HallucinationSignal {
    /// Stable name of the check.
    pub fn check_name(&self) -> &'static str {
        match self {
            Self::GhostCitation { .. } => "ghost_citation",
            Self::EmptyReceipt => "empty_receipt",
            Self::UngroundedLongClaim { .. } => "ungrounded_long_claim",
            Self::BareSubstantiveAnswer { .. } => "bare_substantive_answer",
        }
    }
}

impl std::fmt::Display for HallucinationSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GhostCitation { cited, sources } => write!(
                f,
                "Ghost citation [{}] (only {} sources exist)",
                cited, sources
            ),
            Self::EmptyReceipt => write!(f, "Listed items with zero grounding chunks (Empty Receipt)"),
            Self::UngroundedLongClaim { chars } => write!(
                f,
                "Long response ({} chars) with no grounding supports",
                chars
            ),
            Self::BareSubstantiveAnswer { .. } => {
                write!(f, "Substantive answer with no grounding chunks")
            }
        }
    }
}

/// Highest `[n]` citation marker in the text.
///
/// Markers too large for `u64` saturate, since they exceed any source count.
pub fn max_citation(text: &str) -> Option<u64> {
    CITATION
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().parse::<u64>().unwrap_or(u64::MAX))
        .max()
}

/// Whether the text looks like a list: any `*`, or a line starting with a
/// number and a dot, or a line starting with `-`.
pub fn has_list_formatting(text: &str) -> bool {
    text.contains('*') || NUMBERED_LINE.is_match(text) || DASH_LINE.is_match(text)
}

/// Run the checks in order and report the first that trips.
pub fn detect_hallucination(
    response_text: &str,
    metadata: &GroundingMetadata,
) -> Option<HallucinationSignal> {
    let sources = metadata.chunk_count();
    let supports = metadata.support_count();
    let chars = response_text.chars().count();

    if let Some(cited) = max_citation(response_text) {
        if cited > sources as u64 {
            return Some(HallucinationSignal::GhostCitation { cited, sources });
        }
    }

    if sources == 0 && has_list_formatting(response_text) {
        return Some(HallucinationSignal::EmptyReceipt);
    }

    if chars > LONG_ANSWER_CHARS && supports == 0 && sources == 0 {
        return Some(HallucinationSignal::UngroundedLongClaim { chars });
    }

    if chars > SUBSTANTIVE_ANSWER_CHARS && sources == 0 {
        return Some(HallucinationSignal::BareSubstantiveAnswer { chars });
    }

    None
}

/// Whether the answer is unsupported by its grounding.
pub fn is_hallucinated(response_text: &str, metadata: &GroundingMetadata) -> bool {
    detect_hallucination(response_text, metadata).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grounding::types::{GroundingChunk, GroundingSupport};

    fn sources(n: usize) -> GroundingMetadata {
        GroundingMetadata {
            grounding_chunks: (0..n)
                .map(|i| GroundingChunk::new(format!("https://s{}.example", i)))
                .collect(),
            ..GroundingMetadata::default()
        }
    }

    #[test]
    fn test_grounded_answer_passes() {
        let md = sources(1).with_support(GroundingSupport::new("Paris").with_chunk(0, 0.95));
        assert_eq!(detect_hallucination("Paris is the capital of France.", &md), None);
    }

    #[test]
    fn test_ghost_citation() {
        let text = "The capital is Paris [1] and its population is 2M [2].";
        assert_eq!(
            detect_hallucination(text, &sources(1)),
            Some(HallucinationSignal::GhostCitation { cited: 2, sources: 1 })
        );
        assert!(!is_hallucinated(text, &sources(2)));
    }

    #[test]
    fn test_citation_zero_is_not_ghost() {
        // [0] never exceeds the source count.
        assert_eq!(detect_hallucination("See [0].", &GroundingMetadata::default()), None);
    }

    #[test]
    fn test_huge_citation_saturates() {
        assert_eq!(max_citation("x [99999999999999999999999] y [3]"), Some(u64::MAX));
        assert!(is_hallucinated("[99999999999999999999999]", &sources(5)));
    }

    #[test]
    fn test_empty_receipt() {
        let md = GroundingMetadata::default();
        assert_eq!(
            detect_hallucination("- Apples\n- Oranges\n- Pears", &md),
            Some(HallucinationSignal::EmptyReceipt)
        );
        assert_eq!(
            detect_hallucination("Steps:\n1. Mix\n2. Bake", &md),
            Some(HallucinationSignal::EmptyReceipt)
        );
        assert_eq!(
            detect_hallucination("a * b", &md),
            Some(HallucinationSignal::EmptyReceipt)
        );
        // Lists are fine when sources exist.
        assert_eq!(detect_hallucination("- Apples\n- Pears", &sources(1)), None);
    }

    #[test]
    fn test_list_formatting() {
        assert!(has_list_formatting("1. first"));
        assert!(has_list_formatting("intro\n12. twelfth"));
        assert!(has_list_formatting("**bold**"));
        assert!(!has_list_formatting("pre-war and 3.5 percent"));
        assert!(!has_list_formatting("version 1.2 shipped"));
    }

    #[test]
    fn test_ungrounded_long_claim() {
        let text = "a".repeat(201);
        assert_eq!(
            detect_hallucination(&text, &GroundingMetadata::default()),
            Some(HallucinationSignal::UngroundedLongClaim { chars: 201 })
        );

        // Supports without chunks skip check 3 but check 4 still fires.
        let md = GroundingMetadata::default().with_support(GroundingSupport::new("a"));
        assert_eq!(
            detect_hallucination(&text, &md),
            Some(HallucinationSignal::BareSubstantiveAnswer { chars: 201 })
        );
    }

    #[test]
    fn test_bare_substantive_answer() {
        let text = "The Eiffel Tower was completed in the spring of 1889.";
        assert!(text.chars().count() > 50);
        assert_eq!(
            detect_hallucination(text, &GroundingMetadata::default()),
            Some(HallucinationSignal::BareSubstantiveAnswer { chars: text.chars().count() })
        );
        assert_eq!(detect_hallucination(text, &sources(1)), None);
    }

    #[test]
    fn test_short_unsourced_answer_passes() {
        let text = "Paris is the capital city of the French.";
        assert_eq!(text.chars().count(), 40);
        assert_eq!(detect_hallucination(text, &GroundingMetadata::default()), None);
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        // 33 characters, 99 bytes.
        let text = "日本の首都は東京です。".repeat(3);
        assert_eq!(text.chars().count(), 33);
        assert!(!is_hallucinated(&text, &GroundingMetadata::default()));
    }

    #[test]
    fn test_signal_names() {
        assert_eq!(HallucinationSignal::EmptyReceipt.check_name(), "empty_receipt");
        let ghost = HallucinationSignal::GhostCitation { cited: 4, sources: 2 };
        assert_eq!(ghost.to_string(), "Ghost citation [4] (only 2 sources exist)");
        assert_eq!(
            serde_json::to_value(ghost).unwrap(),
            serde_json::json!({ "check": "ghost_citation", "cited": 4, "sources": 2 })
        );
    }
}
