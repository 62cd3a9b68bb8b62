//! Confidence scoring from grounding quality.
//!
//! Scoring factors:
//! - Has grounding chunks: +0.4
//! - Has grounding supports (claim-to-source links): +0.4
//! - Number of sources, saturating at five: up to +0.2

use super::types::GroundingMetadata;

const CHUNK_WEIGHT: f64 = 0.4;
const SUPPORT_WEIGHT: f64 = 0.4;
const SOURCE_BONUS_WEIGHT: f64 = 0.2;
const SOURCE_SATURATION: f64 = 5.0;

/// Round to two decimal places.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Confidence in [0, 1], two decimal places.
pub fn confidence_score(metadata: &GroundingMetadata) -> f64 {
    let chunks = metadata.chunk_count();
    let mut score = 0.0;

    if chunks > 0 {
        score += CHUNK_WEIGHT;
    }
    if metadata.support_count() > 0 {
        score += SUPPORT_WEIGHT;
    }
    score += (chunks as f64 / SOURCE_SATURATION).min(1.0) * SOURCE_BONUS_WEIGHT;

    round2(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grounding::types::{GroundingChunk, GroundingSupport};

    fn with_counts(chunks: usize, supports: usize) -> GroundingMetadata {
        GroundingMetadata {
            search_queries: Vec::new(),
            grounding_chunks: vec![GroundingChunk::new("https://s.example"); chunks],
            grounding_supports: vec![GroundingSupport::new("claim").with_chunk(0, 0.9); supports],
        }
    }

    #[test]
    fn test_empty_metadata_scores_zero() {
        assert_eq!(confidence_score(&GroundingMetadata::default()), 0.0);
    }

    #[test]
    fn test_single_source_with_support() {
        assert_eq!(confidence_score(&with_counts(1, 1)), 0.84);
    }

    #[test]
    fn test_score_table() {
        assert_eq!(confidence_score(&with_counts(1, 0)), 0.44);
        assert_eq!(confidence_score(&with_counts(2, 0)), 0.48);
        assert_eq!(confidence_score(&with_counts(3, 1)), 0.92);
        assert_eq!(confidence_score(&with_counts(0, 2)), 0.4);
    }

    #[test]
    fn test_saturates_at_five_sources() {
        assert_eq!(confidence_score(&with_counts(5, 1)), 1.0);
        assert_eq!(confidence_score(&with_counts(12, 3)), 1.0);
        assert_eq!(confidence_score(&with_counts(9, 0)), 0.6);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(0.4 + 0.04), 0.44);
        assert_eq!(round2(0.123_456), 0.12);
    }
}
