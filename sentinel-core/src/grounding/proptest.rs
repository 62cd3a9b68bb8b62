//! Property-based tests for the grounding pipeline using proptest.
//!
//! These tests check the invariants the rest of the crate relies on:
//!
//! - Confidence scores stay in [0, 1] with at most two decimals
//! - Extraction is total over arbitrary partial response trees
//! - Hallucination detection is deterministic and respects its thresholds

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde_json::{Map, Value};

    use crate::grounding::confidence::confidence_score;
    use crate::grounding::extract::extract_partial;
    use crate::grounding::hallucination::{detect_hallucination, has_list_formatting, max_citation};
    use crate::grounding::types::{GroundingChunk, GroundingMetadata, GroundingSupport};
    use crate::llm::RawModelResponse;

    fn metadata(chunks: usize, supports: usize) -> GroundingMetadata {
        GroundingMetadata {
            search_queries: Vec::new(),
            grounding_chunks: vec![GroundingChunk::new("https://s.example"); chunks],
            grounding_supports: vec![GroundingSupport::new("claim").with_chunk(0, 1.0); supports],
        }
    }

    // Keys drawn mostly from the real response schema so random trees hit
    // the branches the extractor reads.
    fn key() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("candidates".to_string()),
            Just("groundingMetadata".to_string()),
            Just("searchEntryPoint".to_string()),
            Just("renderedContent".to_string()),
            Just("groundingChunks".to_string()),
            Just("groundingSupports".to_string()),
            Just("web".to_string()),
            Just("uri".to_string()),
            Just("title".to_string()),
            Just("segment".to_string()),
            Just("text".to_string()),
            Just("groundingChunkIndices".to_string()),
            Just("confidenceScores".to_string()),
            "[a-z]{1,6}",
        ]
    }

    fn json_tree() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::from),
            any::<i64>().prop_map(Value::from),
            (-1.0f64..1.0).prop_map(Value::from),
            ".{0,12}".prop_map(Value::from),
        ];
        leaf.prop_recursive(6, 64, 5, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::vec((key(), inner), 0..5)
                    .prop_map(|entries| Value::Object(entries.into_iter().collect::<Map<_, _>>())),
            ]
        })
    }

    proptest! {
        /// Scores are bounded and carry at most two decimals.
        #[test]
        fn confidence_is_bounded_and_rounded(chunks in 0usize..40, supports in 0usize..10) {
            let score = confidence_score(&metadata(chunks, supports));
            prop_assert!((0.0..=1.0).contains(&score), "score {} out of range", score);
            let scaled = score * 100.0;
            prop_assert!((scaled - scaled.round()).abs() < 1e-9, "score {} has >2 decimals", score);
        }

        /// Five sources and a support always score full confidence.
        #[test]
        fn confidence_saturates(chunks in 5usize..40, supports in 1usize..10) {
            prop_assert_eq!(confidence_score(&metadata(chunks, supports)), 1.0);
        }

        /// Scores never decrease as sources are added.
        #[test]
        fn confidence_is_monotone_in_sources(chunks in 0usize..20, supports in 0usize..3) {
            let before = confidence_score(&metadata(chunks, supports));
            let after = confidence_score(&metadata(chunks + 1, supports));
            prop_assert!(after >= before);
        }

        /// Extraction returns for any tree under the candidate list.
        #[test]
        fn extraction_is_total(tree in json_tree()) {
            let mut root = Map::new();
            root.insert("candidates".to_string(), tree);
            let response = RawModelResponse::from_value(Value::Object(root)).unwrap();

            let extraction = extract_partial(&response);
            prop_assert!(extraction.metadata.search_queries.len() <= 1);
        }

        /// Extraction returns for any tree under grounding metadata.
        #[test]
        fn extraction_is_total_below_metadata(tree in json_tree()) {
            let mut candidate = Map::new();
            candidate.insert("groundingMetadata".to_string(), tree);
            let mut root = Map::new();
            root.insert(
                "candidates".to_string(),
                Value::Array(vec![Value::Object(candidate)]),
            );
            let response = RawModelResponse::from_value(Value::Object(root)).unwrap();

            let extraction = extract_partial(&response);
            if let Some(anomaly) = &extraction.anomaly {
                prop_assert!(anomaly.path.starts_with("candidates[0].groundingMetadata"));
            }
        }

        /// Identical inputs yield identical verdicts.
        #[test]
        fn detection_is_deterministic(text in ".{0,300}", chunks in 0usize..4, supports in 0usize..3) {
            let md = metadata(chunks, supports);
            prop_assert_eq!(detect_hallucination(&text, &md), detect_hallucination(&text, &md));
        }

        /// Short plain answers without citations are never flagged.
        #[test]
        fn short_plain_answers_pass(text in "[a-zA-Z ,]{0,50}") {
            prop_assert!(!has_list_formatting(&text));
            prop_assert_eq!(detect_hallucination(&text, &GroundingMetadata::default()), None);
        }

        /// With enough sources for every citation, only list/length checks
        /// can fire, and those need zero sources.
        #[test]
        fn cited_within_sources_passes(text in "[a-z \\[\\]0-9]{0,120}") {
            let needed = max_citation(&text).unwrap_or(0).max(1);
            prop_assume!(needed <= 1000);
            let md = metadata(needed as usize, 0);
            prop_assert_eq!(detect_hallucination(&text, &md), None);
        }
    }
}
