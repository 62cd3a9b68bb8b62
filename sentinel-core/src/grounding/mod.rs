//! Grounding verification for search-grounded LLM answers.
//!
//! A grounded answer comes with the web sources retrieval found for it and
//! links from spans of the answer to those sources. This module judges how
//! well the answer is backed by that evidence. It does not judge whether the
//! answer is true.
//!
//! ## Pipeline
//!
//! 1. **Extract**: normalize the raw response tree into [`GroundingMetadata`]
//!    (never fails; anomalies go to the diagnostic channel)
//! 2. **Detect hallucination**: four ordered heuristics over the answer text
//!    and the metadata
//! 3. **Detect staleness**: mine dates from source URIs and titles and compare
//!    against a freshness threshold
//! 4. **Score confidence**: a deterministic [0, 1] score from source and
//!    support counts
//!
//! Steps 2-4 are pure functions of the extracted metadata and can run in any
//! order or concurrently.
//!
//! ## Example
//!
//! ```rust,ignore
//! use sentinel_core::grounding::{
//!     confidence_score, detect_hallucination, is_stale, MetadataExtractor,
//! };
//!
//! let metadata = MetadataExtractor::default().extract(&raw_response);
//! let text = raw_response.text();
//!
//! if let Some(signal) = detect_hallucination(&text, &metadata) {
//!     println!("flagged by {}: {}", signal.check_name(), signal);
//! }
//! println!("stale: {}", is_stale(&metadata, 180));
//! println!("confidence: {:.2}", confidence_score(&metadata));
//! ```

pub mod confidence;
pub mod dates;
pub mod extract;
pub mod hallucination;
pub mod staleness;
pub mod types;

#[cfg(test)]
mod proptest;

// Re-exports for convenience
pub use confidence::confidence_score;
pub use dates::{extract_date, extract_date_detailed, extract_date_from_source, DatePattern, ExtractedDate};
pub use extract::{extract_partial, Extraction, ExtractionAnomaly, MetadataExtractor};
pub use hallucination::{
    detect_hallucination, has_list_formatting, is_hallucinated, max_citation, HallucinationSignal,
    LONG_ANSWER_CHARS, SUBSTANTIVE_ANSWER_CHARS,
};
pub use staleness::{is_stale, is_stale_at, stale_sources_at, StaleSource, DEFAULT_STALE_THRESHOLD_DAYS};
pub use types::{
    GroundingChunk, GroundingMetadata, GroundingSupport, VerificationResult, UNVERIFIED_WARNING,
};
