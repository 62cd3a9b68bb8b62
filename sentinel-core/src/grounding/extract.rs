//! Grounding metadata extraction.
//!
//! Walks the raw response tree and normalizes whatever grounding evidence is
//! present. Absent nodes contribute nothing and traversal moves on to the
//! next sibling. The first malformed node ends the walk; everything read up
//! to that point is kept and the anomaly goes to the diagnostic channel.

use std::sync::Arc;

use crate::diagnostics::{DiagnosticEmitter, DiagnosticEvent, TracingEmitter};
use crate::llm::{Branch, RawGroundingChunk, RawGroundingSupport, RawModelResponse};

use super::types::{GroundingChunk, GroundingMetadata, GroundingSupport};

/// A node with an unexpected shape, located by its path in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionAnomaly {
    pub path: String,
    pub reason: String,
}

/// Outcome of a single extraction pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    /// Everything extracted before traversal ended.
    pub metadata: GroundingMetadata,
    /// Why traversal ended early, if it did.
    pub anomaly: Option<ExtractionAnomaly>,
}

impl Extraction {
    pub fn is_complete(&self) -> bool {
        self.anomaly.is_none()
    }
}

type Walk<T> = std::result::Result<T, ExtractionAnomaly>;

fn branch<'a, T>(node: &'a Branch<T>, path: impl FnOnce() -> String) -> Walk<Option<&'a T>> {
    node.get().map_err(|reason| ExtractionAnomaly {
        path: path(),
        reason: reason.to_string(),
    })
}

/// Extract grounding metadata, reporting any anomaly alongside the partial
/// result. Never fails.
pub fn extract_partial(response: &RawModelResponse) -> Extraction {
    let mut metadata = GroundingMetadata::default();
    let anomaly = walk(response, &mut metadata).err();
    Extraction { metadata, anomaly }
}

fn walk(response: &RawModelResponse, metadata: &mut GroundingMetadata) -> Walk<()> {
    let Some(candidates) = branch(&response.candidates, || "candidates".into())? else {
        return Ok(());
    };
    let Some(first) = candidates.first() else {
        return Ok(());
    };
    let Some(candidate) = branch(first, || "candidates[0]".into())? else {
        return Ok(());
    };
    let Some(gm) = branch(&candidate.grounding_metadata, || {
        "candidates[0].groundingMetadata".into()
    })?
    else {
        return Ok(());
    };

    const ROOT: &str = "candidates[0].groundingMetadata";

    if let Some(entry_point) = branch(&gm.search_entry_point, || format!("{ROOT}.searchEntryPoint"))? {
        if let Some(rendered) = branch(&entry_point.rendered_content, || {
            format!("{ROOT}.searchEntryPoint.renderedContent")
        })? {
            metadata.search_queries.push(rendered.clone());
        }
    }

    if let Some(chunks) = branch(&gm.grounding_chunks, || format!("{ROOT}.groundingChunks"))? {
        for (i, chunk) in chunks.iter().enumerate() {
            let path = || format!("{ROOT}.groundingChunks[{i}]");
            let chunk = match branch(chunk, path)? {
                Some(chunk) => normalize_chunk(chunk, path)?,
                None => GroundingChunk::default(),
            };
            metadata.grounding_chunks.push(chunk);
        }
    }

    if let Some(supports) = branch(&gm.grounding_supports, || format!("{ROOT}.groundingSupports"))? {
        for (i, support) in supports.iter().enumerate() {
            let path = || format!("{ROOT}.groundingSupports[{i}]");
            let support = match branch(support, path)? {
                Some(support) => normalize_support(support, path)?,
                None => GroundingSupport::default(),
            };
            metadata.grounding_supports.push(support);
        }
    }

    Ok(())
}

fn normalize_chunk(chunk: &RawGroundingChunk, path: impl Fn() -> String) -> Walk<GroundingChunk> {
    let Some(web) = branch(&chunk.web, || format!("{}.web", path()))? else {
        return Ok(GroundingChunk::default());
    };
    Ok(GroundingChunk {
        uri: branch(&web.uri, || format!("{}.web.uri", path()))?.cloned(),
        title: branch(&web.title, || format!("{}.web.title", path()))?.cloned(),
    })
}

fn normalize_support(
    support: &RawGroundingSupport,
    path: impl Fn() -> String,
) -> Walk<GroundingSupport> {
    let segment_text = match branch(&support.segment, || format!("{}.segment", path()))? {
        Some(segment) => branch(&segment.text, || format!("{}.segment.text", path()))?.cloned(),
        None => None,
    };
    let grounding_chunk_indices = branch(&support.grounding_chunk_indices, || {
        format!("{}.groundingChunkIndices", path())
    })?
    .cloned()
    .unwrap_or_default();
    let confidence_scores = branch(&support.confidence_scores, || {
        format!("{}.confidenceScores", path())
    })?
    .cloned()
    .unwrap_or_default();

    Ok(GroundingSupport {
        segment_text,
        grounding_chunk_indices,
        confidence_scores,
    })
}

/// Extractor that reports anomalies to a diagnostic emitter.
pub struct MetadataExtractor {
    emitter: Arc<dyn DiagnosticEmitter>,
}

impl Default for MetadataExtractor {
    fn default() -> Self {
        Self::new(Arc::new(TracingEmitter))
    }
}

impl MetadataExtractor {
    pub fn new(emitter: Arc<dyn DiagnosticEmitter>) -> Self {
        Self { emitter }
    }

    /// Extract grounding metadata from a response. Never fails.
    pub fn extract(&self, response: &RawModelResponse) -> GroundingMetadata {
        let Extraction { metadata, anomaly } = extract_partial(response);
        if let Some(anomaly) = anomaly {
            self.emitter
                .emit(DiagnosticEvent::extraction_anomaly(anomaly.path, anomaly.reason));
        }
        metadata
    }
}
