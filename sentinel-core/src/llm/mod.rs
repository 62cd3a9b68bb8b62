//! Upstream model access.
//!
//! The verifier only needs one thing from a model provider: an answer to a
//! prompt, produced with web-search grounding, returned as the provider's
//! raw response tree. [`GroundedClient`] is that seam; [`GeminiClient`] is
//! the implementation against the Gemini REST API.
//!
//! ## Example
//!
//! ```rust,ignore
//! use sentinel_core::llm::{ClientConfig, GeminiClient, GroundedClient};
//!
//! let client = GeminiClient::new(ClientConfig::new("your-api-key"))?;
//! let response = client.generate_grounded("Who won the 2024 Tour de France?").await?;
//! println!("{}", response.text());
//! ```

mod client;
mod response;

pub(crate) use client::build_http_client;
pub use client::{ClientConfig, GroundedClient};
#[cfg(feature = "gemini")]
pub use client::GeminiClient;
pub use response::{
    Branch, RawCandidate, RawContent, RawGroundingChunk, RawGroundingMetadata,
    RawGroundingSupport, RawModelResponse, RawPart, RawSearchEntryPoint, RawSegment,
    RawWebSource,
};
