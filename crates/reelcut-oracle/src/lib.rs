//! Boundary to the external content-analysis oracle.
//!
//! The oracle is a black box that answers free-text prompts about an
//! indexed video and can summarize its highlights. The pipeline only
//! depends on the [`Oracle`] trait; [`TwelveLabsClient`] is the HTTP
//! implementation.

pub mod client;
pub mod error;
pub mod prompts;
pub mod types;

use async_trait::async_trait;

pub use client::{OracleConfig, TwelveLabsClient};
pub use error::{OracleError, OracleResult};
pub use types::{AssetRef, HighlightSummary};

/// Text-generation and summarization over an indexed video.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Ask a free-text question about the asset. The answer is raw text,
    /// usually (but not reliably) JSON.
    async fn generate_text(&self, asset: &AssetRef, prompt: &str) -> OracleResult<String>;

    /// The oracle's own generic highlight summary.
    async fn summarize_highlights(&self, asset: &AssetRef) -> OracleResult<Vec<HighlightSummary>>;
}
