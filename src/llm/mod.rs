//! Local LLM access for organization extraction.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatClient;

use crate::error::Result;
use async_trait::async_trait;

/// Chat-completion provider seam.
///
/// Extraction is the only fallible call; health and model listing degrade to
/// `false`/empty so status endpoints never error on an unreachable provider.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send one user prompt and return the raw assistant text.
    async fn extract_json(&self, prompt: &str) -> Result<String>;

    /// Whether the provider answers at all.
    async fn health(&self) -> bool;

    /// Model identifiers the provider exposes.
    async fn models(&self) -> Vec<String>;

    /// The configured model.
    fn model_name(&self) -> &str;
}
