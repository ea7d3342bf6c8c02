//! Narrative generator interface

use super::error::GenerationError;
use async_trait::async_trait;

/// An opaque text-generation backend.
///
/// One network call per invocation; failures arrive pre-classified so the
/// retry and fallback layers never inspect transport detail.
#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    /// Generate text for `prompt` using the given model identifier
    async fn generate(&self, prompt: &str, model: &str) -> Result<String, GenerationError>;
}
