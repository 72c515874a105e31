use async_trait::async_trait;

use crate::rag::RagError;

/// Text generation backend.
///
/// Failures surface as `RagError::CollaboratorUnavailable`.
#[async_trait]
pub trait Generator: Send + Sync {
    fn name(&self) -> &str;

    /// Complete a single prompt.
    async fn complete(&self, prompt: &str) -> Result<String, RagError>;
}
