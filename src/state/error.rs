use thiserror::Error;

use crate::core::errors::ApiError;
use crate::rag::RagError;

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("Failed to load configuration: {0}")]
    Config(#[source] ApiError),

    #[error("Failed to load index artifacts: {0}")]
    Artifacts(#[source] RagError),

    #[error("Failed to initialize embedder: {0}")]
    Embedder(#[source] RagError),

    #[error("Failed to initialize generator: {0}")]
    Generator(#[source] RagError),
}
