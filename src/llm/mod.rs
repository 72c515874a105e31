pub mod openai_compat;
pub mod provider;
pub mod types;

use std::sync::Arc;

use crate::core::config::settings::EmbeddingSettings;
use crate::core::config::EmbeddingProvider;
use crate::rag::{Embedder, HashingEmbedder, RagError};

pub use openai_compat::{ChatCompletionGenerator, HttpEmbedder};
pub use provider::Generator;
pub use types::{ChatMessage, ChatRequest};

/// Embedder selected by `embedding.provider`.
pub fn embedder_from_settings(settings: &EmbeddingSettings) -> Result<Arc<dyn Embedder>, RagError> {
    match settings.provider {
        EmbeddingProvider::Http => Ok(Arc::new(HttpEmbedder::new(settings)?)),
        EmbeddingProvider::Hashing => Ok(Arc::new(HashingEmbedder::new(settings.hashing_dimension))),
    }
}
