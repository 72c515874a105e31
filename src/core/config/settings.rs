//! Typed view over the merged YAML configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::defaults;
use crate::core::errors::ApiError;
use crate::rag::chunker::ChunkerConfig;
use crate::rag::classifier::{default_category_rules, CategoryRule};
use crate::rag::corpus::CorpusColumns;
use crate::rag::ContextBuilderConfig;
use crate::rag::IngestOptions;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    pub paths: PathSettings,
    pub corpus: CorpusSettings,
    pub chunking: ChunkerConfig,
    pub retrieval: RetrievalSettings,
    pub context: ContextBuilderConfig,
    pub embedding: EmbeddingSettings,
    pub generation: GenerationSettings,
    pub server: ServerSettings,
    pub classifier: ClassifierSettings,
}

impl RagSettings {
    pub fn from_config(config: &Value) -> Result<Self, ApiError> {
        serde_json::from_value(config.clone())
            .map_err(|e| ApiError::BadRequest(format!("Invalid config: {}", e)))
    }

    pub fn ingest_options(&self) -> IngestOptions {
        IngestOptions {
            max_chars: self.chunking.max_chars,
            batch_size: self.embedding.batch_size,
            columns: self.corpus.columns.clone(),
            source_label: self.corpus.source_label.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    pub source_csv: PathBuf,
    pub artifacts_dir: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            source_csv: PathBuf::from(defaults::SOURCE_CSV),
            artifacts_dir: PathBuf::from(defaults::ARTIFACTS_DIR),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusSettings {
    pub columns: CorpusColumns,
    pub source_label: String,
}

impl Default for CorpusSettings {
    fn default() -> Self {
        Self {
            columns: CorpusColumns::default(),
            source_label: defaults::SOURCE_LABEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub top_k: usize,
    pub query_timeout_ms: u64,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: defaults::RAG_TOP_K,
            query_timeout_ms: defaults::QUERY_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingProvider {
    /// OpenAI-compatible `/v1/embeddings` endpoint.
    Http,
    /// Local feature-hashing embedder; no backend required.
    Hashing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub provider: EmbeddingProvider,
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub batch_size: usize,
    pub timeout_secs: u64,
    pub hashing_dimension: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::Http,
            base_url: defaults::EMBEDDING_BASE_URL.to_string(),
            model: defaults::EMBEDDING_MODEL.to_string(),
            api_key: None,
            batch_size: defaults::EMBEDDING_BATCH_SIZE,
            timeout_secs: defaults::EMBEDDING_TIMEOUT_SECS,
            hashing_dimension: defaults::HASHING_DIMENSION,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub max_tokens: u32,
    pub temperature: Option<f64>,
    pub timeout_secs: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            base_url: defaults::GENERATION_BASE_URL.to_string(),
            model: defaults::GENERATION_MODEL.to_string(),
            api_key: None,
            max_tokens: defaults::GENERATION_MAX_TOKENS,
            temperature: None,
            timeout_secs: defaults::GENERATION_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: Option<u16>,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: defaults::SERVER_HOST.to_string(),
            port: None,
            cors_allowed_origins: defaults::local_origins(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierSettings {
    pub rules: Vec<CategoryRule>,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            rules: default_category_rules(),
        }
    }
}
