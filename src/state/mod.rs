use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::core::config::{AppPaths, ConfigService, EmbeddingProvider, RagSettings};
use crate::llm::{embedder_from_settings, ChatCompletionGenerator, Generator};
use crate::rag::{ArtifactStore, ContextAssembler, RagError, Retriever};
use crate::strategy::{StrategyService, TabStrategies};

pub mod error;

use error::InitializationError;

/// Application state shared by every request handler.
///
/// Everything here is read-only after startup: the index is loaded once and
/// shared behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub config: ConfigService,
    pub settings: Arc<RagSettings>,
    /// Published artifact generation the retriever was loaded from.
    pub generation: String,
    pub retriever: Arc<Retriever>,
    pub strategy: StrategyService,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Build the state from config and the currently published index.
    ///
    /// Fails fast on a missing, corrupt or inconsistent index so the server
    /// never starts half-initialized.
    pub async fn initialize() -> Result<Arc<Self>, InitializationError> {
        let paths = Arc::new(AppPaths::new());
        Self::initialize_with(paths).await
    }

    pub async fn initialize_with(paths: Arc<AppPaths>) -> Result<Arc<Self>, InitializationError> {
        let config = ConfigService::new(paths.clone());
        let settings = config.settings().map_err(InitializationError::Config)?;

        let store = ArtifactStore::new(paths.resolve(&settings.paths.artifacts_dir));
        let artifacts = store.load().map_err(InitializationError::Artifacts)?;
        let generation = artifacts.generation.clone();

        if settings.embedding.provider == EmbeddingProvider::Hashing
            && !artifacts.index.is_empty()
            && artifacts.index.dimension() != settings.embedding.hashing_dimension
        {
            return Err(InitializationError::Embedder(RagError::ShapeMismatch {
                what: "hashing embedder dimension",
                expected: artifacts.index.dimension(),
                actual: settings.embedding.hashing_dimension,
            }));
        }

        let embedder =
            embedder_from_settings(&settings.embedding).map_err(InitializationError::Embedder)?;
        let retriever = Retriever::from_artifacts(
            embedder,
            artifacts,
            Duration::from_millis(settings.retrieval.query_timeout_ms),
        )
        .map_err(InitializationError::Artifacts)?;

        let generator: Arc<dyn Generator> = Arc::new(
            ChatCompletionGenerator::new(&settings.generation)
                .map_err(InitializationError::Generator)?,
        );

        tracing::info!(
            "Loaded index generation {} ({} chunks, dimension {}, embedder {})",
            generation,
            retriever.len(),
            retriever.dimension(),
            retriever.embedder_model()
        );

        Ok(Self::from_parts(
            paths,
            config,
            settings,
            generation,
            Arc::new(retriever),
            generator,
        ))
    }

    /// Assemble state from already-built collaborators.
    pub fn from_parts(
        paths: Arc<AppPaths>,
        config: ConfigService,
        settings: RagSettings,
        generation: String,
        retriever: Arc<Retriever>,
        generator: Arc<dyn Generator>,
    ) -> Arc<Self> {
        let strategy = StrategyService::new(
            retriever.clone(),
            ContextAssembler::new(settings.context.clone()),
            generator.clone(),
            TabStrategies::standard(generator),
            settings.retrieval.top_k,
        );

        Arc::new(AppState {
            paths,
            config,
            settings: Arc::new(settings),
            generation,
            retriever,
            strategy,
            started_at: Utc::now(),
        })
    }
}
