use std::sync::Arc;

use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};

use super::input::{build_query, StrategyInput};
use super::optimizer::TabStrategies;
use super::tab::{build_prompt, Tab};
use crate::llm::Generator;
use crate::rag::{ContextAssembler, RagError, RetrievedChunk, Retriever};

/// Generated go-to-market plan, one text per tab.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub personas: String,
    pub messaging: String,
    pub channels: String,
    pub calendar: String,
    pub budget_kpis: String,
    /// Entities whose case studies informed the plan, in rank order.
    #[serde(default)]
    pub sources: Vec<String>,
}

impl Dashboard {
    pub fn get(&self, tab: Tab) -> &str {
        match tab {
            Tab::Personas => &self.personas,
            Tab::Messaging => &self.messaging,
            Tab::Channels => &self.channels,
            Tab::Calendar => &self.calendar,
            Tab::BudgetKpis => &self.budget_kpis,
        }
    }

    fn set(&mut self, tab: Tab, content: String) {
        match tab {
            Tab::Personas => self.personas = content,
            Tab::Messaging => self.messaging = content,
            Tab::Channels => self.channels = content,
            Tab::Calendar => self.calendar = content,
            Tab::BudgetKpis => self.budget_kpis = content,
        }
    }
}

/// Query → context → per-tab generation.
#[derive(Clone)]
pub struct StrategyService {
    retriever: Arc<Retriever>,
    assembler: ContextAssembler,
    generator: Arc<dyn Generator>,
    strategies: TabStrategies,
    top_k: usize,
}

impl StrategyService {
    pub fn new(
        retriever: Arc<Retriever>,
        assembler: ContextAssembler,
        generator: Arc<dyn Generator>,
        strategies: TabStrategies,
        top_k: usize,
    ) -> Self {
        Self {
            retriever,
            assembler,
            generator,
            strategies,
            top_k,
        }
    }

    pub fn retriever(&self) -> &Arc<Retriever> {
        &self.retriever
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Retrieve for `input`; an unavailable embedder yields no results.
    async fn retrieve_for(
        &self,
        input: &StrategyInput,
        top_k: usize,
    ) -> Result<Vec<RetrievedChunk>, RagError> {
        input.validate()?;
        let query = build_query(input);
        match self.retriever.retrieve(&query, top_k, None).await {
            Ok(results) => Ok(results),
            Err(RagError::CollaboratorUnavailable(reason)) => {
                tracing::warn!("Retrieval unavailable, continuing without context: {}", reason);
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Augmentation context for `input`, or an empty string when retrieval
    /// is unavailable.
    pub async fn augmentation_context(
        &self,
        input: &StrategyInput,
        top_k: Option<usize>,
    ) -> Result<String, RagError> {
        let results = self
            .retrieve_for(input, top_k.unwrap_or(self.top_k))
            .await?;
        Ok(self.assembler.assemble(&results))
    }

    async fn generate_tab(&self, context: &str, tab: Tab) -> Result<String, RagError> {
        let optimized = self.strategies.get(tab).optimize(context, tab).await;
        let prompt = build_prompt(&optimized, tab.instruction());
        let content = self.generator.complete(&prompt).await?;
        tracing::debug!("Generated tab {} ({} chars)", tab, content.chars().count());
        Ok(content)
    }

    /// Generate every tab concurrently. Any generator failure fails the dashboard.
    pub async fn generate_dashboard(&self, input: &StrategyInput) -> Result<Dashboard, RagError> {
        let results = self.retrieve_for(input, self.top_k).await?;
        let context = self.assembler.assemble(&results);
        tracing::info!(
            "Generating dashboard with {} retrieved chunks via {}",
            results.len(),
            self.generator.name()
        );

        let contents = try_join_all(Tab::ALL.iter().map(|tab| self.generate_tab(&context, *tab)))
            .await?;

        let mut dashboard = Dashboard {
            sources: ContextAssembler::sources(&results),
            ..Default::default()
        };
        for (tab, content) in Tab::ALL.into_iter().zip(contents) {
            dashboard.set(tab, content);
        }
        Ok(dashboard)
    }

    /// Re-run generation for one tab with a caller-supplied prompt.
    pub async fn regenerate_tab(&self, tab: Tab, prompt: &str) -> Result<String, RagError> {
        if prompt.trim().is_empty() {
            return Err(RagError::InvalidInput("prompt must not be empty".to_string()));
        }
        tracing::info!("Regenerating tab {}", tab);
        self.generator.complete(prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::rag::{
        Chunk, ChunkMetadata, DocStore, Embedder, HashingEmbedder, IndexBuilder, Section,
        VectorIndex,
    };
    use crate::strategy::{IdentityStrategy, TabStrategy};

    #[derive(Default)]
    struct RecordingGenerator {
        prompts: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl Generator for RecordingGenerator {
        fn name(&self) -> &str {
            "recording"
        }

        async fn complete(&self, prompt: &str) -> Result<String, RagError> {
            if self.fail {
                return Err(RagError::CollaboratorUnavailable("generator down".to_string()));
            }
            self.prompts.lock().unwrap().push(prompt.to_string());
            let task = prompt.rsplit("Task: ").next().unwrap_or_default();
            Ok(format!("out:{}", task))
        }
    }

    struct DownEmbedder;

    #[async_trait]
    impl Embedder for DownEmbedder {
        fn model(&self) -> &str {
            "down"
        }

        fn max_batch_size(&self) -> usize {
            8
        }

        async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
            Err(RagError::CollaboratorUnavailable("embedding backend down".to_string()))
        }
    }

    struct TaggingStrategy;

    #[async_trait]
    impl TabStrategy for TaggingStrategy {
        async fn optimize(&self, context: &str, tab: Tab) -> String {
            format!("{} #{}", context, tab)
        }
    }

    fn chunk(id: &str, name: &str, text: &str) -> Chunk {
        Chunk {
            id: id.to_string(),
            section: Section::Strategy,
            text: text.to_string(),
            metadata: ChunkMetadata {
                id: id.to_string(),
                section: Section::Strategy,
                startup_name: name.to_string(),
                industry: "General".to_string(),
                source: "corpus.csv".to_string(),
            },
        }
    }

    fn retriever(embedder: Arc<dyn Embedder>) -> Arc<Retriever> {
        let hashing = HashingEmbedder::new(16);
        let chunks = vec![
            chunk("foodly-strategy-0-0", "Foodly", "Meal kits sold through gyms."),
            chunk("routely-strategy-1-0", "Routely", "Route planning for couriers."),
        ];
        let embeddings = chunks.iter().map(|c| hashing.embed_one(&c.text)).collect();
        let (index, docstore) = IndexBuilder::build(chunks, embeddings).unwrap();
        Arc::new(Retriever::new(embedder, index, docstore, Duration::from_secs(1)).unwrap())
    }

    fn input() -> StrategyInput {
        StrategyInput {
            business_idea: "Meal kits".to_string(),
            target_audience: "Gyms".to_string(),
            value_proposition: "Healthy".to_string(),
            extracted_text: None,
        }
    }

    fn service(
        retriever: Arc<Retriever>,
        generator: Arc<RecordingGenerator>,
        strategies: TabStrategies,
    ) -> StrategyService {
        StrategyService::new(retriever, ContextAssembler::default(), generator, strategies, 1)
    }

    #[tokio::test]
    async fn dashboard_fills_every_tab_from_its_instruction() {
        let generator = Arc::new(RecordingGenerator::default());
        let service = service(
            retriever(Arc::new(HashingEmbedder::new(16))),
            generator.clone(),
            TabStrategies::default(),
        );

        let dashboard = service.generate_dashboard(&input()).await.unwrap();
        for tab in Tab::ALL {
            assert_eq!(dashboard.get(tab), format!("out:{}", tab.instruction()));
        }
        assert_eq!(dashboard.sources.len(), 1);

        let prompts = generator.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 5);
        assert!(prompts.iter().all(|p| p.contains("\n\nTask: ")));
    }

    #[tokio::test]
    async fn unavailable_embedder_degrades_to_empty_context() {
        let generator = Arc::new(RecordingGenerator::default());
        let service = service(
            retriever(Arc::new(DownEmbedder)),
            generator.clone(),
            TabStrategies::default(),
        );

        assert_eq!(service.augmentation_context(&input(), None).await.unwrap(), "");
        let dashboard = service.generate_dashboard(&input()).await.unwrap();
        assert!(dashboard.sources.is_empty());
        assert!(generator
            .prompts
            .lock()
            .unwrap()
            .iter()
            .all(|p| p.starts_with("Task: ")));
    }

    #[tokio::test]
    async fn per_tab_strategy_only_touches_its_tab() {
        let generator = Arc::new(RecordingGenerator::default());
        let strategies =
            TabStrategies::new(Arc::new(IdentityStrategy)).with(Tab::Calendar, Arc::new(TaggingStrategy));
        let service = service(
            retriever(Arc::new(HashingEmbedder::new(16))),
            generator.clone(),
            strategies,
        );

        service.generate_dashboard(&input()).await.unwrap();
        let prompts = generator.prompts.lock().unwrap();
        let tagged: Vec<&String> = prompts.iter().filter(|p| p.contains("#calendar")).collect();
        assert_eq!(tagged.len(), 1);
        assert!(tagged[0].ends_with(Tab::Calendar.instruction()));
    }

    #[tokio::test]
    async fn generator_failure_propagates() {
        let generator = Arc::new(RecordingGenerator {
            fail: true,
            ..Default::default()
        });
        let service = service(
            retriever(Arc::new(HashingEmbedder::new(16))),
            generator,
            TabStrategies::default(),
        );
        let err = service.generate_dashboard(&input()).await.unwrap_err();
        assert!(matches!(err, RagError::CollaboratorUnavailable(_)));
    }

    #[tokio::test]
    async fn empty_corpus_still_generates() {
        let generator = Arc::new(RecordingGenerator::default());
        let empty = Arc::new(
            Retriever::new(
                Arc::new(HashingEmbedder::new(16)),
                VectorIndex::empty(16),
                DocStore::default(),
                Duration::from_secs(1),
            )
            .unwrap(),
        );
        let service = service(empty, generator, TabStrategies::default());
        let dashboard = service.generate_dashboard(&input()).await.unwrap();
        assert_eq!(dashboard.personas, format!("out:{}", Tab::Personas.instruction()));
    }

    #[tokio::test]
    async fn regenerate_passes_prompt_through() {
        let generator = Arc::new(RecordingGenerator::default());
        let service = service(
            retriever(Arc::new(HashingEmbedder::new(16))),
            generator.clone(),
            TabStrategies::default(),
        );

        service.regenerate_tab(Tab::Messaging, "Task: shorter ads").await.unwrap();
        assert_eq!(generator.prompts.lock().unwrap().as_slice(), ["Task: shorter ads"]);
        assert!(matches!(
            service.regenerate_tab(Tab::Messaging, "  ").await,
            Err(RagError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn invalid_input_is_rejected_before_retrieval() {
        let service = service(
            retriever(Arc::new(HashingEmbedder::new(16))),
            Arc::new(RecordingGenerator::default()),
            TabStrategies::default(),
        );
        let mut bad = input();
        bad.business_idea.clear();
        assert!(matches!(
            service.augmentation_context(&bad, None).await,
            Err(RagError::InvalidInput(_))
        ));
    }
}
