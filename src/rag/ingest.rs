//! Batch ingestion: corpus → chunks → embeddings → published index.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use super::chunker::{self, normalize};
use super::classifier::EntityClassifier;
use super::corpus::{CorpusColumns, CorpusReader};
use super::dedup::Deduplicator;
use super::embedding::{embed_all, Embedder};
use super::error::RagError;
use super::index::IndexBuilder;
use super::persist::ArtifactStore;
use super::types::{Chunk, ChunkMetadata, Record};

/// Knobs for one ingestion run.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub max_chars: usize,
    pub batch_size: usize,
    pub columns: CorpusColumns,
    /// Provenance label written into every chunk's metadata.
    pub source_label: String,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            max_chars: 900,
            batch_size: 64,
            columns: CorpusColumns::default(),
            source_label: "corpus.csv".to_string(),
        }
    }
}

/// Chunks after deduplication, plus how many were dropped.
#[derive(Debug)]
pub struct ChunkedCorpus {
    pub chunks: Vec<Chunk>,
    pub duplicates_dropped: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub records: usize,
    pub chunks: usize,
    pub duplicates_dropped: usize,
    pub dimension: usize,
    pub embedding_model: String,
    pub generation: String,
}

pub struct Ingestor {
    embedder: Arc<dyn Embedder>,
    classifier: Arc<dyn EntityClassifier>,
    options: IngestOptions,
}

impl Ingestor {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        classifier: Arc<dyn EntityClassifier>,
        options: IngestOptions,
    ) -> Self {
        Self {
            embedder,
            classifier,
            options,
        }
    }

    /// Split records into deduplicated chunks, in record/section/sequence order.
    pub fn chunk_records(&self, records: &[Record]) -> ChunkedCorpus {
        let mut dedup = Deduplicator::new();
        let mut chunks = Vec::new();

        for record in records {
            let opportunity = record
                .section(super::types::Section::Opportunity)
                .map(normalize)
                .unwrap_or_default();
            let entity = self.classifier.classify(&opportunity);
            let slug = entity.name.to_lowercase();

            for (section, text) in &record.sections {
                for (seq, text) in chunker::chunk(text, self.options.max_chars)
                    .into_iter()
                    .enumerate()
                {
                    if !dedup.admit(&text) {
                        continue;
                    }
                    let id = format!("{}-{}-{}-{}", slug, section, record.row_id, seq);
                    chunks.push(Chunk {
                        id: id.clone(),
                        section: *section,
                        text,
                        metadata: ChunkMetadata {
                            id,
                            section: *section,
                            startup_name: entity.name.clone(),
                            industry: entity.category.clone(),
                            source: self.options.source_label.clone(),
                        },
                    });
                }
            }
        }

        if dedup.rejected() > 0 {
            tracing::info!("Dropped {} duplicate chunks", dedup.rejected());
        }
        ChunkedCorpus {
            chunks,
            duplicates_dropped: dedup.rejected(),
        }
    }

    /// Run the whole batch job. Nothing is published unless every step succeeds.
    pub async fn run(&self, source_csv: &Path, store: &ArtifactStore) -> Result<IngestReport, RagError> {
        let records = CorpusReader::new(self.options.columns.clone()).read(source_csv)?;
        tracing::info!("Read {} records from {}", records.len(), source_csv.display());
        self.ingest_records(&records, store).await
    }

    pub async fn ingest_records(
        &self,
        records: &[Record],
        store: &ArtifactStore,
    ) -> Result<IngestReport, RagError> {
        let ChunkedCorpus {
            chunks,
            duplicates_dropped,
        } = self.chunk_records(records);

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        tracing::info!(
            "Embedding {} chunks with {} (batch size {})",
            texts.len(),
            self.embedder.model(),
            self.options.batch_size
        );
        let embeddings = embed_all(self.embedder.as_ref(), &texts, self.options.batch_size).await?;

        let chunk_count = chunks.len();
        let (index, docstore) = IndexBuilder::build(chunks, embeddings)?;
        let generation = store.publish(&index, &docstore)?;

        Ok(IngestReport {
            records: records.len(),
            chunks: chunk_count,
            duplicates_dropped,
            dimension: index.dimension(),
            embedding_model: self.embedder.model().to_string(),
            generation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::classifier::KeywordClassifier;
    use crate::rag::embedding::HashingEmbedder;
    use crate::rag::types::Section;
    use async_trait::async_trait;

    fn record(row_id: usize, opportunity: &str, strategy: &str, learnings: &str) -> Record {
        Record {
            row_id,
            sections: vec![
                (Section::Opportunity, opportunity.to_string()),
                (Section::Strategy, strategy.to_string()),
                (Section::Learnings, learnings.to_string()),
            ],
        }
    }

    fn ingestor(embedder: Arc<dyn Embedder>) -> Ingestor {
        Ingestor::new(
            embedder,
            Arc::new(KeywordClassifier::default()),
            IngestOptions::default(),
        )
    }

    struct DroppingEmbedder;

    #[async_trait]
    impl Embedder for DroppingEmbedder {
        fn model(&self) -> &str {
            "dropping"
        }

        fn max_batch_size(&self) -> usize {
            64
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
            Ok(texts.iter().skip(1).map(|_| vec![1.0, 0.0]).collect())
        }
    }

    #[test]
    fn chunk_ids_and_metadata_follow_record() {
        let ingestor = ingestor(Arc::new(HashingEmbedder::new(8)));
        let corpus = ingestor.chunk_records(&[record(
            3,
            "Foodly   ships  food kits.",
            "Partner with gyms.",
            "Gyms churned.",
        )]);

        assert_eq!(corpus.chunks.len(), 3);
        let first = &corpus.chunks[0];
        assert_eq!(first.id, "foodly-opportunity-3-0");
        assert_eq!(first.text, "Foodly ships food kits.");
        assert_eq!(first.metadata.startup_name, "Foodly");
        assert_eq!(first.metadata.industry, "FoodTech");
        assert_eq!(first.metadata.source, "corpus.csv");
        assert_eq!(corpus.chunks[2].id, "foodly-learnings-3-0");
    }

    #[test]
    fn duplicate_texts_are_dropped_across_records() {
        let ingestor = ingestor(Arc::new(HashingEmbedder::new(8)));
        let corpus = ingestor.chunk_records(&[
            record(0, "A", "B", ""),
            record(1, "A", "", ""),
        ]);

        let texts: Vec<&str> = corpus.chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["A", "B"]);
        assert_eq!(corpus.duplicates_dropped, 1);
    }

    #[tokio::test]
    async fn ingest_publishes_aligned_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let ingestor = ingestor(Arc::new(HashingEmbedder::new(32)));

        let report = ingestor
            .ingest_records(
                &[record(0, "Routely optimizes delivery routes.", "Cold email.", "Slow sales.")],
                &store,
            )
            .await
            .unwrap();

        assert_eq!(report.chunks, 3);
        assert_eq!(report.dimension, 32);
        let loaded = store.load().unwrap();
        assert_eq!(loaded.generation, report.generation);
        assert_eq!(loaded.index.len(), 3);
        assert_eq!(loaded.docstore.metas()[0].industry, "Logistics SaaS");
    }

    #[tokio::test]
    async fn embedding_shortfall_aborts_without_publishing() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let ingestor = ingestor(Arc::new(DroppingEmbedder));

        let err = ingestor
            .ingest_records(&[record(0, "One. Two.", "Three.", "Four. Five.")], &store)
            .await
            .unwrap_err();

        assert!(matches!(err, RagError::ShapeMismatch { .. }));
        assert!(store.current_generation().unwrap().is_none());
        assert!(!dir.path().join("generations").exists());
    }
}
