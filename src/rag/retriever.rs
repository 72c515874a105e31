//! Exact top-k retrieval over a loaded index.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use super::embedding::Embedder;
use super::error::RagError;
use super::index::{DocStore, VectorIndex};
use super::persist::LoadedArtifacts;
use super::types::{RetrievedChunk, Section};

/// Read-only retriever shared by all requests.
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    index: VectorIndex,
    docstore: DocStore,
    query_timeout: Duration,
}

impl Retriever {
    /// Pair an index with its docstore, refusing mismatched sizes.
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: VectorIndex,
        docstore: DocStore,
        query_timeout: Duration,
    ) -> Result<Self, RagError> {
        if index.len() != docstore.len() {
            return Err(RagError::Consistency {
                index: index.len(),
                docstore: docstore.len(),
            });
        }
        Ok(Self {
            embedder,
            index,
            docstore,
            query_timeout,
        })
    }

    pub fn from_artifacts(
        embedder: Arc<dyn Embedder>,
        artifacts: LoadedArtifacts,
        query_timeout: Duration,
    ) -> Result<Self, RagError> {
        Self::new(embedder, artifacts.index, artifacts.docstore, query_timeout)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.index.dimension()
    }

    pub fn embedder_model(&self) -> &str {
        self.embedder.model()
    }

    /// Embed `query` and return its `top_k` nearest chunks.
    pub async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
        section_filter: Option<&HashSet<Section>>,
    ) -> Result<Vec<RetrievedChunk>, RagError> {
        validate_top_k(top_k)?;
        if self.index.is_empty() {
            return Ok(Vec::new());
        }

        let inputs = [query.to_string()];
        let embedded = tokio::time::timeout(self.query_timeout, self.embedder.embed_batch(&inputs))
            .await
            .map_err(|_| {
                RagError::CollaboratorUnavailable(format!(
                    "query embedding timed out after {} ms",
                    self.query_timeout.as_millis()
                ))
            })??;

        let query_vector = embedded.into_iter().next().ok_or(RagError::ShapeMismatch {
            what: "query embeddings",
            expected: 1,
            actual: 0,
        })?;

        self.retrieve_by_vector(&query_vector, top_k, section_filter)
    }

    /// Rank stored chunks against a precomputed unit query vector.
    ///
    /// Filtered-out sections never take a slot. Ties keep ingestion order.
    pub fn retrieve_by_vector(
        &self,
        query_vector: &[f32],
        top_k: usize,
        section_filter: Option<&HashSet<Section>>,
    ) -> Result<Vec<RetrievedChunk>, RagError> {
        validate_top_k(top_k)?;
        if self.index.is_empty() {
            return Ok(Vec::new());
        }

        let scores = self.index.scores(query_vector)?;
        let mut candidates: Vec<(usize, f32)> = scores
            .into_iter()
            .enumerate()
            .filter(|(position, _)| match section_filter {
                Some(filter) => self
                    .docstore
                    .get(*position)
                    .is_some_and(|(_, meta)| filter.contains(&meta.section)),
                None => true,
            })
            .map(|(position, score)| (position, score.clamp(-1.0, 1.0)))
            .collect();

        let by_rank = |a: &(usize, f32), b: &(usize, f32)| -> Ordering {
            b.1.total_cmp(&a.1).then(a.0.cmp(&b.0))
        };
        if candidates.len() > top_k {
            candidates.select_nth_unstable_by(top_k - 1, by_rank);
            candidates.truncate(top_k);
        }
        candidates.sort_by(by_rank);

        Ok(candidates
            .into_iter()
            .filter_map(|(position, score)| {
                let (text, meta) = self.docstore.get(position)?;
                Some(RetrievedChunk {
                    position,
                    text: text.to_string(),
                    metadata: meta.clone(),
                    score,
                })
            })
            .collect())
    }
}

fn validate_top_k(top_k: usize) -> Result<(), RagError> {
    if top_k == 0 {
        return Err(RagError::InvalidInput(
            "top_k must be a positive integer".to_string(),
        ));
    }
    Ok(())
}
