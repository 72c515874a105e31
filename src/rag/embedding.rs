//! Embedder collaborator contract and batching helpers.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::error::RagError;
use crate::vector_math;

/// Maps strings to unit-normalized vectors.
///
/// Implementations must be deterministic for a fixed model so that query and
/// document vectors stay comparable.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Model identifier, recorded in logs and ingestion reports.
    fn model(&self) -> &str;

    /// Largest batch a single `embed_batch` call accepts.
    fn max_batch_size(&self) -> usize;

    /// One unit-length vector per input, same order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError>;
}

/// Embed any number of texts by splitting them into sub-batches.
pub async fn embed_all(
    embedder: &dyn Embedder,
    texts: &[String],
    batch_size: usize,
) -> Result<Vec<Vec<f32>>, RagError> {
    let batch_size = batch_size.min(embedder.max_batch_size()).max(1);
    let mut vectors = Vec::with_capacity(texts.len());

    for (batch_idx, batch) in texts.chunks(batch_size).enumerate() {
        let embedded = embedder.embed_batch(batch).await?;
        if embedded.len() != batch.len() {
            return Err(RagError::ShapeMismatch {
                what: "embeddings returned for batch",
                expected: batch.len(),
                actual: embedded.len(),
            });
        }
        tracing::debug!(
            "Embedded batch {} ({} texts) with {}",
            batch_idx,
            batch.len(),
            embedder.model()
        );
        vectors.extend(embedded);
    }

    Ok(vectors)
}

/// Offline embedder based on signed feature hashing of word tokens.
///
/// Texts sharing words land close together, which is enough for tests and
/// for running the pipeline without an embedding backend.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
    model: String,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
            model: format!("hashing-{}", dimension.max(1)),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dimension];
        let lowered = text.to_lowercase();
        let mut tokens = 0usize;

        for token in lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let digest = Sha256::digest(token.as_bytes());
            let bucket = u64::from_le_bytes([
                digest[0], digest[1], digest[2], digest[3], digest[4], digest[5], digest[6],
                digest[7],
            ]) as usize
                % self.dimension;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            v[bucket] += sign;
            tokens += 1;
        }

        // Texts without word tokens still need a unit vector.
        if tokens == 0 || vector_math::l2_normalize(&mut v).is_err() {
            v.iter_mut().for_each(|x| *x = 0.0);
            v[0] = 1.0;
        }
        v
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    fn model(&self) -> &str {
        &self.model
    }

    fn max_batch_size(&self) -> usize {
        usize::MAX
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}
