//! Exact inner-product index and its index-aligned docstore.

use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use super::error::RagError;
use super::types::{Chunk, ChunkMetadata};
use crate::vector_math;

/// Row-major matrix of unit vectors; row `i` belongs to docstore entry `i`.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    vectors: Array2<f32>,
}

impl VectorIndex {
    pub fn empty(dimension: usize) -> Self {
        Self {
            vectors: Array2::zeros((0, dimension)),
        }
    }

    /// Wrap `count * dimension` row-major values.
    pub fn from_flat(dimension: usize, count: usize, values: Vec<f32>) -> Result<Self, RagError> {
        let expected = count.checked_mul(dimension).ok_or_else(|| {
            RagError::InvalidInput(format!("index shape {}x{} overflows", count, dimension))
        })?;
        if values.len() != expected {
            return Err(RagError::ShapeMismatch {
                what: "index values",
                expected,
                actual: values.len(),
            });
        }
        let vectors = Array2::from_shape_vec((count, dimension), values).map_err(|e| {
            RagError::InvalidInput(format!("invalid index shape: {}", e))
        })?;
        Ok(Self { vectors })
    }

    pub fn len(&self) -> usize {
        self.vectors.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dimension(&self) -> usize {
        self.vectors.ncols()
    }

    pub fn vector(&self, position: usize) -> Option<Vec<f32>> {
        (position < self.len()).then(|| self.vectors.row(position).to_vec())
    }

    /// Row-major iteration over every stored component.
    pub fn values(&self) -> impl Iterator<Item = f32> + '_ {
        self.vectors.iter().copied()
    }

    /// Inner product of `query` with every stored vector, in position order.
    pub fn scores(&self, query: &[f32]) -> Result<Vec<f32>, RagError> {
        if query.len() != self.dimension() {
            return Err(RagError::ShapeMismatch {
                what: "query dimension",
                expected: self.dimension(),
                actual: query.len(),
            });
        }
        let scores = self.vectors.dot(&ArrayView1::from(query));
        Ok(scores.iter().copied().collect())
    }
}

/// Chunk texts and metadata stored in parallel, aligned with [`VectorIndex`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocStore {
    texts: Vec<String>,
    metas: Vec<ChunkMetadata>,
}

impl DocStore {
    pub fn from_parts(texts: Vec<String>, metas: Vec<ChunkMetadata>) -> Result<Self, RagError> {
        if texts.len() != metas.len() {
            return Err(RagError::ShapeMismatch {
                what: "docstore metadata entries",
                expected: texts.len(),
                actual: metas.len(),
            });
        }
        Ok(Self { texts, metas })
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<(&str, &ChunkMetadata)> {
        Some((self.texts.get(position)?.as_str(), self.metas.get(position)?))
    }

    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    pub fn metas(&self) -> &[ChunkMetadata] {
        &self.metas
    }
}

pub struct IndexBuilder;

impl IndexBuilder {
    /// Build the index and docstore in input order.
    ///
    /// Every embedding is normalized on insertion. Nothing is written to disk.
    pub fn build(
        chunks: Vec<Chunk>,
        embeddings: Vec<Vec<f32>>,
    ) -> Result<(VectorIndex, DocStore), RagError> {
        if chunks.len() != embeddings.len() {
            return Err(RagError::ShapeMismatch {
                what: "embeddings for chunks",
                expected: chunks.len(),
                actual: embeddings.len(),
            });
        }

        let Some(dimension) = embeddings.first().map(Vec::len) else {
            return Ok((VectorIndex::empty(0), DocStore::default()));
        };
        if dimension == 0 {
            return Err(RagError::InvalidInput(
                "embeddings must have at least one dimension".to_string(),
            ));
        }

        let mut values = Vec::with_capacity(chunks.len() * dimension);
        for (position, mut embedding) in embeddings.into_iter().enumerate() {
            if embedding.len() != dimension {
                return Err(RagError::ShapeMismatch {
                    what: "embedding dimension",
                    expected: dimension,
                    actual: embedding.len(),
                });
            }
            vector_math::l2_normalize(&mut embedding).map_err(|e| {
                RagError::InvalidInput(format!("embedding {} unusable: {}", position, e))
            })?;
            values.extend(embedding);
        }

        let count = chunks.len();
        let mut texts = Vec::with_capacity(count);
        let mut metas = Vec::with_capacity(count);
        for chunk in chunks {
            if chunk.text.is_empty() {
                return Err(RagError::InvalidInput(format!("chunk {} has no text", chunk.id)));
            }
            texts.push(chunk.text);
            metas.push(chunk.metadata);
        }

        let index = VectorIndex::from_flat(dimension, count, values)?;
        let docstore = DocStore::from_parts(texts, metas)?;
        tracing::info!("Built index with {} vectors of dimension {}", count, dimension);
        Ok((index, docstore))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::types::Section;

    fn make_chunk(id: &str, text: &str) -> Chunk {
        Chunk {
            id: id.to_string(),
            section: Section::Strategy,
            text: text.to_string(),
            metadata: ChunkMetadata {
                id: id.to_string(),
                section: Section::Strategy,
                startup_name: "Acme".to_string(),
                industry: "General".to_string(),
                source: "test".to_string(),
            },
        }
    }

    #[test]
    fn build_rejects_count_mismatch() {
        let chunks = (0..5).map(|i| make_chunk(&i.to_string(), "text")).collect();
        let embeddings = vec![vec![1.0, 0.0]; 4];
        let err = IndexBuilder::build(chunks, embeddings).unwrap_err();
        assert!(matches!(err, RagError::ShapeMismatch { expected: 5, actual: 4, .. }));
    }

    #[test]
    fn build_rejects_ragged_dimensions() {
        let chunks = vec![make_chunk("a", "A"), make_chunk("b", "B")];
        let embeddings = vec![vec![1.0, 0.0], vec![1.0, 0.0, 0.0]];
        let err = IndexBuilder::build(chunks, embeddings).unwrap_err();
        assert!(matches!(err, RagError::ShapeMismatch { expected: 2, actual: 3, .. }));
    }

    #[test]
    fn build_keeps_positional_correspondence_and_normalizes() {
        let chunks = vec![make_chunk("a", "A"), make_chunk("b", "B")];
        let embeddings = vec![vec![2.0, 0.0], vec![0.0, 0.5]];
        let (index, docstore) = IndexBuilder::build(chunks, embeddings).unwrap();

        assert_eq!(index.len(), 2);
        assert_eq!(docstore.len(), 2);
        assert_eq!(index.dimension(), 2);
        assert_eq!(index.vector(0).unwrap(), vec![1.0, 0.0]);
        assert_eq!(index.vector(1).unwrap(), vec![0.0, 1.0]);
        assert_eq!(docstore.get(1).unwrap().0, "B");
        assert_eq!(docstore.get(1).unwrap().1.id, "b");
    }

    #[test]
    fn build_of_nothing_is_empty() {
        let (index, docstore) = IndexBuilder::build(Vec::new(), Vec::new()).unwrap();
        assert!(index.is_empty());
        assert!(docstore.is_empty());
    }

    #[test]
    fn scores_are_inner_products_in_position_order() {
        let index = VectorIndex::from_flat(2, 3, vec![1.0, 0.0, 0.0, 1.0, -1.0, 0.0]).unwrap();
        assert_eq!(index.scores(&[1.0, 0.0]).unwrap(), vec![1.0, 0.0, -1.0]);
        assert!(index.scores(&[1.0, 0.0, 0.0]).is_err());
    }
}
