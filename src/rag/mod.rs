//! RAG (Retrieval-Augmented Generation) module.
//!
//! This module provides:
//! - Ingestion: `CorpusReader`, chunking, `Deduplicator`, `Ingestor`
//! - Storage: `IndexBuilder`, `VectorIndex`, `DocStore`, `ArtifactStore`
//! - Query time: `Retriever` and `ContextAssembler`

pub mod chunker;
pub mod classifier;
mod context_builder;
pub mod corpus;
pub mod dedup;
pub mod embedding;
mod error;
pub mod index;
pub mod ingest;
pub mod persist;
mod retriever;
pub mod types;

pub use classifier::{EntityClassifier, KeywordClassifier};
pub use context_builder::{ContextAssembler, ContextBuilderConfig};
pub use dedup::Deduplicator;
pub use embedding::{embed_all, Embedder, HashingEmbedder};
pub use error::{ErrorKind, RagError};
pub use index::{DocStore, IndexBuilder, VectorIndex};
pub use ingest::{IngestOptions, IngestReport, Ingestor};
pub use persist::{ArtifactStore, LoadedArtifacts};
pub use retriever::Retriever;
pub use types::{Chunk, ChunkMetadata, Record, RetrievedChunk, Section};
