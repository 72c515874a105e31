//! Retrieval-augmented go-to-market strategy backend.
//!
//! Offline, `rag::Ingestor` turns a CSV of startup case studies into a
//! published vector index. Online, the axum server in `server` retrieves
//! similar cases and asks a generation backend for a strategy dashboard.

pub mod core;
pub mod llm;
pub mod rag;
pub mod server;
pub mod state;
pub mod strategy;
pub mod vector_math;
