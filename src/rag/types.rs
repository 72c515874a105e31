//! Shared data types for ingestion and retrieval.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::RagError;

/// Part of a source record a chunk originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Opportunity,
    Strategy,
    Learnings,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Opportunity, Section::Strategy, Section::Learnings];

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Opportunity => "opportunity",
            Section::Strategy => "strategy",
            Section::Learnings => "learnings",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Section {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "opportunity" => Ok(Section::Opportunity),
            "strategy" => Ok(Section::Strategy),
            "learnings" => Ok(Section::Learnings),
            other => Err(RagError::InvalidInput(format!("unknown section: {}", other))),
        }
    }
}

/// One raw corpus row, already split into its named sections.
#[derive(Debug, Clone)]
pub struct Record {
    pub row_id: usize,
    pub sections: Vec<(Section, String)>,
}

impl Record {
    pub fn section(&self, section: Section) -> Option<&str> {
        self.sections
            .iter()
            .find(|(s, _)| *s == section)
            .map(|(_, text)| text.as_str())
    }
}

/// Auxiliary fields stored alongside each chunk in the docstore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub id: String,
    pub section: Section,
    /// Entity the record describes.
    pub startup_name: String,
    /// Category inferred for the entity.
    pub industry: String,
    /// Provenance label of the corpus the chunk came from.
    pub source: String,
}

/// The atomic retrievable unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub id: String,
    pub section: Section,
    pub text: String,
    pub metadata: ChunkMetadata,
}

/// One ranked hit returned by the retriever.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedChunk {
    /// Ingestion-order position in the index and docstore.
    #[serde(skip)]
    pub position: usize,
    pub text: String,
    pub metadata: ChunkMetadata,
    pub score: f32,
}
