//! CSV corpus reader.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::RagError;
use super::types::{Record, Section};

/// Column names that hold each record section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusColumns {
    pub opportunity: String,
    pub strategy: String,
    pub learnings: String,
}

impl Default for CorpusColumns {
    fn default() -> Self {
        Self {
            opportunity: "The Startup & The Opportunity".to_string(),
            strategy: "Go-to-Market Strategy".to_string(),
            learnings: "Results & Key Learnings".to_string(),
        }
    }
}

impl CorpusColumns {
    fn column(&self, section: Section) -> &str {
        match section {
            Section::Opportunity => &self.opportunity,
            Section::Strategy => &self.strategy,
            Section::Learnings => &self.learnings,
        }
    }
}

pub struct CorpusReader {
    columns: CorpusColumns,
}

impl CorpusReader {
    pub fn new(columns: CorpusColumns) -> Self {
        Self { columns }
    }

    /// Read every row of the CSV file at `path`.
    pub fn read(&self, path: &Path) -> Result<Vec<Record>, RagError> {
        if !path.exists() {
            return Err(RagError::MissingFile(path.to_path_buf()));
        }
        let reader = csv::ReaderBuilder::new()
            .flexible(false)
            .from_path(path)
            .map_err(|e| RagError::InvalidInput(format!("{}: {}", path.display(), e)))?;
        let records = self.read_from(reader)?;
        if records.is_empty() {
            return Err(RagError::InvalidInput(format!(
                "corpus {} has no rows",
                path.display()
            )));
        }
        Ok(records)
    }

    pub fn read_from<R: std::io::Read>(
        &self,
        mut reader: csv::Reader<R>,
    ) -> Result<Vec<Record>, RagError> {
        let headers = reader
            .headers()
            .map_err(|e| RagError::InvalidInput(format!("unreadable corpus header: {}", e)))?
            .clone();

        let mut positions = Vec::with_capacity(Section::ALL.len());
        for section in Section::ALL {
            let name = self.columns.column(section);
            let position = headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| {
                    RagError::InvalidInput(format!("corpus is missing column '{}'", name))
                })?;
            positions.push((section, position));
        }

        let mut records = Vec::new();
        for (row_id, row) in reader.records().enumerate() {
            let row = row.map_err(|e| {
                RagError::InvalidInput(format!("malformed corpus row {}: {}", row_id + 1, e))
            })?;
            let sections = positions
                .iter()
                .map(|(section, position)| {
                    (*section, row.get(*position).unwrap_or_default().to_string())
                })
                .collect();
            records.push(Record { row_id, sections });
        }

        Ok(records)
    }
}
