//! Augmentation context assembly.
//!
//! Formats ranked retrieval results into one provenance-tagged string for
//! the generation step.

use serde::{Deserialize, Serialize};

use super::types::RetrievedChunk;

pub const DEFAULT_PREAMBLE: &str = "The following are excerpts from historical go-to-market case studies. \
Use them as inspiration and evidence; do not copy them verbatim.";
pub const DEFAULT_POSTAMBLE: &str = "Ground your answer in the patterns above where they are relevant \
to the new business, and ignore excerpts that are not.";
pub const DEFAULT_SEPARATOR: &str = "\n\n---\n\n";

/// Configuration for context assembly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextBuilderConfig {
    pub preamble: String,
    pub postamble: String,
    pub separator: String,
    /// Maximum length of the joined excerpts in characters (0 = unlimited)
    pub max_context_chars: usize,
}

impl Default for ContextBuilderConfig {
    fn default() -> Self {
        Self {
            preamble: DEFAULT_PREAMBLE.to_string(),
            postamble: DEFAULT_POSTAMBLE.to_string(),
            separator: DEFAULT_SEPARATOR.to_string(),
            max_context_chars: 0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ContextAssembler {
    config: ContextBuilderConfig,
}

impl ContextAssembler {
    pub fn new(config: ContextBuilderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ContextBuilderConfig {
        &self.config
    }

    /// Provenance-tagged line for one result.
    pub fn format_entry(result: &RetrievedChunk) -> String {
        format!(
            "[{}:{}] {}",
            result.metadata.startup_name, result.metadata.section, result.text
        )
    }

    /// Join results into one context string; empty results give an empty string.
    pub fn assemble(&self, results: &[RetrievedChunk]) -> String {
        let budget = self.config.max_context_chars;
        let separator_chars = self.config.separator.chars().count();
        let mut entries: Vec<String> = Vec::with_capacity(results.len());
        let mut used = 0usize;

        for result in results {
            let entry = Self::format_entry(result);
            let entry_chars = entry.chars().count();
            let added = if entries.is_empty() {
                entry_chars
            } else {
                separator_chars + entry_chars
            };
            if budget > 0 && !entries.is_empty() && used + added > budget {
                break;
            }
            used += added;
            entries.push(entry);
        }

        if entries.is_empty() {
            return String::new();
        }

        let body = entries.join(&self.config.separator);
        let mut context = String::new();
        if !self.config.preamble.trim().is_empty() {
            context.push_str(self.config.preamble.trim());
            context.push_str("\n\n");
        }
        context.push_str(&body);
        if !self.config.postamble.trim().is_empty() {
            context.push_str("\n\n");
            context.push_str(self.config.postamble.trim());
        }
        context
    }

    /// Distinct entity names cited in the results, in rank order.
    pub fn sources(results: &[RetrievedChunk]) -> Vec<String> {
        let mut sources: Vec<String> = Vec::new();
        for result in results {
            if !sources.contains(&result.metadata.startup_name) {
                sources.push(result.metadata.startup_name.clone());
            }
        }
        sources
    }
}
