use std::collections::HashSet;

use sha2::{Digest, Sha256};

/// Hex SHA-256 of chunk text, used as the deduplication key.
pub fn content_hash(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// Tracks content hashes admitted during one ingestion run.
///
/// Create a fresh instance per run; state is never persisted.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: HashSet<String>,
    rejected: usize,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` the first time a given text is seen, `false` afterwards.
    pub fn admit(&mut self, text: &str) -> bool {
        let admitted = self.seen.insert(content_hash(text));
        if !admitted {
            self.rejected += 1;
        }
        admitted
    }

    pub fn admitted(&self) -> usize {
        self.seen.len()
    }

    pub fn rejected(&self) -> usize {
        self.rejected
    }
}
