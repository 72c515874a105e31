//! Text normalization and sentence-packed chunking.
//!
//! Record text is cleaned with [`normalize`] and then split by [`chunk`] into
//! chunks of at most `max_chars` characters, cut only at sentence boundaries.

use serde::{Deserialize, Serialize};

/// Configuration for the chunker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkerConfig {
    /// Maximum chunk size in characters
    pub max_chars: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self { max_chars: 900 }
    }
}

/// Collapse whitespace runs, map typographic punctuation to ASCII and trim.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    for c in text.chars() {
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;

        match c {
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' => out.push('\''),
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' => out.push('"'),
            '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2015}' | '\u{2212}' => out.push('-'),
            '\u{2026}' => out.push_str("..."),
            _ => out.push(c),
        }
    }

    out
}

/// Split text after `.`, `!` or `?` when followed by whitespace.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let Some(&(next_idx, next)) = chars.peek() else {
            break;
        };
        if !next.is_whitespace() {
            continue;
        }

        let sentence = text[start..idx + c.len_utf8()].trim();
        if !sentence.is_empty() {
            sentences.push(sentence);
        }
        start = next_idx;
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

/// Normalize `text` and greedily pack its sentences into chunks.
///
/// A sentence that alone exceeds `max_chars` is emitted as its own chunk
/// rather than being split further.
pub fn chunk(text: &str, max_chars: usize) -> Vec<String> {
    let normalized = normalize(text);
    let mut chunks = Vec::new();
    let mut buffer = String::new();
    let mut buffer_chars = 0usize;

    for sentence in split_sentences(&normalized) {
        let sentence_chars = sentence.chars().count();

        if buffer.is_empty() {
            buffer.push_str(sentence);
            buffer_chars = sentence_chars;
            continue;
        }

        if buffer_chars + 1 + sentence_chars <= max_chars {
            buffer.push(' ');
            buffer.push_str(sentence);
            buffer_chars += 1 + sentence_chars;
        } else {
            chunks.push(std::mem::take(&mut buffer));
            buffer.push_str(sentence);
            buffer_chars = sentence_chars;
        }
    }

    if !buffer.is_empty() {
        chunks.push(buffer);
    }

    chunks.retain(|c| !c.is_empty());
    chunks
}
