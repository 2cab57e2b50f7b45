//! Retrievable knowledge: chunks of source files tagged with their origin.

use serde::{Deserialize, Serialize};

/// A piece of a source document, produced by the loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// The chunk text
    pub text: String,

    /// Path of the file this chunk came from
    pub source: String,
}

impl Chunk {
    pub fn new(text: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
        }
    }

    /// First `max_chars` characters of the text, for log previews.
    pub fn preview(&self, max_chars: usize) -> &str {
        match self.text.char_indices().nth(max_chars) {
            Some((idx, _)) => &self.text[..idx],
            None => &self.text,
        }
    }
}

/// A chunk returned by a similarity query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,

    /// Similarity to the query (higher = more relevant)
    pub score: f32,
}
