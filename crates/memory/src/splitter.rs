//! Recursive character text splitter.
//!
//! Splits on the coarsest separator present in the text (paragraph breaks,
//! then line breaks, then spaces, then single characters), merges the pieces
//! back into chunks no longer than `chunk_size`, and carries up to
//! `chunk_overlap` characters of trailing context into the next chunk.
//!
//! Lengths are measured in `char`s, not bytes.

use std::collections::VecDeque;
use tracing::warn;

pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Splits text into overlapping chunks.
#[derive(Debug, Clone)]
pub struct RecursiveSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl RecursiveSplitter {
    /// Create a splitter with the default separators.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, mira_core::Error> {
        Self::with_separators(
            chunk_size,
            chunk_overlap,
            ["\n\n", "\n", " ", ""].into_iter().map(String::from).collect(),
        )
    }

    /// Create a splitter with custom separators, coarsest first.
    ///
    /// An empty separator means "split into characters".
    pub fn with_separators(
        chunk_size: usize,
        chunk_overlap: usize,
        separators: Vec<String>,
    ) -> Result<Self, mira_core::Error> {
        if chunk_size == 0 {
            return Err(mira_core::Error::config("chunk_size must be > 0"));
        }
        if chunk_overlap > chunk_size {
            return Err(mira_core::Error::config(format!(
                "chunk_overlap ({chunk_overlap}) must not exceed chunk_size ({chunk_size})"
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
            separators,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split `text` into chunks.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut separator = separators.last().map(String::as_str).unwrap_or("");
        let mut remaining: &[String] = &[];
        for (i, candidate) in separators.iter().enumerate() {
            if candidate.is_empty() {
                separator = "";
                break;
            }
            if text.contains(candidate.as_str()) {
                separator = candidate;
                remaining = &separators[i + 1..];
                break;
            }
        }

        let mut chunks = Vec::new();
        let mut pending: Vec<String> = Vec::new();

        for piece in split_keeping_separator(text, separator) {
            if char_len(&piece) < self.chunk_size {
                pending.push(piece);
                continue;
            }

            if !pending.is_empty() {
                chunks.extend(self.merge(&pending));
                pending.clear();
            }

            if remaining.is_empty() {
                chunks.push(piece);
            } else {
                chunks.extend(self.split_recursive(&piece, remaining));
            }
        }

        if !pending.is_empty() {
            chunks.extend(self.merge(&pending));
        }

        chunks
    }

    /// Merge small pieces into chunks, retaining an overlap window.
    fn merge(&self, pieces: &[String]) -> Vec<String> {
        let mut docs = Vec::new();
        let mut window: VecDeque<(&str, usize)> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(piece);

            if total + len > self.chunk_size {
                if total > self.chunk_size {
                    warn!(
                        length = total,
                        chunk_size = self.chunk_size,
                        "Created a chunk longer than the configured size"
                    );
                }

                if !window.is_empty() {
                    if let Some(doc) = join_window(&window) {
                        docs.push(doc);
                    }

                    while total > self.chunk_overlap
                        || (total + len > self.chunk_size && total > 0)
                    {
                        match window.pop_front() {
                            Some((_, dropped)) => total -= dropped,
                            None => break,
                        }
                    }
                }
            }

            window.push_back((piece, len));
            total += len;
        }

        if let Some(doc) = join_window(&window) {
            docs.push(doc);
        }

        docs
    }
}

impl Default for RecursiveSplitter {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            separators: ["\n\n", "\n", " ", ""].into_iter().map(String::from).collect(),
        }
    }
}

/// Split on `separator`, re-attaching it to the start of each following
/// piece. Empty pieces are dropped.
fn split_keeping_separator(text: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        return text.chars().map(String::from).collect();
    }

    let mut parts = text.split(separator);
    let mut out = Vec::new();
    if let Some(first) = parts.next() {
        if !first.is_empty() {
            out.push(first.to_string());
        }
    }
    out.extend(parts.map(|p| format!("{separator}{p}")));
    out
}

fn join_window(window: &VecDeque<(&str, usize)>) -> Option<String> {
    let joined: String = window.iter().map(|(s, _)| *s).collect();
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
