//! In-memory vector index over document chunks.
//!
//! Brute-force cosine scan: every query embeds the text once and scores it
//! against every stored chunk. Fine for a personal documents folder.

use mira_core::error::RetrievalError;
use mira_core::{Chunk, ScoredChunk};
use std::sync::Arc;
use tracing::{debug, info};

use crate::embedder::Embedder;
use crate::vector::rank_by_similarity;

pub const DEFAULT_BATCH_SIZE: usize = 64;
pub const DEFAULT_TOP_K: usize = 4;

/// Chunks paired with their embeddings.
pub struct VectorIndex {
    chunks: Vec<Chunk>,
    embeddings: Vec<Vec<f32>>,
    embedder: Arc<dyn Embedder>,
}

impl VectorIndex {
    /// Embed `chunks` in batches of `batch_size` and build the index.
    pub async fn build(
        chunks: Vec<Chunk>,
        embedder: Arc<dyn Embedder>,
        batch_size: usize,
    ) -> Result<Self, RetrievalError> {
        let batch_size = batch_size.max(1);
        let mut embeddings = Vec::with_capacity(chunks.len());

        for batch in chunks.chunks(batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let vectors = embedder.embed(&texts).await?;
            if vectors.len() != texts.len() {
                return Err(RetrievalError::CountMismatch {
                    expected: texts.len(),
                    got: vectors.len(),
                });
            }
            embeddings.extend(vectors);
            debug!(embedded = embeddings.len(), total = chunks.len(), "Embedding progress");
        }

        info!(
            chunks = chunks.len(),
            embedder = embedder.name(),
            "Vector index built"
        );

        Ok(Self {
            chunks,
            embeddings,
            embedder,
        })
    }

    /// The `k` chunks most similar to `text`, most relevant first.
    ///
    /// Returns exactly `min(k, len)` results.
    pub async fn query(&self, text: &str, k: usize) -> Result<Vec<ScoredChunk>, RetrievalError> {
        if self.chunks.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self
            .embedder
            .embed(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or(RetrievalError::CountMismatch {
                expected: 1,
                got: 0,
            })?;

        let ranked = rank_by_similarity(
            self.embeddings.iter().map(Vec::as_slice),
            &query_embedding,
            k,
        );

        Ok(ranked
            .into_iter()
            .map(|(i, score)| ScoredChunk {
                chunk: self.chunks[i].clone(),
                score,
            })
            .collect())
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }
}

impl std::fmt::Debug for VectorIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorIndex")
            .field("chunks", &self.chunks.len())
            .field("embedder", &self.embedder.name())
            .finish()
    }
}
