//! Embedders turn chunk text into vectors.
//!
//! The index only needs "one vector per input, same order", so the backend
//! sits behind the [`Embedder`] trait:
//!
//! - [`ProviderEmbedder`] calls an OpenAI-compatible `/embeddings` endpoint
//!   through a [`Provider`] (Ollama by default)
//! - `LocalEmbedder` (feature `local`) runs BAAI/bge-small-en-v1.5 in-process
//!   via `fastembed`

use async_trait::async_trait;
use mira_core::error::RetrievalError;
use mira_core::provider::{EmbeddingRequest, Provider};
use std::sync::Arc;
use tracing::debug;

/// Text to vector conversion.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Human-readable backend name, for logs.
    fn name(&self) -> &str;

    /// Embed every text. Must return exactly one vector per input, in order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RetrievalError>;
}

/// Embeds through a provider's `/embeddings` endpoint.
pub struct ProviderEmbedder {
    provider: Arc<dyn Provider>,
    model: String,
}

impl ProviderEmbedder {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Embedder for ProviderEmbedder {
    fn name(&self) -> &str {
        self.provider.name()
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RetrievalError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            provider = self.provider.name(),
            model = %self.model,
            count = texts.len(),
            "Embedding batch"
        );

        let response = self
            .provider
            .embed(EmbeddingRequest {
                model: self.model.clone(),
                inputs: texts.to_vec(),
            })
            .await?;

        if response.embeddings.len() != texts.len() {
            return Err(RetrievalError::CountMismatch {
                expected: texts.len(),
                got: response.embeddings.len(),
            });
        }

        Ok(response.embeddings)
    }
}

/// In-process embeddings with `fastembed` (BAAI/bge-small-en-v1.5, 384 dims).
#[cfg(feature = "local")]
pub struct LocalEmbedder {
    model: Arc<fastembed::TextEmbedding>,
}

#[cfg(feature = "local")]
impl LocalEmbedder {
    /// Load the model, downloading it on first use.
    pub fn new() -> Result<Self, RetrievalError> {
        use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

        tracing::info!("Loading embedding model: bge-small-en-v1.5");
        let start = std::time::Instant::now();

        let mut init_options = InitOptions::default();
        init_options.model_name = EmbeddingModel::BGESmallENV15;
        init_options.show_download_progress = false;

        let model = TextEmbedding::try_new(init_options).map_err(|e| {
            RetrievalError::Unavailable(format!("Failed to load embedding model: {e}"))
        })?;

        tracing::info!("Embedding model loaded in {:?}", start.elapsed());

        Ok(Self {
            model: Arc::new(model),
        })
    }
}

#[cfg(feature = "local")]
#[async_trait]
impl Embedder for LocalEmbedder {
    fn name(&self) -> &str {
        "local"
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RetrievalError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model = Arc::clone(&self.model);
        let inputs = texts.to_vec();
        let expected = inputs.len();

        // Inference is CPU-bound
        let embeddings = tokio::task::spawn_blocking(move || model.embed(inputs, None))
            .await
            .map_err(|e| RetrievalError::EmbeddingFailed(format!("Embedding task failed: {e}")))?
            .map_err(|e| RetrievalError::EmbeddingFailed(e.to_string()))?;

        if embeddings.len() != expected {
            return Err(RetrievalError::CountMismatch {
                expected,
                got: embeddings.len(),
            });
        }

        Ok(embeddings)
    }
}
