//! Error types for the Mira domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each stage of a conversation turn has its own error variant so callers
//! can tell "retrieval failed" apart from "the model failed" apart from
//! "the transcript could not be written".

use std::path::PathBuf;
use thiserror::Error;

/// The top-level error type for all Mira operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Retrieval errors ---
    #[error("Retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    // --- Generation (provider) errors ---
    #[error("Generation error: {0}")]
    Generation(#[from] ProviderError),

    // --- Transcript persistence ---
    #[error("Persistence error: {0}")]
    Persistence(#[from] TranscriptError),
}

impl Error {
    /// Shorthand for a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// A single source file that could not be turned into chunks.
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    #[error("Failed to read {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("Failed to walk {path}: {reason}")]
    Walk { path: PathBuf, reason: String },
}

#[derive(Debug, Clone, Error)]
pub enum RetrievalError {
    #[error("Embedding generation failed: {0}")]
    EmbeddingFailed(String),

    #[error("Embedder returned {got} vectors for {expected} inputs")]
    CountMismatch { expected: usize, got: usize },

    #[error("Embedding backend not available: {0}")]
    Unavailable(String),
}

impl From<ProviderError> for RetrievalError {
    fn from(err: ProviderError) -> Self {
        Self::EmbeddingFailed(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum TranscriptError {
    #[error("Transcript I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Transcript at {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("Transcript already exists: {0}")]
    AlreadyExists(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Generation(ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn retrieval_and_generation_are_distinct() {
        let retrieval: Error = RetrievalError::EmbeddingFailed("connection refused".into()).into();
        let generation: Error = ProviderError::Network("connection refused".into()).into();
        assert!(matches!(retrieval, Error::Retrieval(_)));
        assert!(matches!(generation, Error::Generation(_)));
    }

    #[test]
    fn provider_error_converts_into_retrieval_error() {
        let err: RetrievalError = ProviderError::AuthenticationFailed("bad key".into()).into();
        assert!(err.to_string().contains("bad key"));
    }

    #[test]
    fn load_error_names_the_file() {
        let err = LoadError::Read {
            path: PathBuf::from("notes/broken.md"),
            reason: "stream did not contain valid UTF-8".into(),
        };
        assert!(err.to_string().contains("notes/broken.md"));
    }
}
