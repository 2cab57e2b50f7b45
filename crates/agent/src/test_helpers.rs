//! Shared test helpers for pipeline tests.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use mira_core::error::{ProviderError, RetrievalError};
use mira_core::message::Message;
use mira_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use mira_memory::Embedder;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// A mock provider that returns a sequence of scripted responses.
///
/// Each call to `complete` returns the next response in the queue and the
/// request is kept for inspection.
/// Panics if more calls are made than responses provided.
pub struct SequentialMockProvider {
    responses: Mutex<Vec<ProviderResponse>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a provider that returns a single text response.
    pub fn single_text(text: &str) -> Self {
        Self::new(vec![make_text_response(text)])
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<ProviderRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let responses = self.responses.lock().unwrap();
        let count = requests.len();

        if count >= responses.len() {
            panic!(
                "SequentialMockProvider: no more responses (call #{}, have {})",
                count,
                responses.len()
            );
        }

        requests.push(request);
        Ok(responses[count].clone())
    }
}

/// A provider whose every call fails.
pub struct FailingProvider;

#[async_trait]
impl Provider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Err(ProviderError::ApiError {
            status_code: 500,
            message: "upstream exploded".into(),
        })
    }
}

/// Bag-of-letters embedder that can be switched into a failing state.
pub struct ToggleEmbedder {
    failing: AtomicBool,
}

impl ToggleEmbedder {
    pub fn new() -> Self {
        Self {
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl Embedder for ToggleEmbedder {
    fn name(&self) -> &str {
        "toggle"
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RetrievalError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RetrievalError::EmbeddingFailed("embedding service down".into()));
        }
        Ok(texts
            .iter()
            .map(|t| {
                let mut v = vec![0.0f32; 27];
                for c in t.to_ascii_lowercase().bytes() {
                    if c.is_ascii_lowercase() {
                        v[(c - b'a') as usize] += 1.0;
                    }
                }
                // Keeps every vector non-zero
                v[26] = 1.0;
                v
            })
            .collect())
    }
}

/// Create a simple text response.
pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

pub fn fixed_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 8, 1)
        .unwrap()
        .and_hms_opt(9, 30, 5)
        .unwrap()
}
