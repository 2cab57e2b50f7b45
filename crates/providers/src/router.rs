//! Provider router: selects the correct LLM provider based on config.
//!
//! Handles provider creation and routing requests to the right backend.

use mira_config::AppConfig;
use mira_core::provider::Provider;
use std::collections::HashMap;
use std::sync::Arc;

use crate::openai_compat::OpenAiCompatProvider;

/// Routes LLM requests to the correct provider.
pub struct ProviderRouter {
    providers: HashMap<String, Arc<dyn Provider>>,
    default_provider: String,
}

impl ProviderRouter {
    /// Create a new router with a default provider.
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider.into(),
        }
    }

    /// Register a provider.
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn Provider>) {
        self.providers.insert(name.into(), provider);
    }

    /// Get the default provider.
    pub fn default(&self) -> Option<Arc<dyn Provider>> {
        self.providers.get(&self.default_provider).cloned()
    }

    /// Get a specific provider by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).cloned()
    }

    /// List all registered provider names.
    pub fn list(&self) -> Vec<&str> {
        self.providers.keys().map(|s| s.as_str()).collect()
    }
}

/// Build providers from configuration.
///
/// Every `[providers.<name>]` table becomes an OpenAI-compatible provider,
/// and the default provider is always registered even when not listed.
pub fn build_from_config(config: &AppConfig) -> ProviderRouter {
    let mut router = ProviderRouter::new(&config.default_provider);

    for (name, provider_config) in &config.providers {
        let api_key = config.api_key_for(name).unwrap_or_default();
        let base_url = provider_config
            .api_url
            .clone()
            .unwrap_or_else(|| default_base_url(name));

        router.register(
            name.clone(),
            Arc::new(OpenAiCompatProvider::new(name, &base_url, &api_key)),
        );
    }

    if router.get(&config.default_provider).is_none() {
        let api_key = config.api_key_for(&config.default_provider).unwrap_or_default();
        let base_url = default_base_url(&config.default_provider);

        router.register(
            config.default_provider.clone(),
            Arc::new(OpenAiCompatProvider::new(
                &config.default_provider,
                &base_url,
                &api_key,
            )),
        );
    }

    router
}

/// Build the provider used for `/embeddings` calls.
///
/// `[embedding]` settings win over the `[providers.<name>]` table, which
/// wins over the built-in base URL for well-known names.
pub fn build_embedding_provider(config: &AppConfig) -> Arc<dyn Provider> {
    let name = &config.embedding.provider;
    let base_url = config
        .embedding
        .api_url
        .clone()
        .or_else(|| config.providers.get(name).and_then(|p| p.api_url.clone()))
        .unwrap_or_else(|| default_base_url(name));
    let api_key = config
        .embedding
        .api_key
        .clone()
        .or_else(|| config.api_key_for(name))
        .unwrap_or_default();

    Arc::new(OpenAiCompatProvider::new(name, &base_url, &api_key))
}

/// Get the default base URL for well-known providers.
pub fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "groq" => "https://api.groq.com/openai/v1".into(),
        "openai" => "https://api.openai.com/v1".into(),
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "ollama" => "http://localhost:11434/v1".into(),
        "together" => "https://api.together.xyz/v1".into(),
        "fireworks" => "https://api.fireworks.ai/inference/v1".into(),
        "vllm" => "http://localhost:8000/v1".into(),
        "llamacpp" | "llama.cpp" => "http://localhost:8080/v1".into(),
        _ => format!("https://{provider_name}.api.example.com/v1"),
    }
}
