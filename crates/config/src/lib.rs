//! Configuration loading, validation, and management for Mira.
//!
//! Loads configuration from `~/.mira/config.toml` with environment
//! variable overrides. Validates all settings at startup.
//!
//! The configuration is built once in `main` and passed by reference into
//! the loader, retriever, persona and pipeline. Nothing reads it globally.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.mira/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the chat provider (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Max tokens per LLM response (provider default when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_max_tokens: Option<u32>,

    /// User name used when none is entered at the prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_user_name: Option<String>,

    /// Document loading and retrieval
    #[serde(default)]
    pub rag: RagConfig,

    /// Embedding backend
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Persona files
    #[serde(default)]
    pub persona: PersonaConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "groq".into()
}
fn default_model() -> String {
    "llama-3.1-70b-versatile".into()
}
fn default_temperature() -> f32 {
    1.2
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("default_user_name", &self.default_user_name)
            .field("rag", &self.rag)
            .field("embedding", &self.embedding)
            .field("persona", &self.persona)
            .field("providers", &self.providers)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

impl std::fmt::Debug for EmbeddingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_url", &self.api_url)
            .field("api_key", &redact(&self.api_key))
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

/// Where documents come from and how they are chunked and retrieved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    /// Root of the directory tree indexed for retrieval
    #[serde(default = "default_rag_dir")]
    pub rag_dir: PathBuf,

    /// Folder receiving transcripts and the file-structure snapshot
    #[serde(default = "default_docs_folder")]
    pub docs_folder: PathBuf,

    /// Maximum chunk length in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Characters shared between consecutive chunks
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Chunks retrieved per turn
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    #[serde(default = "default_include_extensions")]
    pub include_extensions: Vec<String>,

    #[serde(default = "default_exclude_dirs")]
    pub exclude_dirs: Vec<String>,

    #[serde(default = "default_exclude_files")]
    pub exclude_files: Vec<String>,
}

fn default_rag_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_docs_folder() -> PathBuf {
    PathBuf::from("./rag_files")
}
fn default_chunk_size() -> usize {
    1000
}
fn default_chunk_overlap() -> usize {
    200
}
fn default_top_k() -> usize {
    4
}
fn default_include_extensions() -> Vec<String> {
    [".py", ".css", ".md", ".json", ".txt"]
        .into_iter()
        .map(String::from)
        .collect()
}
fn default_exclude_dirs() -> Vec<String> {
    [".git", "__pycache__", ".venv"]
        .into_iter()
        .map(String::from)
        .collect()
}
fn default_exclude_files() -> Vec<String> {
    [".gitignore", "requirements.txt", "README.md"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            rag_dir: default_rag_dir(),
            docs_folder: default_docs_folder(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            top_k: default_top_k(),
            include_extensions: default_include_extensions(),
            exclude_dirs: default_exclude_dirs(),
            exclude_files: default_exclude_files(),
        }
    }
}

/// Which backend turns text into vectors.
#[derive(Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// "local" (requires the `local` feature) or any OpenAI-compatible provider name
    #[serde(default = "default_embedding_provider")]
    pub provider: String,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Override the provider's base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Key for the embedding endpoint (falls back to the providers table)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Texts sent per embedding request while building the index
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_embedding_provider() -> String {
    "ollama".into()
}
fn default_embedding_model() -> String {
    "nomic-embed-text".into()
}
fn default_batch_size() -> usize {
    64
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: default_embedding_model(),
            api_url: None,
            api_key: None,
            batch_size: default_batch_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaConfig {
    #[serde(default = "default_assistant_name")]
    pub assistant_name: String,

    #[serde(default = "default_system_prompt_file")]
    pub system_prompt_file: PathBuf,

    #[serde(default = "default_context_file")]
    pub context_file: PathBuf,
}

fn default_assistant_name() -> String {
    "Mira".into()
}
fn default_system_prompt_file() -> PathBuf {
    PathBuf::from("prompts/main_system_prompt.txt")
}
fn default_context_file() -> PathBuf {
    PathBuf::from("prompts/current_context.txt")
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            assistant_name: default_assistant_name(),
            system_prompt_file: default_system_prompt_file(),
            context_file: default_context_file(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.mira/config.toml).
    ///
    /// Environment variables override the file:
    /// - `MIRA_API_KEY`, then `GROQ_API_KEY` (when no key is configured)
    /// - `MIRA_PROVIDER`, `MIRA_MODEL`
    /// - `rag_dir`, `default_user_name`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.api_key.is_none() {
            self.api_key = lookup("MIRA_API_KEY").or_else(|| lookup("GROQ_API_KEY"));
        }

        if let Some(provider) = lookup("MIRA_PROVIDER") {
            self.default_provider = provider;
        }

        // Beats the provider table's model too, not just the global one
        if let Some(model) = lookup("MIRA_MODEL") {
            if let Some(provider) = self.providers.get_mut(&self.default_provider) {
                provider.default_model = None;
            }
            self.default_model = model;
        }

        if let Some(rag_dir) = lookup("rag_dir") {
            self.rag.rag_dir = PathBuf::from(rag_dir);
        }

        if let Some(user) = lookup("default_user_name") {
            self.default_user_name = Some(user);
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".mira")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.default_temperature) {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.rag.chunk_size == 0 {
            return Err(ConfigError::ValidationError(
                "rag.chunk_size must be > 0".into(),
            ));
        }

        if self.rag.chunk_overlap > self.rag.chunk_size {
            return Err(ConfigError::ValidationError(format!(
                "rag.chunk_overlap ({}) must not exceed rag.chunk_size ({})",
                self.rag.chunk_overlap, self.rag.chunk_size
            )));
        }

        if self.rag.top_k == 0 {
            return Err(ConfigError::ValidationError("rag.top_k must be > 0".into()));
        }

        if self.embedding.batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.batch_size must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// The API key to use for the named provider.
    pub fn api_key_for(&self, provider: &str) -> Option<String> {
        self.providers
            .get(provider)
            .and_then(|p| p.api_key.clone())
            .or_else(|| self.api_key.clone())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key_for(&self.default_provider).is_some()
    }

    /// Generate a default config TOML string (for `config init`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: None,
            default_user_name: None,
            rag: RagConfig::default(),
            embedding: EmbeddingConfig::default(),
            persona: PersonaConfig::default(),
            providers: HashMap::new(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.default_provider, "groq");
        assert_eq!(config.rag.chunk_size, 1000);
        assert_eq!(config.rag.chunk_overlap, 200);
        assert_eq!(config.rag.top_k, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn default_loader_rules() {
        let rag = RagConfig::default();
        assert_eq!(rag.include_extensions, vec![".py", ".css", ".md", ".json", ".txt"]);
        assert!(rag.exclude_dirs.contains(&".venv".to_string()));
        assert!(rag.exclude_files.contains(&"README.md".to_string()));
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_provider, config.default_provider);
        assert_eq!(parsed.rag.docs_folder, config.rag.docs_folder);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let toml_str = r#"
default_model = "llama-3.1-8b-instant"

[rag]
rag_dir = "/home/sam/notes"
top_k = 6
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.default_model, "llama-3.1-8b-instant");
        assert_eq!(config.rag.rag_dir, PathBuf::from("/home/sam/notes"));
        assert_eq!(config.rag.top_k, 6);
        assert_eq!(config.rag.chunk_size, 1000);
        assert_eq!(config.persona.assistant_name, "Mira");
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            default_temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn overlap_larger_than_chunk_rejected() {
        let mut config = AppConfig::default();
        config.rag.chunk_overlap = 1500;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("chunk_overlap"));
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        let config = result.unwrap();
        assert_eq!(config.default_provider, "groq");
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "default_temperature = 0.4\n[persona]\nassistant_name = \"Nova\"\n").unwrap();
        let config = AppConfig::load_from(&path).unwrap();
        assert!((config.default_temperature - 0.4).abs() < f32::EPSILON);
        assert_eq!(config.persona.assistant_name, "Nova");
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "default_temperature = \"hot\"").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn env_supplies_api_key() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[("GROQ_API_KEY", "gsk-test")]));
        assert_eq!(config.api_key.as_deref(), Some("gsk-test"));
        assert!(config.has_api_key());
    }

    #[test]
    fn mira_key_wins_over_groq_key() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[("GROQ_API_KEY", "gsk-a"), ("MIRA_API_KEY", "mira-b")]));
        assert_eq!(config.api_key.as_deref(), Some("mira-b"));
    }

    #[test]
    fn file_key_not_overridden_by_env() {
        let mut config = AppConfig {
            api_key: Some("from-file".into()),
            ..AppConfig::default()
        };
        config.apply_env(env(&[("GROQ_API_KEY", "from-env")]));
        assert_eq!(config.api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn env_overrides_rag_dir_and_user() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[("rag_dir", "/srv/docs"), ("default_user_name", "robin")]));
        assert_eq!(config.rag.rag_dir, PathBuf::from("/srv/docs"));
        assert_eq!(config.default_user_name.as_deref(), Some("robin"));
    }

    #[test]
    fn env_model_beats_provider_table_model() {
        let mut config = AppConfig::default();
        config.providers.insert(
            "groq".into(),
            ProviderConfig {
                api_key: None,
                api_url: None,
                default_model: Some("from-file".into()),
            },
        );
        config.apply_env(env(&[("MIRA_MODEL", "from-env")]));
        assert_eq!(config.default_model, "from-env");
        assert!(config.providers["groq"].default_model.is_none());
    }

    #[test]
    fn provider_table_key_takes_precedence() {
        let mut config = AppConfig {
            api_key: Some("global".into()),
            ..AppConfig::default()
        };
        config.providers.insert(
            "ollama".into(),
            ProviderConfig {
                api_key: Some("local".into()),
                api_url: None,
                default_model: None,
            },
        );
        assert_eq!(config.api_key_for("ollama").as_deref(), Some("local"));
        assert_eq!(config.api_key_for("groq").as_deref(), Some("global"));
    }

    #[test]
    fn debug_redacts_keys() {
        let config = AppConfig {
            api_key: Some("gsk-secret".into()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("gsk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("groq"));
        assert!(toml_str.contains("chunk_overlap"));
    }
}
