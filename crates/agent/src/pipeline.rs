//! Retrieval-augmented response pipeline.
//!
//! # Flow
//!
//! 1. Query the vector index with the user's utterance
//! 2. Join the retrieved chunk texts into one context block
//! 3. Build the prompt: system message (persona + context), history, new turn
//! 4. Call the model once
//! 5. Append user and assistant turns to memory, then to the transcript
//!
//! The pipeline is the only writer of both memory and transcript, so their
//! order always matches.

use chrono::{Local, NaiveDateTime};
use mira_config::AppConfig;
use mira_core::error::TranscriptError;
use mira_core::provider::{Provider, ProviderRequest};
use mira_core::{Message, Persona, Role, ScoredChunk};
use mira_memory::{ConversationMemory, Turn, TranscriptLogger, VectorIndex};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Appended to the persona in every system message.
const CONTEXT_PREAMBLE: &str =
    "\nUse the following pieces of context, that have been formatted from your RAG database, to inform your response: ";

/// Characters of each retrieved chunk shown in debug logs.
const PREVIEW_CHARS: usize = 200;

/// Model and retrieval settings for each turn.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub top_k: usize,
}

impl PipelineSettings {
    /// The default provider's own `default_model` wins over the global one.
    pub fn from_config(config: &AppConfig) -> Self {
        let model = config
            .providers
            .get(&config.default_provider)
            .and_then(|p| p.default_model.clone())
            .unwrap_or_else(|| config.default_model.clone());

        Self {
            model,
            temperature: config.default_temperature,
            max_tokens: config.default_max_tokens,
            top_k: config.rag.top_k,
        }
    }
}

/// Result of one successful turn.
#[derive(Debug)]
pub struct Reply {
    /// The model's answer.
    pub answer: String,
    /// Chunks used as context, most relevant first.
    pub retrieved: Vec<ScoredChunk>,
    /// Set when the turn could not be written to the transcript.
    /// The answer and memory are kept regardless.
    pub transcript_error: Option<TranscriptError>,
}

/// Owns everything one conversation needs.
pub struct ResponsePipeline {
    provider: Arc<dyn Provider>,
    index: VectorIndex,
    persona: Persona,
    memory: ConversationMemory,
    transcript: TranscriptLogger,
    user_name: String,
    settings: PipelineSettings,
}

impl ResponsePipeline {
    pub fn new(
        provider: Arc<dyn Provider>,
        index: VectorIndex,
        persona: Persona,
        transcript: TranscriptLogger,
        user_name: impl Into<String>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            provider,
            index,
            persona,
            memory: ConversationMemory::new(),
            transcript,
            user_name: user_name.into(),
            settings,
        }
    }

    /// Answer one user utterance.
    ///
    /// Retrieval and generation errors are returned and nothing is recorded.
    /// A transcript write failure is reported in [`Reply::transcript_error`].
    pub async fn respond(&mut self, user_input: &str) -> mira_core::Result<Reply> {
        // ── Step 1: Retrieve ──
        let retrieved = self.index.query(user_input, self.settings.top_k).await?;

        for hit in &retrieved {
            debug!(
                source = %hit.chunk.source,
                score = hit.score,
                preview = %hit.chunk.preview(PREVIEW_CHARS),
                "Retrieved chunk"
            );
        }

        let context = retrieved
            .iter()
            .map(|hit| hit.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        // ── Step 2: Assemble ──
        let messages = self.build_messages(user_input, &context, Local::now().naive_local());

        // ── Step 3: Generate ──
        let request = ProviderRequest {
            model: self.settings.model.clone(),
            messages,
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        };

        let response = self.provider.complete(request).await?;
        let answer = response.message.content;

        info!(
            provider = self.provider.name(),
            model = %response.model,
            chunks = retrieved.len(),
            answer_len = answer.len(),
            "Response generated"
        );

        // ── Step 4: Record ──
        self.memory.append(Role::User, &self.user_name, user_input);
        self.memory
            .append(Role::Assistant, &self.persona.assistant_name, &answer);

        let transcript_error = self.record(user_input, &answer).err();
        if let Some(e) = &transcript_error {
            warn!(error = %e, "Failed to save turn to transcript");
        }

        Ok(Reply {
            answer,
            retrieved,
            transcript_error,
        })
    }

    /// Set the transcript title.
    pub fn set_title(&mut self, title: &str) -> Result<(), TranscriptError> {
        self.transcript.set_title(title)
    }

    /// All turns so far, oldest first.
    pub fn history(&self) -> &[Turn] {
        self.memory.history()
    }

    pub fn transcript_path(&self) -> &Path {
        self.transcript.path()
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn persona(&self) -> &Persona {
        &self.persona
    }

    fn record(&mut self, user_input: &str, answer: &str) -> Result<(), TranscriptError> {
        self.transcript.append(&self.user_name, user_input)?;
        self.transcript.append(&self.persona.assistant_name, answer)
    }

    fn build_messages(&self, user_input: &str, context: &str, now: NaiveDateTime) -> Vec<Message> {
        let system = format!(
            "{}{CONTEXT_PREAMBLE}{context}",
            self.persona.compose(&self.user_name, now)
        );

        debug!(
            history = self.memory.len(),
            context_chars = context.chars().count(),
            "Assembled prompt"
        );

        let mut messages = Vec::with_capacity(self.memory.len() + 2);
        messages.push(Message::system(system));
        messages.extend(self.memory.to_messages());
        messages.push(Message::user(user_input));
        messages
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use mira_config::ProviderConfig;
    use mira_core::Chunk;
    use tempfile::TempDir;

    fn settings() -> PipelineSettings {
        PipelineSettings {
            model: "mock-model".into(),
            temperature: 1.2,
            max_tokens: None,
            top_k: 4,
        }
    }

    fn chunks() -> Vec<Chunk> {
        vec![
            Chunk::new("Sam is learning Rust", "notes/rust.md"),
            Chunk::new("The garden needs watering on Fridays", "notes/garden.md"),
        ]
    }

    async fn pipeline(
        dir: &TempDir,
        provider: Arc<dyn Provider>,
        embedder: Arc<ToggleEmbedder>,
    ) -> ResponsePipeline {
        let index = VectorIndex::build(chunks(), embedder, 64).await.unwrap();
        let transcript = TranscriptLogger::create(dir.path(), "sam", fixed_time()).unwrap();
        ResponsePipeline::new(
            provider,
            index,
            Persona::new("Mira", "You are Mira.", "- Likes tea"),
            transcript,
            "sam",
            settings(),
        )
    }

    #[tokio::test]
    async fn respond_records_user_then_assistant() {
        let dir = TempDir::new().unwrap();
        let provider = Arc::new(SequentialMockProvider::single_text("Hi sam!"));
        let mut mira = pipeline(&dir, provider, Arc::new(ToggleEmbedder::new())).await;

        let reply = mira.respond("hello").await.unwrap();

        assert_eq!(reply.answer, "Hi sam!");
        assert!(reply.transcript_error.is_none());
        assert_eq!(reply.retrieved.len(), 2);

        let history = mira.history();
        assert_eq!(history.len(), 2);
        assert_eq!((history[0].role, history[0].speaker.as_str()), (Role::User, "sam"));
        assert_eq!(history[0].message, "hello");
        assert_eq!((history[1].role, history[1].speaker.as_str()), (Role::Assistant, "Mira"));
        assert_eq!(history[1].message, "Hi sam!");
    }

    #[tokio::test]
    async fn memory_and_transcript_stay_in_lockstep() {
        let dir = TempDir::new().unwrap();
        let answers = ["one", "two", "three"];
        let provider = Arc::new(SequentialMockProvider::new(
            answers.iter().map(|a| make_text_response(a)).collect(),
        ));
        let mut mira = pipeline(&dir, provider, Arc::new(ToggleEmbedder::new())).await;

        for question in ["q1", "q2", "q3"] {
            mira.respond(question).await.unwrap();
        }

        let record = TranscriptLogger::read_from(mira.transcript_path()).unwrap();
        assert_eq!(mira.history().len(), 6);
        assert_eq!(record.messages.len(), 6);
        for (turn, logged) in mira.history().iter().zip(&record.messages) {
            assert_eq!(turn.speaker, logged.speaker);
            assert_eq!(turn.message, logged.message);
        }
    }

    #[tokio::test]
    async fn prompt_has_persona_context_history_and_turn() {
        let dir = TempDir::new().unwrap();
        let provider = Arc::new(SequentialMockProvider::new(vec![
            make_text_response("first answer"),
            make_text_response("second answer"),
        ]));
        let mut mira = pipeline(&dir, provider.clone(), Arc::new(ToggleEmbedder::new())).await;

        mira.respond("first question").await.unwrap();
        mira.respond("second question").await.unwrap();

        let request = provider.last_request().unwrap();
        assert_eq!(request.model, "mock-model");
        assert!((request.temperature - 1.2).abs() < f32::EPSILON);

        let roles: Vec<Role> = request.messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::User]
        );

        let system = &request.messages[0].content;
        assert!(system.starts_with("You are Mira.\n\nCurrent context:\n- "));
        assert!(system.contains("- Likes tea\n- You are talking to sam.\n"));
        assert!(system.contains(CONTEXT_PREAMBLE));
        assert!(system.contains("Sam is learning Rust"));
        assert!(system.contains("The garden needs watering on Fridays"));
        assert!(system.contains("\n\n"));

        assert_eq!(request.messages[1].content, "first question");
        assert_eq!(request.messages[2].content, "first answer");
        assert_eq!(request.messages[3].content, "second question");
    }

    #[tokio::test]
    async fn retrieval_failure_records_nothing() {
        let dir = TempDir::new().unwrap();
        let provider = Arc::new(SequentialMockProvider::single_text("unused"));
        let embedder = Arc::new(ToggleEmbedder::new());
        let mut mira = pipeline(&dir, provider.clone(), embedder.clone()).await;

        embedder.set_failing(true);
        let err = mira.respond("hello").await.unwrap_err();

        assert!(matches!(err, mira_core::Error::Retrieval(_)));
        assert!(mira.history().is_empty());
        assert_eq!(provider.call_count(), 0);
        let record = TranscriptLogger::read_from(mira.transcript_path()).unwrap();
        assert!(record.messages.is_empty());
    }

    #[tokio::test]
    async fn generation_failure_records_nothing() {
        let dir = TempDir::new().unwrap();
        let mut mira = pipeline(&dir, Arc::new(FailingProvider), Arc::new(ToggleEmbedder::new())).await;

        let err = mira.respond("hello").await.unwrap_err();

        assert!(matches!(err, mira_core::Error::Generation(_)));
        assert!(mira.history().is_empty());
        let record = TranscriptLogger::read_from(mira.transcript_path()).unwrap();
        assert!(record.messages.is_empty());
    }

    #[tokio::test]
    async fn transcript_failure_keeps_the_answer() {
        let dir = TempDir::new().unwrap();
        let provider = Arc::new(SequentialMockProvider::single_text("still here"));
        let mut mira = pipeline(&dir, provider, Arc::new(ToggleEmbedder::new())).await;

        std::fs::remove_file(mira.transcript_path()).unwrap();
        let reply = mira.respond("hello").await.unwrap();

        assert_eq!(reply.answer, "still here");
        assert!(matches!(
            reply.transcript_error,
            Some(TranscriptError::Io { .. })
        ));
        assert_eq!(mira.history().len(), 2);
    }

    #[tokio::test]
    async fn set_title_reaches_the_transcript() {
        let dir = TempDir::new().unwrap();
        let provider = Arc::new(SequentialMockProvider::single_text("ok"));
        let mut mira = pipeline(&dir, provider, Arc::new(ToggleEmbedder::new())).await;

        mira.set_title("Tea and Rust").unwrap();
        mira.respond("hello").await.unwrap();

        let record = TranscriptLogger::read_from(mira.transcript_path()).unwrap();
        assert_eq!(record.title.as_deref(), Some("Tea and Rust"));
        assert_eq!(record.messages.len(), 2);
    }

    #[tokio::test]
    async fn top_k_limits_retrieved_chunks() {
        let dir = TempDir::new().unwrap();
        let provider = Arc::new(SequentialMockProvider::single_text("ok"));
        let mut mira = pipeline(&dir, provider, Arc::new(ToggleEmbedder::new())).await;
        mira.settings.top_k = 1;

        let reply = mira.respond("rust").await.unwrap();
        assert_eq!(reply.retrieved.len(), 1);
    }

    #[test]
    fn provider_default_model_overrides_global_model() {
        let mut config = AppConfig::default();
        config.providers.insert(
            "groq".into(),
            ProviderConfig {
                api_key: None,
                api_url: None,
                default_model: Some("llama-3.1-8b-instant".into()),
            },
        );

        assert_eq!(config.default_provider, "groq");
        assert_eq!(
            PipelineSettings::from_config(&config).model,
            "llama-3.1-8b-instant"
        );

        // Only the default provider's entry counts
        config.default_provider = "openai".into();
        assert_eq!(
            PipelineSettings::from_config(&config).model,
            config.default_model
        );
    }

    #[test]
    fn global_model_used_without_provider_entry() {
        let config = AppConfig::default();
        let settings = PipelineSettings::from_config(&config);
        assert_eq!(settings.model, config.default_model);
        assert_eq!(settings.top_k, config.rag.top_k);
    }
}
