//! Persona: the assistant's system-level instruction.
//!
//! The persona is assembled from two plain-text files loaded once at startup:
//!
//! 1. **System prompt**: who the assistant is, tone, style
//! 2. **Current context**: free-form notes about the user's situation
//!
//! Each file is optional. A missing system prompt falls back to a built-in
//! one; missing notes are simply empty. Every turn, [`compose`] merges both
//! with the current timestamp and the user's display name.

use chrono::NaiveDateTime;
use std::path::Path;
use tracing::{debug, warn};

/// Timestamp format used in the "Current context" block.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Static persona inputs, loaded once per process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persona {
    /// The assistant's name, used as the transcript speaker
    pub assistant_name: String,

    /// Base system prompt
    pub base_prompt: String,

    /// Free-form context notes
    pub context_notes: String,
}

impl Persona {
    pub fn new(
        assistant_name: impl Into<String>,
        base_prompt: impl Into<String>,
        context_notes: impl Into<String>,
    ) -> Self {
        Self {
            assistant_name: assistant_name.into(),
            base_prompt: base_prompt.into(),
            context_notes: context_notes.into(),
        }
    }

    /// Load the persona from the system prompt and context note files.
    pub fn load(assistant_name: &str, system_prompt_file: &Path, context_file: &Path) -> Self {
        let base_prompt = match read_file_safe(system_prompt_file) {
            Some(prompt) => {
                debug!(file = %system_prompt_file.display(), "Loaded system prompt");
                prompt
            }
            None => {
                warn!(
                    file = %system_prompt_file.display(),
                    "System prompt file not found, using built-in prompt"
                );
                fallback_system_prompt(assistant_name)
            }
        };

        let context_notes = read_file_safe(context_file).unwrap_or_else(|| {
            warn!(file = %context_file.display(), "Context notes file not found");
            String::new()
        });

        Self::new(assistant_name, base_prompt, context_notes)
    }

    /// Compose the system instruction for a given user at a given time.
    pub fn compose(&self, user_name: &str, now: NaiveDateTime) -> String {
        compose(&self.base_prompt, &self.context_notes, user_name, now)
    }
}

impl Default for Persona {
    fn default() -> Self {
        Self::new("Mira", fallback_system_prompt("Mira"), "")
    }
}

/// Merge the base prompt, a "Current context:" block and the user's name.
///
/// Pure: identical inputs always yield identical output.
pub fn compose(base_prompt: &str, context_notes: &str, user_name: &str, now: NaiveDateTime) -> String {
    format!(
        "{base}\n\nCurrent context:\n- {timestamp}\n{notes}\n- You are talking to {user_name}.\n",
        base = base_prompt.trim_end(),
        timestamp = now.format(TIMESTAMP_FORMAT),
        notes = context_notes.trim(),
    )
}

fn fallback_system_prompt(assistant_name: &str) -> String {
    format!(
        "You are {assistant_name}, a warm, curious and candid AI companion. \
         You remember what the user told you earlier in the conversation and \
         draw on the documents you are given when they are relevant."
    )
}

fn read_file_safe(path: &Path) -> Option<String> {
    std::fs::read_to_string(path).ok()
}
