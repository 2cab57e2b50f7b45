//! Conversation memory: the in-process turn history for one session.
//!
//! Append-only and unbounded: every prior turn is replayed into every new
//! model call, so long sessions grow the prompt without limit.

use mira_core::{Message, Role};
use serde::{Deserialize, Serialize};

/// One message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,

    /// Display name of whoever said it (the user's name or the assistant's)
    pub speaker: String,

    pub message: String,
}

/// Ordered history of turns.
#[derive(Debug, Clone, Default)]
pub struct ConversationMemory {
    turns: Vec<Turn>,
}

impl ConversationMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, role: Role, speaker: impl Into<String>, message: impl Into<String>) {
        self.turns.push(Turn {
            role,
            speaker: speaker.into(),
            message: message.into(),
        });
    }

    pub fn history(&self) -> &[Turn] {
        &self.turns
    }

    /// The history as provider messages, oldest first.
    pub fn to_messages(&self) -> Vec<Message> {
        self.turns
            .iter()
            .map(|t| Message::new(t.role, t.message.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
