//! Transcript logger: a durable JSON record of one chat session.
//!
//! One file per session, named `conversation_<YYYY.MM.DD_HH.MM.SS>.json`,
//! written into the documents folder so past conversations become
//! retrievable context for later sessions.
//!
//! Every mutation is a full read-modify-write of the file. That is only
//! correct with a single writer, so mutating methods take `&mut self` and the
//! response pipeline owns the logger.

use chrono::NaiveDateTime;
use mira_core::error::TranscriptError;
use mira_core::persona::TIMESTAMP_FORMAT;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File name timestamp format.
pub const FILE_TIMESTAMP_FORMAT: &str = "%Y.%m.%d_%H.%M.%S";

/// The on-disk record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptRecord {
    pub context: Vec<ContextEntry>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default)]
    pub messages: Vec<TranscriptMessage>,

    /// Keys written by someone else are carried through untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Session metadata in the `context` array.
///
/// Stored as the raw JSON object so keys this crate does not know about are
/// written back exactly as they were read.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextEntry(pub serde_json::Map<String, serde_json::Value>);

impl ContextEntry {
    pub fn start_datetime(value: impl Into<String>) -> Self {
        Self::single("start_datetime", value.into())
    }

    pub fn info(value: impl Into<String>) -> Self {
        Self::single("info", value.into())
    }

    fn single(key: &str, value: String) -> Self {
        let mut map = serde_json::Map::new();
        map.insert(key.to_string(), serde_json::Value::String(value));
        Self(map)
    }

    /// A string-valued key of this entry.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.as_str())
    }
}

/// One logged message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptMessage {
    pub speaker: String,
    pub message: String,
}

impl TranscriptMessage {
    pub fn new(speaker: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            message: message.into(),
        }
    }
}

/// Owns one transcript file.
#[derive(Debug)]
pub struct TranscriptLogger {
    path: PathBuf,
}

impl TranscriptLogger {
    /// Create a new transcript in `dir` for a session starting at `now`.
    ///
    /// Creates `dir` if missing. Never overwrites an existing file.
    pub fn create(dir: &Path, user_name: &str, now: NaiveDateTime) -> Result<Self, TranscriptError> {
        std::fs::create_dir_all(dir).map_err(|source| TranscriptError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let path = dir.join(format!(
            "conversation_{}.json",
            now.format(FILE_TIMESTAMP_FORMAT)
        ));

        let record = TranscriptRecord {
            context: vec![
                ContextEntry::start_datetime(now.format(TIMESTAMP_FORMAT).to_string()),
                ContextEntry::info(format!("Conversation with {user_name}.")),
            ],
            title: None,
            messages: Vec::new(),
            extra: serde_json::Map::new(),
        };

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|source| match source.kind() {
                ErrorKind::AlreadyExists => TranscriptError::AlreadyExists(path.clone()),
                _ => TranscriptError::Io {
                    path: path.clone(),
                    source,
                },
            })?;

        let json = to_pretty(&path, &record)?;
        file.write_all(json.as_bytes())
            .map_err(|source| TranscriptError::Io {
                path: path.clone(),
                source,
            })?;

        info!(path = %path.display(), "Conversation file created");
        Ok(Self { path })
    }

    /// Open an existing transcript for appending.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, TranscriptError> {
        let path = path.into();
        Self::read_from(&path)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one message at the end.
    pub fn append(&mut self, speaker: &str, message: &str) -> Result<(), TranscriptError> {
        self.update(|record| {
            record
                .messages
                .push(TranscriptMessage::new(speaker, message));
        })?;
        debug!(speaker, "Message saved");
        Ok(())
    }

    /// Set or replace the session title.
    pub fn set_title(&mut self, title: &str) -> Result<(), TranscriptError> {
        self.update(|record| record.title = Some(title.to_string()))?;
        info!(title, "Conversation title updated");
        Ok(())
    }

    /// Read the current record from disk.
    pub fn read(&self) -> Result<TranscriptRecord, TranscriptError> {
        Self::read_from(&self.path)
    }

    pub fn read_from(path: &Path) -> Result<TranscriptRecord, TranscriptError> {
        let content = std::fs::read_to_string(path).map_err(|source| TranscriptError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|e| TranscriptError::Corrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    fn update(&mut self, f: impl FnOnce(&mut TranscriptRecord)) -> Result<(), TranscriptError> {
        let mut record = self.read()?;
        f(&mut record);
        let json = to_pretty(&self.path, &record)?;
        std::fs::write(&self.path, json).map_err(|source| TranscriptError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

fn to_pretty(path: &Path, record: &TranscriptRecord) -> Result<String, TranscriptError> {
    serde_json::to_string_pretty(record).map_err(|e| TranscriptError::Corrupt {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
