//! Retrieval and memory for Mira.
//!
//! - [`loader`] walks a directory tree and turns files into [`Chunk`]s
//! - [`splitter`] is the recursive character splitter used by the loader
//! - [`index`] embeds chunks and answers top-k similarity queries
//! - [`conversation`] is the in-process turn history
//! - [`transcript`] is the durable JSON record of a session
//!
//! [`Chunk`]: mira_core::Chunk

pub mod conversation;
pub mod embedder;
pub mod file_tree;
pub mod index;
pub mod loader;
pub mod splitter;
pub mod transcript;
pub mod vector;

pub use conversation::{ConversationMemory, Turn};
pub use embedder::{Embedder, ProviderEmbedder};
#[cfg(feature = "local")]
pub use embedder::LocalEmbedder;
pub use file_tree::{render_file_tree, write_file_tree};
pub use index::VectorIndex;
pub use loader::{DocumentLoader, LoadReport, LoaderOptions};
pub use splitter::RecursiveSplitter;
pub use transcript::{ContextEntry, TranscriptLogger, TranscriptMessage, TranscriptRecord};
pub use vector::{cosine_similarity, rank_by_similarity};
