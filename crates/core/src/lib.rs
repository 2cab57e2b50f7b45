//! # Mira Core
//!
//! Domain types, traits, and error definitions for the Mira chat companion.
//! This crate has no I/O-heavy dependencies. It defines the domain model
//! that the provider, memory, and agent crates implement against.
//!
//! - [`Provider`] abstracts the LLM / embedding endpoint
//! - [`Chunk`] is the unit of retrievable knowledge
//! - [`Persona`] composes the system-level instruction for every turn

pub mod document;
pub mod error;
pub mod message;
pub mod persona;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use document::{Chunk, ScoredChunk};
pub use error::{Error, Result};
pub use message::{Message, Role};
pub use persona::{Persona, compose};
pub use provider::{Provider, ProviderRequest, ProviderResponse};
