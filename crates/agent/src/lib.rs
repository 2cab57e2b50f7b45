//! The response pipeline: the heart of Mira.
//!
//! One user turn follows a fixed sequence:
//!
//! 1. **Retrieve** the top-k document chunks for the utterance
//! 2. **Assemble** the prompt: persona + retrieved context, prior turns, new turn
//! 3. **Generate** with one model call
//! 4. **Record** the turn pair in conversation memory and the transcript
//!
//! A failure in steps 1–3 leaves no trace of the turn anywhere.

pub mod pipeline;

pub use pipeline::{PipelineSettings, Reply, ResponsePipeline};

#[cfg(test)]
pub(crate) mod test_helpers;
