//! Prompt assembly for retrieval-augmented responses

pub mod prompt;

pub use prompt::{AssembledPrompt, PromptBuilder, ResponseAssembler};
