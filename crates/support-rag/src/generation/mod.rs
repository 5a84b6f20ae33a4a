//! Prompt templates and citation handling

pub mod citation;
pub mod prompt;

pub use citation::{citations_for, truncate_excerpt};
pub use prompt::{PromptBuilder, StagePrompt};
