//! Prompt system for folio.
//!
//! This crate provides the translation prompt:
//! - A built-in translator persona, or a YAML definition loaded from disk
//! - Handlebars template rendering
//! - Book title/author context injection

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::{book_details, build_prompt, TranslationVars};
pub use loader::load_prompt;
pub use types::{BuiltPrompt, PromptDefinition};
