//! Error types for folio.
//!
//! This module defines a unified error enum that covers all error categories
//! in the application: configuration, I/O, LLM providers, prompts, the EPUB
//! container, markup handling and the translation pipeline itself.

use thiserror::Error;

/// Unified error type for folio.
///
/// All fallible functions in the workspace return `Result<T, AppError>`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// LLM provider errors (transport, authentication, malformed responses)
    #[error("LLM error: {0}")]
    Llm(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// EPUB container, package document or navigation errors
    #[error("EPUB error: {0}")]
    Epub(String),

    /// Markup that could not be tokenized or grafted
    #[error("Markup error: {0}")]
    Markup(String),

    /// Translation pipeline errors
    #[error("Translation error: {0}")]
    Translation(String),

    /// Translated table of contents does not line up with the original links
    #[error(
        "Table of contents mismatch: {links} link entries but {titles} translated titles"
    )]
    TocMismatch { links: usize, titles: usize },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
