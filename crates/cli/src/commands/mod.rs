//! Command handlers for the folio CLI.

pub mod show_chapters;
pub mod show_chunks;
pub mod translate;

// Re-export command types for convenience
pub use show_chapters::ShowChaptersCommand;
pub use show_chunks::ShowChunksCommand;
pub use translate::TranslateCommand;
