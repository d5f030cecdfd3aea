//! Translation pipeline for folio.
//!
//! Chapter bodies flow through four stages:
//! - [`attributes`]: attribute values are swapped for short placeholders
//! - [`splitter`]: the minified body is cut into newline-aligned chunks
//! - [`ChunkTranslator`]: each chunk is translated, with a line-count check and bounded retry
//! - [`ChapterTranslator`]: chunks are re-joined, attributes restored and the body grafted back
//!
//! [`BookTranslator`] drives a whole book: target language metadata, the
//! table of contents, and the chapters in the requested range.

pub mod attributes;
pub mod book;
pub mod chapter;
pub mod chunk;
pub mod config;
pub mod lang;
pub mod naming;
pub mod preview;
pub mod pricing;
pub mod progress;
pub mod scratch;
pub mod splitter;
pub mod toc;

#[cfg(test)]
mod testing;

// Re-export main types
pub use attributes::{minify, restore, AttributeMap};
pub use book::{BookOptions, BookReport, BookTranslator, ChapterFailure};
pub use chapter::{prepare_body, ChapterTranslator, PreparedBody};
pub use chunk::{ChunkTranslator, TranslationContext, UsageTotals};
pub use config::{RetryPolicy, TranslationConfig};
pub use lang::{full_language_name, normalize_tag};
pub use naming::{generate_book_filename, sanitize_text};
pub use pricing::{calculate_price, estimate_tokens, PriceEstimate, TokenKind};
pub use progress::{ProgressEvent, ProgressReporter};
pub use scratch::ScratchWriter;
pub use splitter::{split_by_newline, DEFAULT_MAX_CHUNK_SIZE};
pub use toc::translate_toc;
