//! EPUB access for folio.
//!
//! - [`EpubBook`]: documents, Dublin Core metadata, table of contents, write-back
//! - [`head_links`]: stylesheet link preservation across rewrites
//! - [`markup`]: the lenient tokenizer shared with the translation pipeline

pub mod book;
pub mod head_links;
pub mod markup;
pub mod opf;
pub mod package;
pub mod toc;

pub use book::{Document, EpubBook};
pub use head_links::{preserve_head_links, HeadLink};
pub use package::EpubPackage;
pub use toc::{TocEntry, TocLink, TocSection};

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;
