//! Show-chapters command handler.

use clap::Args;
use folio_core::AppResult;
use folio_epub::EpubBook;
use folio_translate::preview::chapter_beginning;
use std::path::PathBuf;

/// Characters of text shown per chapter.
const PREVIEW_CHARS: usize = 250;

/// Show the chapters of the book
#[derive(Args, Debug)]
pub struct ShowChaptersCommand {
    /// Input EPUB file
    #[arg(short, long)]
    pub input: PathBuf,
}

impl ShowChaptersCommand {
    pub fn execute(&self) -> AppResult<()> {
        tracing::info!("Executing show-chapters command");

        let book = EpubBook::open(&self.input)?;
        let total = book.documents().len();

        for (idx, doc) in book.documents().iter().enumerate() {
            println!(
                "▶ Chapter {}/{} ({} characters)",
                idx + 1,
                total,
                doc.content().chars().count()
            );
            println!("{}\n\n", chapter_beginning(doc.content(), PREVIEW_CHARS));
        }

        Ok(())
    }
}
