//! Show-chunks command handler.
//!
//! Previews what the translate command would send: each chapter body is
//! minified and split exactly as in a real run.

use clap::Args;
use folio_core::{config::AppConfig, AppResult};
use folio_epub::EpubBook;
use folio_translate::preview::chunk_excerpt;
use folio_translate::pricing::has_known_price;
use folio_translate::{estimate_tokens, prepare_body, PriceEstimate};
use std::path::PathBuf;

/// Show the chunks of the book chapters and estimated prices for each
#[derive(Args, Debug)]
pub struct ShowChunksCommand {
    /// Input EPUB file
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output a JSON summary instead of the chunk listing
    #[arg(long)]
    pub json: bool,
}

struct DocumentChunks {
    name: String,
    chunks: Vec<String>,
    tokens: u64,
}

impl ShowChunksCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing show-chunks command");
        tracing::debug!("Show-chunks options: {:?}", self);

        let model = config.model();
        if !has_known_price(&model) {
            tracing::warn!("No price known for model {}; prices are shown as $0.00", model);
        }

        let book = EpubBook::open(&self.input)?;
        let max_chunk_size = config.translation.max_chunk_size.max(1);

        let documents: Vec<DocumentChunks> = book
            .documents()
            .iter()
            .map(|doc| {
                let chunks = prepare_body(doc.content(), max_chunk_size)
                    .map(|prepared| prepared.chunks)
                    .unwrap_or_default();
                let tokens = chunks.iter().map(|c| estimate_tokens(c)).sum();
                DocumentChunks {
                    name: doc.name.clone(),
                    chunks,
                    tokens,
                }
            })
            .collect();

        if self.json {
            return print_json(&model, &documents);
        }

        println!("Token counts are estimated at four characters per token.\n");
        for doc in &documents {
            println!("Document: {}", doc.name);
            for (idx, chunk) in doc.chunks.iter().enumerate() {
                println!(
                    "Chunk {}/{} (Tokens: {}):",
                    idx + 1,
                    doc.chunks.len(),
                    estimate_tokens(chunk)
                );
                println!("{}\n\n", chunk_excerpt(chunk));
            }
            println!("Total tokens in document: {}\n", doc.tokens);
            println!("{}", PriceEstimate::for_translation(&model, doc.tokens).format_line());
            println!("--------------------------------------------------\n");
        }

        let book_tokens: u64 = documents.iter().map(|d| d.tokens).sum();
        println!("Total tokens in book: {}", book_tokens);
        println!(
            "Total book {}",
            PriceEstimate::for_translation(&model, book_tokens)
                .format_line()
                .to_lowercase()
        );

        Ok(())
    }
}

fn print_json(model: &str, documents: &[DocumentChunks]) -> AppResult<()> {
    let book_tokens: u64 = documents.iter().map(|d| d.tokens).sum();
    let output = serde_json::json!({
        "model": model,
        "documents": documents
            .iter()
            .map(|doc| serde_json::json!({
                "name": doc.name,
                "chunks": doc.chunks.len(),
                "tokens": doc.tokens,
                "price": PriceEstimate::for_translation(model, doc.tokens),
            }))
            .collect::<Vec<_>>(),
        "tokens": book_tokens,
        "price": PriceEstimate::for_translation(model, book_tokens),
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_epub::fixtures::book_bytes;
    use tempfile::TempDir;

    #[test]
    fn test_show_chunks_runs_on_book() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("in.epub");
        std::fs::write(&input, book_bytes(2)).unwrap();

        for json in [false, true] {
            let cmd = ShowChunksCommand {
                input: input.clone(),
                json,
            };
            cmd.execute(&AppConfig::default()).unwrap();
        }
    }

    #[test]
    fn test_missing_input_is_io_error() {
        let cmd = ShowChunksCommand {
            input: PathBuf::from("/nonexistent/book.epub"),
            json: false,
        };
        assert!(cmd.execute(&AppConfig::default()).is_err());
    }
}
