//! Whole-book translation.
//!
//! Sets the target language, translates the table of contents, then walks
//! the documents in order. The first chapter that fails stops the run;
//! chapters already translated keep their translation and the rest stay as
//! they were.

use crate::chapter::ChapterTranslator;
use crate::chunk::TranslationContext;
use crate::lang::{full_language_name, normalize_tag};
use crate::progress::ProgressReporter;
use crate::toc::translate_toc;
use folio_core::{AppError, AppResult};
use folio_epub::{preserve_head_links, EpubBook};
use folio_prompt::book_details;

/// What to translate.
#[derive(Debug, Clone)]
pub struct BookOptions {
    /// First chapter to translate (1-based, inclusive)
    pub from_chapter: usize,
    /// Last chapter to translate (inclusive)
    pub to_chapter: usize,
    pub from_lang: String,
    pub to_lang: String,
    pub translate_toc: bool,
}

impl Default for BookOptions {
    fn default() -> Self {
        Self {
            from_chapter: 0,
            to_chapter: 9999,
            from_lang: "EN".to_string(),
            to_lang: "PL".to_string(),
            translate_toc: true,
        }
    }
}

impl BookOptions {
    pub fn includes(&self, chapter: usize) -> bool {
        (self.from_chapter..=self.to_chapter).contains(&chapter)
    }
}

/// The chapter that stopped a run.
#[derive(Debug)]
pub struct ChapterFailure {
    pub chapter: usize,
    pub name: String,
    pub error: AppError,
}

#[derive(Debug, Default)]
pub struct BookReport {
    pub chapters_total: usize,
    pub chapters_translated: usize,
    pub toc_translated: bool,
    pub failure: Option<ChapterFailure>,
}

impl BookReport {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }
}

pub struct BookTranslator {
    chapters: ChapterTranslator,
    progress: ProgressReporter,
}

impl BookTranslator {
    pub fn new(chapters: ChapterTranslator) -> Self {
        Self {
            chapters,
            progress: ProgressReporter::noop(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    pub fn chapter_translator(&self) -> &ChapterTranslator {
        &self.chapters
    }

    /// Translate `book` in place.
    ///
    /// Errors before the chapter loop (metadata, table of contents) are
    /// returned; a failing chapter is recorded in the report instead.
    pub async fn translate_book(
        &self,
        book: &mut EpubBook,
        options: &BookOptions,
    ) -> AppResult<BookReport> {
        let ctx = TranslationContext::new(
            full_language_name(&options.from_lang),
            full_language_name(&options.to_lang),
        )
        .with_book_details(book_details(book.title(), book.author()));

        book.set_language(&normalize_tag(&options.to_lang))?;

        let sample = self.chapters.chunk_translator().render_prompt("...", &ctx)?;
        let indented: Vec<String> = sample.system.lines().map(|l| format!("\t{}", l)).collect();
        tracing::info!("Prompt sample:\n{}", indented.join("\n"));

        let mut report = BookReport {
            chapters_total: book.documents().len(),
            ..Default::default()
        };

        if options.translate_toc {
            match book.toc() {
                Some(entries) => {
                    let entries = entries.to_vec();
                    self.progress.toc(entries.len());
                    let translated = translate_toc(&self.chapters, &entries, &ctx).await?;
                    book.set_toc(translated)?;
                    report.toc_translated = true;
                }
                None => tracing::info!("Book has no table of contents"),
            }
        }

        let total = report.chapters_total;
        for (idx, doc) in book.documents_mut().iter_mut().enumerate() {
            let chapter = idx + 1;
            preserve_head_links(doc);

            if !options.includes(chapter) {
                continue;
            }

            tracing::info!("Processing chapter {}/{}...", chapter, total);
            self.progress.chapter(chapter, total, &doc.name);

            let result = self
                .chapters
                .translate_chapter(doc.content(), chapter, &ctx)
                .await;
            match result {
                Ok(translated) => {
                    doc.set_content(translated);
                    report.chapters_translated += 1;
                }
                Err(error) => {
                    tracing::error!("Error translating chapter {}: {}", chapter, error);
                    report.failure = Some(ChapterFailure {
                        chapter,
                        name: doc.name.clone(),
                        error,
                    });
                    break;
                }
            }
        }

        let usage = self.chapters.chunk_translator().usage();
        tracing::info!(
            calls = usage.calls,
            retries = usage.retries,
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            "Translated {}/{} chapters",
            report.chapters_translated,
            total
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::ChunkTranslator;
    use crate::config::TranslationConfig;
    use crate::testing::ScriptedCompleter;
    use folio_epub::fixtures::{book_bytes, chapter};
    use folio_prompt::PromptDefinition;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    fn translator(client: Arc<ScriptedCompleter>) -> BookTranslator {
        BookTranslator::new(ChapterTranslator::new(ChunkTranslator::new(
            client,
            PromptDefinition::default(),
            TranslationConfig::new("gpt-4o-mini"),
        )))
    }

    fn polish() -> Arc<ScriptedCompleter> {
        Arc::new(ScriptedCompleter::mapping(|p| {
            p.replace("Line", "Linia").replace("Chapter", "Rozdział")
        }))
    }

    #[tokio::test]
    async fn test_chapter_range_filtering() {
        let client = polish();
        let mut book = EpubBook::from_bytes(book_bytes(5)).unwrap();
        let options = BookOptions {
            from_chapter: 2,
            to_chapter: 3,
            translate_toc: false,
            ..Default::default()
        };

        let report = translator(client.clone())
            .translate_book(&mut book, &options)
            .await
            .unwrap();

        assert!(report.is_complete());
        assert_eq!(report.chapters_total, 5);
        assert_eq!(report.chapters_translated, 2);
        assert_eq!(client.calls(), 2);

        let docs = book.documents();
        for n in [1, 4, 5] {
            assert_eq!(docs[n - 1].content(), chapter(n));
            assert!(!docs[n - 1].is_modified());
        }
        for n in [2, 3] {
            assert_ne!(docs[n - 1].content(), chapter(n));
            assert!(docs[n - 1].content().contains("Linia one of chapter"));
            // Head is left alone
            assert!(docs[n - 1].content().contains("<title>Chapter"));
        }
    }

    #[tokio::test]
    async fn test_fail_fast_keeps_earlier_chapters() {
        let client = Arc::new(
            ScriptedCompleter::mapping(|p| p.replace("Line", "Linia"))
                .failing_when(|p| p.contains("of chapter 3.")),
        );
        let mut book = EpubBook::from_bytes(book_bytes(5)).unwrap();
        let options = BookOptions {
            translate_toc: false,
            ..Default::default()
        };

        let report = translator(client.clone())
            .translate_book(&mut book, &options)
            .await
            .unwrap();

        let failure = report.failure.as_ref().unwrap();
        assert_eq!(failure.chapter, 3);
        assert_eq!(failure.name, "OEBPS/text/ch3.xhtml");
        assert!(matches!(failure.error, AppError::Llm(_)));
        assert_eq!(report.chapters_translated, 2);
        assert_eq!(client.calls(), 3);

        let docs = book.documents();
        assert!(docs[0].content().contains("Linia"));
        assert!(docs[1].content().contains("Linia"));
        for n in [3, 4, 5] {
            assert_eq!(docs[n - 1].content(), chapter(n));
        }
    }

    #[tokio::test]
    async fn test_translate_book_with_toc_and_metadata() {
        let client = polish();
        let mut book = EpubBook::from_bytes(book_bytes(2)).unwrap();
        let options = BookOptions {
            to_lang: "pt-br".to_string(),
            ..Default::default()
        };

        let report = translator(client.clone())
            .translate_book(&mut book, &options)
            .await
            .unwrap();

        assert!(report.toc_translated);
        assert_eq!(book.language(), Some("pt-BR"));
        let titles: Vec<_> = book.toc().unwrap().iter().map(|e| e.title().to_string()).collect();
        assert_eq!(titles, vec!["Rozdział 1", "Rozdział 2"]);

        // ToC first, then one call per chapter
        let requests = client.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].prompt, "Chapter 1\nChapter 2");
        let system = requests[1].system.as_deref().unwrap();
        assert!(system.contains("from English to Brazilian Portuguese"));
        assert!(system.contains("The book title is 'Test Book'."));
        assert!(system.contains("The book author is 'Test Author'."));
    }

    #[tokio::test]
    async fn test_written_book_round_trip() {
        let client = polish();
        let mut book = EpubBook::from_bytes(book_bytes(3)).unwrap();
        let options = BookOptions {
            from_chapter: 1,
            to_chapter: 1,
            ..Default::default()
        };
        translator(client)
            .translate_book(&mut book, &options)
            .await
            .unwrap();

        let temp = TempDir::new().unwrap();
        let out = temp.path().join("out.epub");
        book.write(&out).unwrap();

        let reread = EpubBook::open(&out).unwrap();
        assert_eq!(reread.language(), Some("pl"));
        assert_eq!(reread.toc().unwrap()[2].title(), "Rozdział 3");
        let first = reread.documents()[0].content();
        assert!(first.contains("<h1 id=\"c1\">Rozdział 1</h1>"));
        assert!(first.contains("<link href=\"../style.css\" rel=\"stylesheet\" type=\"text/css\"/>"));
        assert_eq!(reread.documents()[1].content(), chapter(2));
    }

    #[tokio::test]
    async fn test_progress_events() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let progress = ProgressReporter::new(Arc::new(move |event| {
            sink.lock().unwrap().push(event.phase);
        }));

        let mut book = EpubBook::from_bytes(book_bytes(2)).unwrap();
        translator(polish())
            .with_progress(progress)
            .translate_book(&mut book, &BookOptions::default())
            .await
            .unwrap();

        assert_eq!(*events.lock().unwrap(), vec!["toc", "chapter", "chapter"]);
    }

    #[tokio::test]
    async fn test_toc_mismatch_is_returned() {
        let client = Arc::new(ScriptedCompleter::queued(vec!["Rozdział 1 Rozdział 2".to_string()]));
        let mut book = EpubBook::from_bytes(book_bytes(2)).unwrap();

        let err = translator(client)
            .translate_book(&mut book, &BookOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::TocMismatch { links: 2, titles: 1 }));
        assert_eq!(book.toc().unwrap()[0].title(), "Chapter 1");
    }
}
