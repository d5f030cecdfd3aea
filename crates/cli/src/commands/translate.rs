//! Translate command handler.

use clap::Args;
use folio_core::{config::AppConfig, AppError, AppResult};
use folio_epub::EpubBook;
use folio_llm::create_client;
use folio_prompt::{load_prompt, PromptDefinition};
use folio_translate::{
    generate_book_filename, BookOptions, BookTranslator, ChapterTranslator, ChunkTranslator,
    PriceEstimate, ProgressReporter, TranslationConfig,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Translate the book
#[derive(Args, Debug)]
pub struct TranslateCommand {
    /// Input EPUB file
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output file path. By default it is generated as
    /// <title>_<author>_<model>_t<temperature>_<to_lang>.epub
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Starting chapter for translation
    #[arg(long, default_value_t = 0)]
    pub from_chapter: usize,

    /// Ending chapter for translation
    #[arg(long, default_value_t = 9999)]
    pub to_chapter: usize,

    /// Source language
    #[arg(long, default_value = "EN")]
    pub from_lang: String,

    /// Target language
    #[arg(long, default_value = "PL")]
    pub to_lang: String,

    /// Leave the table of contents untranslated
    #[arg(long)]
    pub no_toc: bool,

    /// Chunks of a chapter translated at the same time
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Directory for translated chunk dumps
    #[arg(long)]
    pub scratch_dir: Option<PathBuf>,
}

impl TranslateCommand {
    fn options(&self) -> BookOptions {
        BookOptions {
            from_chapter: self.from_chapter,
            to_chapter: self.to_chapter,
            from_lang: self.from_lang.clone(),
            to_lang: self.to_lang.clone(),
            translate_toc: !self.no_toc,
        }
    }

    fn effective_config(&self, config: &AppConfig) -> AppConfig {
        let mut config = config.clone();
        if let Some(concurrency) = self.concurrency {
            config.translation.concurrency = concurrency;
        }
        if let Some(ref dir) = self.scratch_dir {
            config.translation.scratch_dir = Some(dir.clone());
        }
        config
    }

    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing translate command");
        tracing::debug!("Translate options: {:?}", self);

        let config = self.effective_config(config);
        config.validate()?;
        if self.from_chapter > self.to_chapter {
            return Err(AppError::Config(format!(
                "Empty chapter range: {}..{}",
                self.from_chapter, self.to_chapter
            )));
        }

        // 1. Prompt
        let prompt = match config.translation.prompt_file {
            Some(ref path) => load_prompt(path)?,
            None => PromptDefinition::default(),
        };
        tracing::debug!("Using prompt: {}", prompt.id);

        // 2. Client
        let api_key = config.resolve_api_key();
        let client = create_client(
            &config.provider,
            config.endpoint().as_deref(),
            api_key.as_deref(),
            config.timeout_secs().map(Duration::from_secs),
        )?;

        // 3. Pipeline
        let translation = TranslationConfig::from_app_config(&config);
        tracing::info!(
            "Translating with {} ({}), temperature {}, chunks of {} characters",
            client.provider_name(),
            translation.model,
            translation.temperature,
            translation.max_chunk_size
        );

        let progress = ProgressReporter::new(Arc::new(|event| {
            println!("{}", event.format_simple());
        }));
        let chunks = ChunkTranslator::new(client, prompt, translation.clone())
            .with_progress(progress.clone());
        let chapters = ChapterTranslator::new(chunks).with_progress(progress.clone());
        let translator = BookTranslator::new(chapters).with_progress(progress);

        // 4. Book
        let mut book = EpubBook::open(&self.input)?;
        let output = self.output.clone().unwrap_or_else(|| {
            PathBuf::from(generate_book_filename(
                &self.to_lang,
                &translation.model,
                translation.temperature,
                book.title(),
                book.author(),
            ))
        });

        let report = translator.translate_book(&mut book, &self.options()).await?;

        book.write(&output)?;
        println!("Translation completed. Output file: {}", output.display());

        let usage = translator.chapter_translator().chunk_translator().usage();
        let cost = PriceEstimate::new(&translation.model, usage.prompt_tokens, usage.completion_tokens);
        println!(
            "Tokens: {} prompt, {} completion ({} requests, {} retries). {}",
            usage.prompt_tokens,
            usage.completion_tokens,
            usage.calls,
            usage.retries,
            cost.format_line()
        );

        match report.failure {
            Some(failure) => Err(AppError::Translation(format!(
                "Chapter {} ({}) failed: {}. Translated {} of {} chapters before stopping",
                failure.chapter,
                failure.name,
                failure.error,
                report.chapters_translated,
                report.chapters_total
            ))),
            None => Ok(()),
        }
    }
}
