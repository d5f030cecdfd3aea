//! Translation of a single chunk.
//!
//! The model occasionally drops, merges or duplicates lines. Line-count
//! parity between source and response is used as a cheap corruption check:
//! a response more than one line off is logged, and a large enough relative
//! difference on a long chunk is sent again, up to the retry limit. After
//! that the last response is accepted as is.

use crate::config::TranslationConfig;
use crate::progress::ProgressReporter;
use folio_core::AppResult;
use folio_llm::{CompletionRequest, TextCompleter, Usage};
use folio_prompt::{build_prompt, BuiltPrompt, PromptDefinition, TranslationVars};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Language pair and book context shared by every chunk of a run.
#[derive(Debug, Clone, Default)]
pub struct TranslationContext {
    /// Full source language name (e.g., "English")
    pub from_lang: String,
    /// Full target language name (e.g., "Polish")
    pub to_lang: String,
    /// Rendered title/author block, possibly empty
    pub book_details: String,
}

impl TranslationContext {
    pub fn new(from_lang: impl Into<String>, to_lang: impl Into<String>) -> Self {
        Self {
            from_lang: from_lang.into(),
            to_lang: to_lang.into(),
            book_details: String::new(),
        }
    }

    pub fn with_book_details(mut self, book_details: impl Into<String>) -> Self {
        self.book_details = book_details.into();
        self
    }
}

/// Completion calls and tokens spent so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UsageTotals {
    pub calls: u64,
    pub retries: u64,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

impl UsageTotals {
    pub fn total_tokens(&self) -> u64 {
        self.prompt_tokens + self.completion_tokens
    }
}

#[derive(Debug, Default)]
struct UsageCounters {
    calls: AtomicU64,
    retries: AtomicU64,
    prompt_tokens: AtomicU64,
    completion_tokens: AtomicU64,
}

pub struct ChunkTranslator {
    client: Arc<dyn TextCompleter>,
    prompt: PromptDefinition,
    config: TranslationConfig,
    progress: ProgressReporter,
    usage: UsageCounters,
}

fn count_lines(text: &str) -> usize {
    text.matches('\n').count()
}

impl ChunkTranslator {
    pub fn new(
        client: Arc<dyn TextCompleter>,
        prompt: PromptDefinition,
        config: TranslationConfig,
    ) -> Self {
        Self {
            client,
            prompt,
            config,
            progress: ProgressReporter::noop(),
            usage: UsageCounters::default(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &TranslationConfig {
        &self.config
    }

    pub fn provider_name(&self) -> &str {
        self.client.provider_name()
    }

    pub fn usage(&self) -> UsageTotals {
        UsageTotals {
            calls: self.usage.calls.load(Ordering::Relaxed),
            retries: self.usage.retries.load(Ordering::Relaxed),
            prompt_tokens: self.usage.prompt_tokens.load(Ordering::Relaxed),
            completion_tokens: self.usage.completion_tokens.load(Ordering::Relaxed),
        }
    }

    fn record(&self, usage: &Usage) {
        self.usage.calls.fetch_add(1, Ordering::Relaxed);
        self.usage
            .prompt_tokens
            .fetch_add(u64::from(usage.prompt_tokens), Ordering::Relaxed);
        self.usage
            .completion_tokens
            .fetch_add(u64::from(usage.completion_tokens), Ordering::Relaxed);
    }

    /// Render the prompt for some source text.
    pub fn render_prompt(&self, source_text: &str, ctx: &TranslationContext) -> AppResult<BuiltPrompt> {
        build_prompt(
            &self.prompt,
            TranslationVars {
                from_lang: ctx.from_lang.clone(),
                to_lang: ctx.to_lang.clone(),
                book_details: ctx.book_details.clone(),
                source_text: source_text.to_string(),
            },
        )
    }

    fn request(&self, source_text: &str, ctx: &TranslationContext) -> AppResult<CompletionRequest> {
        let built = self.render_prompt(source_text, ctx)?;

        let mut request = CompletionRequest::new(built.user, &self.config.model)
            .with_system(built.system)
            .with_temperature(self.config.temperature);
        if let Some(max_tokens) = self.config.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }
        Ok(request)
    }

    /// Translate one chunk.
    ///
    /// Provider errors are returned unchanged; corrupted responses are only
    /// retried, never turned into errors.
    pub async fn translate(&self, chunk: &str, ctx: &TranslationContext) -> AppResult<String> {
        if chunk.trim().is_empty() {
            return Ok(chunk.to_string());
        }

        let escape = self.config.escape_source;
        let source = if escape {
            html_escape::encode_text(chunk).into_owned()
        } else {
            chunk.to_string()
        };
        let request = self.request(&source, ctx)?;

        let policy = self.config.retry;
        let source_lines = count_lines(chunk);
        let mut retries = 0u32;

        loop {
            let completion = self.client.complete(&request).await?;
            self.record(&completion.usage);
            tracing::debug!(
                prompt_tokens = completion.usage.prompt_tokens,
                completion_tokens = completion.usage.completion_tokens,
                total_tokens = completion.usage.total_tokens,
                "Chunk completion"
            );

            let translated = if escape {
                html_escape::decode_html_entities(&completion.content).into_owned()
            } else {
                completion.content
            };
            let translated_lines = count_lines(&translated);

            if policy.is_discrepant(source_lines, translated_lines) {
                tracing::warn!(
                    "The number of lines in the original text ({}) and the translated text ({}) are different",
                    source_lines,
                    translated_lines
                );

                if policy.should_retry(retries, source_lines, translated_lines) {
                    retries += 1;
                    self.usage.retries.fetch_add(1, Ordering::Relaxed);
                    tracing::info!("Retrying translation, attempt {}/{}", retries, policy.limit);
                    self.progress
                        .retry(retries, policy.limit, source_lines, translated_lines);
                    continue;
                }
            }

            return Ok(translated);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryPolicy;
    use crate::testing::{numbered_lines, ScriptedCompleter};
    use folio_core::AppError;

    fn translator(client: Arc<ScriptedCompleter>) -> ChunkTranslator {
        ChunkTranslator::new(
            client,
            PromptDefinition::default(),
            TranslationConfig::new("gpt-4o-mini"),
        )
    }

    fn ctx() -> TranslationContext {
        TranslationContext::new("English", "Polish")
    }

    #[tokio::test]
    async fn test_translate_returns_response() {
        let client = Arc::new(ScriptedCompleter::queued(vec!["<p>Cześć</p>".to_string()]));
        let result = translator(client.clone())
            .translate("<p>Hello</p>", &ctx())
            .await
            .unwrap();

        assert_eq!(result, "<p>Cześć</p>");
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_request_carries_prompt_and_settings() {
        let client = Arc::new(ScriptedCompleter::echo());
        let mut config = TranslationConfig::new("gpt-4o-mini");
        config.max_tokens = Some(16_384);
        let chunks = ChunkTranslator::new(client.clone(), PromptDefinition::default(), config);

        chunks.translate("<p>Hello</p>", &ctx()).await.unwrap();

        let request = &client.requests()[0];
        assert_eq!(request.prompt, "<p>Hello</p>");
        assert_eq!(request.model, "gpt-4o-mini");
        assert_eq!(request.temperature, Some(0.2));
        assert_eq!(request.max_tokens, Some(16_384));
        let system = request.system.as_deref().unwrap();
        assert!(system.contains("from English to Polish"));
        assert!(system.contains("PLEASE RETURN ONLY Polish TRANSLATION."));
    }

    #[tokio::test]
    async fn test_retry_is_bounded() {
        // Every response loses most of the lines
        let client = Arc::new(ScriptedCompleter::mapping(|_| "<p>short</p>".to_string()));
        let chunks = translator(client.clone());

        let result = chunks.translate(&numbered_lines(20), &ctx()).await.unwrap();

        assert_eq!(result, "<p>short</p>");
        assert_eq!(client.calls(), 4);
        assert_eq!(chunks.usage().calls, 4);
        assert_eq!(chunks.usage().retries, 3);
    }

    #[tokio::test]
    async fn test_retry_stops_once_line_count_matches() {
        let source = numbered_lines(20);
        let client = Arc::new(ScriptedCompleter::queued(vec![
            "<p>short</p>".to_string(),
            source.replace("Line", "Linia"),
        ]));
        let chunks = translator(client.clone());

        let result = chunks.translate(&source, &ctx()).await.unwrap();

        assert_eq!(result, source.replace("Line", "Linia"));
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test]
    async fn test_small_mismatch_is_accepted() {
        // 2 lines in, 3 lines out: difference of one line
        let client = Arc::new(ScriptedCompleter::queued(vec!["a\nb\nc\nd".to_string()]));
        let result = translator(client.clone())
            .translate("x\ny\nz", &ctx())
            .await
            .unwrap();

        assert_eq!(result, "a\nb\nc\nd");
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_short_chunks_are_not_retried() {
        // 10 source lines is not above the minimum
        let source = numbered_lines(11);
        let client = Arc::new(ScriptedCompleter::mapping(|_| "one line".to_string()));
        let result = translator(client.clone())
            .translate(&source, &ctx())
            .await
            .unwrap();

        assert_eq!(result, "one line");
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_custom_retry_policy() {
        let client = Arc::new(ScriptedCompleter::mapping(|_| String::new()));
        let config = TranslationConfig::new("m").with_retry(RetryPolicy {
            limit: 1,
            min_lines: 2,
            max_line_diff_ratio: 0.5,
        });
        let chunks = ChunkTranslator::new(client.clone(), PromptDefinition::default(), config);

        chunks.translate("a\nb\nc\nd", &ctx()).await.unwrap();
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let client = Arc::new(ScriptedCompleter::echo().failing_when(|_| true));
        let err = translator(client.clone())
            .translate("<p>Hello</p>", &ctx())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Llm(_)));
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_escape_source_round_trip() {
        let client = Arc::new(ScriptedCompleter::echo());
        let config = TranslationConfig::new("m").with_escape_source(true);
        let chunks = ChunkTranslator::new(client.clone(), PromptDefinition::default(), config);

        let result = chunks.translate("<p>Fish & chips</p>", &ctx()).await.unwrap();

        assert_eq!(client.requests()[0].prompt, "&lt;p&gt;Fish &amp; chips&lt;/p&gt;");
        assert_eq!(result, "<p>Fish & chips</p>");
    }

    #[tokio::test]
    async fn test_response_used_verbatim_without_escaping() {
        let client = Arc::new(ScriptedCompleter::echo());
        let result = translator(client)
            .translate("<p>Fish &amp; chips</p>", &ctx())
            .await
            .unwrap();
        assert_eq!(result, "<p>Fish &amp; chips</p>");
    }

    #[tokio::test]
    async fn test_blank_chunk_skips_completion() {
        let client = Arc::new(ScriptedCompleter::echo());
        let result = translator(client.clone()).translate("\n  \n", &ctx()).await.unwrap();
        assert_eq!(result, "\n  \n");
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_book_details_reach_system_prompt() {
        let client = Arc::new(ScriptedCompleter::echo());
        let ctx = ctx().with_book_details(folio_prompt::book_details(Some("Emma"), None));
        translator(client.clone()).translate("x", &ctx).await.unwrap();

        let system = client.requests()[0].system.clone().unwrap();
        assert!(system.contains("The book title is 'Emma'."));
    }
}
