//! Immutable pipeline configuration.
//!
//! Built once from [`AppConfig`] and handed to the translators; nothing in
//! the pipeline reads the environment or the config file on its own.

use folio_core::AppConfig;
use folio_llm::{max_output_tokens, ProviderType};
use serde::Serialize;
use std::path::PathBuf;

use crate::splitter::DEFAULT_MAX_CHUNK_SIZE;

/// When a translated chunk is considered corrupted and sent again.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub limit: u32,

    /// Chunks with this many lines or fewer are never retried
    pub min_lines: usize,

    /// Relative line-count difference that triggers a retry
    pub max_line_diff_ratio: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            limit: 3,
            min_lines: 10,
            max_line_diff_ratio: 0.1,
        }
    }
}

impl RetryPolicy {
    /// Line counts more than one line apart are worth a warning.
    pub fn is_discrepant(&self, source_lines: usize, translated_lines: usize) -> bool {
        source_lines.abs_diff(translated_lines) > 1
    }

    /// Whether another attempt is allowed after `retries` retries.
    pub fn should_retry(&self, retries: u32, source_lines: usize, translated_lines: usize) -> bool {
        if retries >= self.limit || source_lines <= self.min_lines {
            return false;
        }
        let diff = source_lines.abs_diff(translated_lines) as f64;
        diff / source_lines as f64 > self.max_line_diff_ratio
    }

    /// Upper bound on completion calls for one chunk.
    pub fn max_attempts(&self) -> u32 {
        self.limit + 1
    }
}

/// Everything the translators need to know, fixed for a run.
#[derive(Debug, Clone, Serialize)]
pub struct TranslationConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub max_chunk_size: usize,
    pub retry: RetryPolicy,
    /// Chunks of one chapter translated at the same time (order is kept)
    pub concurrency: usize,
    /// HTML-escape chunks before sending and decode entities in the response
    pub escape_source: bool,
    /// Where translated chunks are dumped for inspection
    pub scratch_dir: Option<PathBuf>,
}

impl TranslationConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: 0.2,
            max_tokens: None,
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            retry: RetryPolicy::default(),
            concurrency: 1,
            escape_source: false,
            scratch_dir: None,
        }
    }

    pub fn from_app_config(config: &AppConfig) -> Self {
        let settings = &config.translation;
        let model = config.model();
        let max_tokens = config.max_tokens().or_else(|| {
            ProviderType::parse(&config.provider)
                .and_then(|provider| max_output_tokens(provider, &model))
        });

        Self {
            model,
            temperature: settings.temperature,
            max_tokens,
            max_chunk_size: settings.max_chunk_size.max(1),
            retry: RetryPolicy {
                limit: settings.retry_limit,
                min_lines: settings.min_lines_for_retry,
                max_line_diff_ratio: settings.max_line_diff_ratio,
            },
            concurrency: settings.concurrency.max(1),
            escape_source: settings.escape_source,
            scratch_dir: settings.scratch_dir.clone(),
        }
    }

    pub fn with_max_chunk_size(mut self, max_chunk_size: usize) -> Self {
        self.max_chunk_size = max_chunk_size.max(1);
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_escape_source(mut self, escape_source: bool) -> Self {
        self.escape_source = escape_source;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_difference_is_not_discrepant() {
        let policy = RetryPolicy::default();
        assert!(!policy.is_discrepant(2, 3));
        assert!(!policy.is_discrepant(20, 19));
        assert!(policy.is_discrepant(20, 18));
    }

    #[test]
    fn test_should_retry_thresholds() {
        let policy = RetryPolicy::default();
        // Too few source lines
        assert!(!policy.should_retry(0, 10, 2));
        // 2/20 = 10% is not above the ratio
        assert!(!policy.should_retry(0, 20, 18));
        // 3/20 = 15%
        assert!(policy.should_retry(0, 20, 17));
        assert!(policy.should_retry(2, 20, 17));
        assert!(!policy.should_retry(3, 20, 17));
        assert_eq!(policy.max_attempts(), 4);
    }

    #[test]
    fn test_from_app_config_uses_model_table() {
        let config = AppConfig::default();
        let translation = TranslationConfig::from_app_config(&config);
        assert_eq!(translation.model, "gpt-4o-mini");
        assert_eq!(translation.max_tokens, Some(16_384));
        assert_eq!(translation.max_chunk_size, 10_000);
        assert_eq!(translation.retry, RetryPolicy::default());
        assert_eq!(translation.concurrency, 1);
    }

    #[test]
    fn test_from_app_config_clamps_zero_values() {
        let mut config = AppConfig::default();
        config.translation.concurrency = 0;
        config.translation.max_chunk_size = 0;
        let translation = TranslationConfig::from_app_config(&config);
        assert_eq!(translation.concurrency, 1);
        assert_eq!(translation.max_chunk_size, 1);
    }
}
