//! Configuration management for folio.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Built-in defaults
//! - A YAML config file (`--config`, `FOLIO_CONFIG` or `./folio.yaml`)
//! - Environment variables (a `.env` file is honoured)
//! - Command-line flags

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Providers the factory knows how to build.
pub const KNOWN_PROVIDERS: [&str; 7] = [
    "openai",
    "anthropic",
    "claude",
    "google",
    "gemini",
    "ollama",
    "echo",
];

const DEFAULT_CONFIG_FILE: &str = "folio.yaml";

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Config file that was merged, if any
    pub config_file: Option<PathBuf>,

    /// Active LLM provider (e.g., "openai", "anthropic", "google", "ollama")
    pub provider: String,

    /// Explicit model identifier; falls back to the provider config, then the vendor default
    pub model: Option<String>,

    /// API key given directly (`FOLIO_API_KEY`)
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Translation pipeline settings
    pub translation: TranslationSettings,

    /// Provider configurations from the config file
    pub llm: Option<LlmConfig>,
}

/// Pipeline settings that end up in the immutable translation record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationSettings {
    pub temperature: f32,
    pub max_chunk_size: usize,
    pub concurrency: usize,
    pub retry_limit: u32,
    pub min_lines_for_retry: usize,
    pub max_line_diff_ratio: f64,
    pub escape_source: bool,
    pub prompt_file: Option<PathBuf>,
    pub scratch_dir: Option<PathBuf>,
}

impl Default for TranslationSettings {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            max_chunk_size: 10_000,
            concurrency: 1,
            retry_limit: 3,
            min_lines_for_retry: 10,
            max_line_diff_ratio: 0.1,
            escape_source: false,
            prompt_file: None,
            scratch_dir: None,
        }
    }
}

/// LLM configuration from the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(rename = "activeProvider", default)]
    pub active_provider: Option<String>,

    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

/// Provider-specific configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(rename = "apiKeyEnv", default)]
    pub api_key_env: Option<String>,

    #[serde(default)]
    pub model: Option<String>,

    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(rename = "maxTokens", default)]
    pub max_tokens: Option<u32>,

    /// Request timeout in seconds
    #[serde(default)]
    pub timeout: Option<u64>,
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmConfig>,
    translation: Option<TranslationSection>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslationSection {
    temperature: Option<f32>,
    max_chunk_size: Option<usize>,
    concurrency: Option<usize>,
    retry_limit: Option<u32>,
    min_lines_for_retry: Option<usize>,
    max_line_diff_ratio: Option<f64>,
    escape_source: Option<bool>,
    prompt_file: Option<PathBuf>,
    scratch_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_file: None,
            provider: "openai".to_string(),
            model: None,
            api_key: None,
            log_level: None,
            verbose: false,
            no_color: false,
            translation: TranslationSettings::default(),
            llm: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the config file and the environment.
    ///
    /// Environment variables:
    /// - `FOLIO_CONFIG`: Path to config file
    /// - `FOLIO_PROVIDER`: LLM provider
    /// - `FOLIO_MODEL`: Model identifier
    /// - `FOLIO_TEMPERATURE`: Sampling temperature
    /// - `FOLIO_MAX_CHUNK_SIZE`: Maximum chunk size in characters
    /// - `FOLIO_API_KEY`: API key for the active provider
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use folio_core::config::AppConfig;
    ///
    /// let config = AppConfig::load(None).expect("Failed to load config");
    /// println!("Provider: {}", config.provider);
    /// ```
    pub fn load(config_file: Option<&Path>) -> AppResult<Self> {
        // A missing .env file is the common case.
        let _ = dotenvy::dotenv();

        let mut config = Self::default();

        let explicit = config_file
            .map(Path::to_path_buf)
            .or_else(|| std::env::var("FOLIO_CONFIG").ok().map(PathBuf::from));

        match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(AppError::Config(format!(
                        "Config file does not exist: {:?}",
                        path
                    )));
                }
                config = config.merge_yaml(&path)?;
            }
            None => {
                let path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    config = config.merge_yaml(&path)?;
                }
            }
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("FOLIO_PROVIDER") {
            config.provider = provider.to_lowercase();
        }

        if let Ok(model) = std::env::var("FOLIO_MODEL") {
            config.model = Some(model);
        }

        if let Ok(temperature) = std::env::var("FOLIO_TEMPERATURE") {
            config.translation.temperature = temperature.parse().map_err(|_| {
                AppError::Config(format!("FOLIO_TEMPERATURE is not a number: {}", temperature))
            })?;
        }

        if let Ok(size) = std::env::var("FOLIO_MAX_CHUNK_SIZE") {
            config.translation.max_chunk_size = size.parse().map_err(|_| {
                AppError::Config(format!("FOLIO_MAX_CHUNK_SIZE is not a positive integer: {}", size))
            })?;
        }

        config.api_key = std::env::var("FOLIO_API_KEY").ok();

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();
        result.config_file = Some(path.to_path_buf());

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(section) = config_file.translation {
            let t = &mut result.translation;
            if let Some(v) = section.temperature {
                t.temperature = v;
            }
            if let Some(v) = section.max_chunk_size {
                t.max_chunk_size = v;
            }
            if let Some(v) = section.concurrency {
                t.concurrency = v;
            }
            if let Some(v) = section.retry_limit {
                t.retry_limit = v;
            }
            if let Some(v) = section.min_lines_for_retry {
                t.min_lines_for_retry = v;
            }
            if let Some(v) = section.max_line_diff_ratio {
                t.max_line_diff_ratio = v;
            }
            if let Some(v) = section.escape_source {
                t.escape_source = v;
            }
            if section.prompt_file.is_some() {
                t.prompt_file = section.prompt_file;
            }
            if section.scratch_dir.is_some() {
                t.scratch_dir = section.scratch_dir;
            }
        }

        if let Some(llm) = config_file.llm {
            if let Some(ref active) = llm.active_provider {
                result.provider = active.to_lowercase();
            }
            result.llm = Some(llm);
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over the environment and the config file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        provider: Option<String>,
        model: Option<String>,
        temperature: Option<f32>,
        max_chunk_size: Option<usize>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(provider) = provider {
            self.provider = provider.to_lowercase();
        }

        if let Some(model) = model {
            self.model = Some(model);
        }

        if let Some(temperature) = temperature {
            self.translation.temperature = temperature;
        }

        if let Some(size) = max_chunk_size {
            self.translation.max_chunk_size = size;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the configuration block of the active provider.
    pub fn provider_config(&self) -> Option<&ProviderConfig> {
        self.llm
            .as_ref()
            .and_then(|llm| llm.providers.get(&self.provider))
    }

    /// Model to request: explicit override, provider config, then vendor default.
    pub fn model(&self) -> String {
        self.model
            .clone()
            .or_else(|| self.provider_config().and_then(|p| p.model.clone()))
            .unwrap_or_else(|| default_model(&self.provider).to_string())
    }

    /// Custom endpoint for the active provider, if configured.
    pub fn endpoint(&self) -> Option<String> {
        self.provider_config().and_then(|p| p.endpoint.clone())
    }

    /// Maximum output tokens configured for the active provider.
    pub fn max_tokens(&self) -> Option<u32> {
        self.provider_config().and_then(|p| p.max_tokens)
    }

    /// Request timeout configured for the active provider.
    pub fn timeout_secs(&self) -> Option<u64> {
        self.provider_config().and_then(|p| p.timeout)
    }

    /// Resolve the API key for the active provider.
    ///
    /// Order: `FOLIO_API_KEY`, the provider's `apiKeyEnv`, the vendor default variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }

        let configured = self.provider_config().and_then(|p| p.api_key_env.clone());
        let env_var = configured.or_else(|| default_api_key_env(&self.provider).map(String::from));

        env_var.and_then(|name| std::env::var(name).ok())
    }

    /// Validate configuration for the active provider.
    pub fn validate(&self) -> AppResult<()> {
        let provider = self.provider.as_str();

        if !KNOWN_PROVIDERS.contains(&provider) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        let t = &self.translation;
        if t.max_chunk_size == 0 {
            return Err(AppError::Config(
                "Maximum chunk size must be at least 1 character".to_string(),
            ));
        }
        if t.concurrency == 0 {
            return Err(AppError::Config(
                "Concurrency must be at least 1".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&t.temperature) {
            return Err(AppError::Config(format!(
                "Temperature must be between 0.0 and 2.0, got {}",
                t.temperature
            )));
        }
        if t.max_line_diff_ratio.is_nan() || t.max_line_diff_ratio < 0.0 {
            return Err(AppError::Config(format!(
                "maxLineDiffRatio must be non-negative, got {}",
                t.max_line_diff_ratio
            )));
        }

        if let Some(env_var) = default_api_key_env(provider) {
            if self.resolve_api_key().is_none() {
                let configured = self
                    .provider_config()
                    .and_then(|p| p.api_key_env.clone())
                    .unwrap_or_else(|| env_var.to_string());
                return Err(AppError::Config(format!(
                    "API key not found in environment variable: {}",
                    configured
                )));
            }
        }

        Ok(())
    }
}

/// Vendor default environment variable holding the API key.
pub fn default_api_key_env(provider: &str) -> Option<&'static str> {
    match provider {
        "openai" => Some("OPENAI_API_KEY"),
        "anthropic" | "claude" => Some("ANTHROPIC_API_KEY"),
        "google" | "gemini" => Some("GEMINI_API_KEY"),
        _ => None,
    }
}

/// Vendor default model.
pub fn default_model(provider: &str) -> &'static str {
    match provider {
        "anthropic" | "claude" => "claude-3-5-haiku-20241022",
        "google" | "gemini" => "gemini-1.5-flash",
        "ollama" => "llama3.2",
        "echo" => "echo",
        _ => "gpt-4o-mini",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "openai");
        assert_eq!(config.model(), "gpt-4o-mini");
        assert_eq!(config.translation.max_chunk_size, 10_000);
        assert_eq!(config.translation.retry_limit, 3);
        assert!((config.translation.temperature - 0.2).abs() < f32::EPSILON);
        assert!(!config.verbose);
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(
            Some("Anthropic".to_string()),
            None,
            Some(0.7),
            Some(2_000),
            None,
            true,
            false,
        );

        assert_eq!(overridden.provider, "anthropic");
        assert_eq!(overridden.model(), "claude-3-5-haiku-20241022");
        assert_eq!(overridden.translation.max_chunk_size, 2_000);
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_merge_yaml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("folio.yaml");
        std::fs::write(
            &path,
            r#"
llm:
  activeProvider: ollama
  providers:
    ollama:
      model: qwen2.5
      endpoint: http://gpu-box:11434
      timeout: 600
translation:
  maxChunkSize: 4000
  concurrency: 2
  escapeSource: true
logging:
  level: warn
  color: false
"#,
        )
        .unwrap();

        let config = AppConfig::default().merge_yaml(&path).unwrap();
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.model(), "qwen2.5");
        assert_eq!(config.endpoint(), Some("http://gpu-box:11434".to_string()));
        assert_eq!(config.timeout_secs(), Some(600));
        assert_eq!(config.translation.max_chunk_size, 4000);
        assert_eq!(config.translation.concurrency, 2);
        assert!(config.translation.escape_source);
        assert_eq!(config.log_level, Some("warn".to_string()));
        assert!(config.no_color);
    }

    #[test]
    fn test_explicit_model_wins_over_provider_config() {
        let mut config = AppConfig::default();
        let mut providers = HashMap::new();
        providers.insert(
            "openai".to_string(),
            ProviderConfig {
                model: Some("gpt-4o".to_string()),
                ..Default::default()
            },
        );
        config.llm = Some(LlmConfig {
            active_provider: None,
            providers,
        });
        assert_eq!(config.model(), "gpt-4o");

        config.model = Some("o1-mini".to_string());
        assert_eq!(config.model(), "o1-mini");
    }

    #[test]
    fn test_explicit_api_key_is_resolved_first() {
        let mut config = AppConfig::default();
        config.api_key = Some("sk-test".to_string());
        assert_eq!(config.resolve_api_key(), Some("sk-test".to_string()));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = AppConfig::default();
        config.provider = "unknown".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_echo_needs_no_key() {
        let mut config = AppConfig::default();
        config.provider = "echo".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_chunk_size() {
        let mut config = AppConfig::default();
        config.provider = "echo".to_string();
        config.translation.max_chunk_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let mut config = AppConfig::default();
        config.provider = "ollama".to_string();
        config.translation.concurrency = 0;
        assert!(config.validate().is_err());
    }
}
