//! LLM provider factory.
//!
//! Builds a [`TextCompleter`] from a provider name, an optional custom
//! endpoint and an optional API key.

use crate::client::TextCompleter;
use crate::providers::{AnthropicClient, EchoClient, GoogleClient, OllamaClient, OpenAiClient};
use crate::types::ProviderType;
use folio_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Create a completion client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("openai", "anthropic", "google", "ollama", "echo")
/// * `endpoint` - Optional custom base URL
/// * `api_key` - API key, required by the hosted vendors
/// * `timeout` - Optional per-request timeout
///
/// # Errors
/// Returns error if:
/// - Provider is unknown
/// - A hosted provider is selected without an API key
/// - The HTTP client cannot be built
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
    timeout: Option<Duration>,
) -> AppResult<Arc<dyn TextCompleter>> {
    let provider_type = ProviderType::parse(provider).ok_or_else(|| {
        AppError::Config(format!(
            "Unknown provider: {}. Supported: openai, anthropic, google, ollama, echo",
            provider
        ))
    })?;

    let api_key = match (provider_type.requires_api_key(), api_key) {
        (true, None) => {
            return Err(AppError::Config(format!(
                "{} provider requires API key",
                provider_type.as_str()
            )))
        }
        (_, key) => key.unwrap_or_default().to_string(),
    };

    let base_url = endpoint
        .or_else(|| provider_type.default_endpoint())
        .unwrap_or_default()
        .trim_end_matches('/')
        .to_string();

    tracing::debug!(
        "Creating {} client (endpoint: {})",
        provider_type.as_str(),
        base_url
    );

    let client: Arc<dyn TextCompleter> = match provider_type {
        ProviderType::OpenAI => Arc::new(OpenAiClient::new(base_url, api_key, timeout)?),
        ProviderType::Anthropic => Arc::new(AnthropicClient::new(base_url, api_key, timeout)?),
        ProviderType::Google => Arc::new(GoogleClient::new(base_url, api_key, timeout)?),
        ProviderType::Ollama => Arc::new(OllamaClient::new(base_url, timeout)?),
        ProviderType::Echo => Arc::new(EchoClient),
    };

    Ok(client)
}
