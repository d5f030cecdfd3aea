//! Provider implementations.

mod anthropic;
mod echo;
mod google;
mod ollama;
mod openai;

pub use anthropic::AnthropicClient;
pub use echo::EchoClient;
pub use google::GoogleClient;
pub use ollama::OllamaClient;
pub use openai::OpenAiClient;

use folio_core::{AppError, AppResult};
use std::time::Duration;

/// Whole-book chunks can take minutes to come back.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

fn http_client(timeout: Option<Duration>) -> AppResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout.unwrap_or(DEFAULT_TIMEOUT))
        .build()
        .map_err(|e| AppError::Llm(format!("Failed to build HTTP client: {}", e)))
}

/// Turn a non-2xx response into an `AppError::Llm` carrying the body text.
async fn check_status(vendor: &str, response: reqwest::Response) -> AppResult<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());

    Err(AppError::Llm(format!(
        "{} API error ({}): {}",
        vendor, status, error_text
    )))
}
