//! Anthropic messages provider.
//!
//! API: https://docs.anthropic.com/en/api/messages

use super::{check_status, http_client};
use crate::client::{Completion, CompletionRequest, TextCompleter, Usage};
use folio_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const API_VERSION: &str = "2023-06-01";

/// `max_tokens` is mandatory for this API.
const DEFAULT_MAX_TOKENS: u32 = 4_096;

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    model: String,
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<MessagesUsage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessagesUsage {
    input_tokens: u32,
    output_tokens: u32,
}

/// Anthropic Claude client.
pub struct AnthropicClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl AnthropicClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Option<Duration>,
    ) -> AppResult<Self> {
        Ok(Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            client: http_client(timeout)?,
        })
    }

    fn to_messages_request(&self, request: &CompletionRequest) -> MessagesRequest {
        MessagesRequest {
            model: request.model.clone(),
            max_tokens: request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            system: request.system.clone(),
            messages: vec![Message {
                role: "user",
                content: request.prompt.clone(),
            }],
            temperature: request.temperature,
        }
    }
}

/// Concatenate the text blocks of a response.
fn collect_text(blocks: Vec<ContentBlock>) -> String {
    blocks
        .into_iter()
        .filter(|block| block.kind == "text")
        .filter_map(|block| block.text)
        .collect()
}

#[async_trait::async_trait]
impl TextCompleter for AnthropicClient {
    fn provider_name(&self) -> &str {
        "anthropic"
    }

    async fn complete(&self, request: &CompletionRequest) -> AppResult<Completion> {
        tracing::debug!(
            "Sending completion request to Anthropic (model: {})",
            request.model
        );

        let url = format!("{}/messages", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&self.to_messages_request(request))
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to send request to Anthropic: {}", e)))?;

        let response = check_status("Anthropic", response).await?;
        let messages: MessagesResponse = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse Anthropic response: {}", e)))?;

        let usage = messages
            .usage
            .map(|u| Usage::new(u.input_tokens, u.output_tokens))
            .unwrap_or_default();

        Ok(Completion {
            content: collect_text(messages.content),
            model: messages.model,
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_tokens_defaults_when_unset() {
        let client = AnthropicClient::new("https://api.anthropic.com/v1", "key", None).unwrap();
        let request = CompletionRequest::new("Hello", "claude-3-5-haiku-20241022");
        assert_eq!(client.to_messages_request(&request).max_tokens, 4_096);
    }

    #[test]
    fn test_response_text_blocks_are_joined() {
        let json = r#"{
            "model": "claude-3-5-haiku-20241022",
            "content": [
                {"type": "text", "text": "Dzień "},
                {"type": "text", "text": "dobry"}
            ],
            "usage": {"input_tokens": 10, "output_tokens": 4}
        }"#;
        let response: MessagesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(collect_text(response.content), "Dzień dobry");
    }
}
