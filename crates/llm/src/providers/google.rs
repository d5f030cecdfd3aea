//! Google Gemini provider.
//!
//! API: https://ai.google.dev/api/generate-content

use super::{check_status, http_client};
use crate::client::{Completion, CompletionRequest, TextCompleter, Usage};
use folio_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

/// Gemini client.
pub struct GoogleClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl GoogleClient {
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

    fn to_generate_request(&self, request: &CompletionRequest) -> GenerateRequest {
        GenerateRequest {
            system_instruction: request.system.as_ref().map(|system| Content {
                role: None,
                parts: vec![Part {
                    text: system.clone(),
                }],
            }),
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: request.prompt.clone(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
            },
        }
    }
}

#[async_trait::async_trait]
impl TextCompleter for GoogleClient {
    fn provider_name(&self) -> &str {
        "google"
    }

    async fn complete(&self, request: &CompletionRequest) -> AppResult<Completion> {
        tracing::debug!("Sending completion request to Gemini (model: {})", request.model);

        let url = format!("{}/models/{}:generateContent", self.base_url, request.model);
        let response = self
            .client
            .post(&url)
            .query(&[("key", &self.api_key)])
            .json(&self.to_generate_request(request))
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to send request to Gemini: {}", e)))?;

        let response = check_status("Gemini", response).await?;
        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse Gemini response: {}", e)))?;

        let candidate = generated
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Llm("Gemini response contained no candidates".to_string()))?;

        let content: String = candidate
            .content
            .parts
            .into_iter()
            .map(|part| part.text)
            .collect();

        let usage = generated
            .usage_metadata
            .map(|u| Usage::new(u.prompt_token_count, u.candidates_token_count))
            .unwrap_or_default();

        Ok(Completion {
            content,
            model: request.model.clone(),
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_request_serialization() {
        let client = GoogleClient::new("https://example.invalid", "key", None).unwrap();
        let request = CompletionRequest::new("Hello", "gemini-1.5-flash")
            .with_system("Translate")
            .with_max_tokens(8_192);

        let json = serde_json::to_value(client.to_generate_request(&request)).unwrap();
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "Translate");
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 8_192);
    }

    #[test]
    fn test_generate_response_parsing() {
        let json = r#"{
            "candidates": [{"content": {"role": "model", "parts": [{"text": "Witaj"}]}}],
            "usageMetadata": {"promptTokenCount": 5, "candidatesTokenCount": 2}
        }"#;
        let response: GenerateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.candidates[0].content.parts[0].text, "Witaj");
        assert_eq!(response.usage_metadata.unwrap().candidates_token_count, 2);
    }
}
