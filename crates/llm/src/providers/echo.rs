//! Offline provider that answers with the user prompt.
//!
//! Useful for exercising the whole pipeline (minify, split, restore, graft,
//! repackage) without network access: the output book equals the input.

use crate::client::{Completion, CompletionRequest, TextCompleter, Usage};
use folio_core::AppResult;

/// Returns the prompt unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoClient;

#[async_trait::async_trait]
impl TextCompleter for EchoClient {
    fn provider_name(&self) -> &str {
        "echo"
    }

    async fn complete(&self, request: &CompletionRequest) -> AppResult<Completion> {
        let tokens = (request.prompt.chars().count() / 4) as u32;
        Ok(Completion {
            content: request.prompt.clone(),
            model: request.model.clone(),
            usage: Usage::new(tokens, tokens),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_echo_returns_prompt() {
        let request = CompletionRequest::new("<p>Hello</p>\n<p>World</p>", "echo")
            .with_system("ignored");
        let completion = EchoClient.complete(&request).await.unwrap();
        assert_eq!(completion.content, request.prompt);
        assert_eq!(completion.model, "echo");
    }
}
