//! LLM integration crate for folio.
//!
//! This crate provides a provider-agnostic abstraction over chat-completion
//! style APIs. The translation pipeline only ever sees [`TextCompleter`].
//!
//! # Providers
//! - **OpenAI**: `chat/completions` (default)
//! - **Anthropic**: `messages`
//! - **Google**: Gemini `generateContent`
//! - **Ollama**: Local LLM runtime
//! - **Echo**: Returns the user prompt unchanged, for dry runs
//!
//! # Example
//! ```no_run
//! use folio_llm::{create_client, CompletionRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = create_client("ollama", None, None, None)?;
//! let request = CompletionRequest::new("Hello, world!", "llama3.2")
//!     .with_system("Translate to Polish.");
//! let completion = client.complete(&request).await?;
//! println!("{}", completion.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{Completion, CompletionRequest, TextCompleter, Usage};
pub use factory::create_client;
pub use types::{max_output_tokens, ProviderType};
