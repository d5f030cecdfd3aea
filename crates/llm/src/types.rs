//! Provider identification and per-model limits.

/// Provider type enum for matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderType {
    OpenAI,
    Anthropic,
    Google,
    Ollama,
    Echo,
}

impl ProviderType {
    /// Parse provider type from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Some(Self::OpenAI),
            "anthropic" | "claude" => Some(Self::Anthropic),
            "google" | "gemini" => Some(Self::Google),
            "ollama" => Some(Self::Ollama),
            "echo" => Some(Self::Echo),
            _ => None,
        }
    }

    /// Get the canonical provider name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::Anthropic => "anthropic",
            Self::Google => "google",
            Self::Ollama => "ollama",
            Self::Echo => "echo",
        }
    }

    /// Base URL used when no endpoint is configured.
    pub fn default_endpoint(&self) -> Option<&'static str> {
        match self {
            Self::OpenAI => Some("https://api.openai.com/v1"),
            Self::Anthropic => Some("https://api.anthropic.com/v1"),
            Self::Google => Some("https://generativelanguage.googleapis.com/v1beta"),
            Self::Ollama => Some("http://localhost:11434"),
            Self::Echo => None,
        }
    }

    pub fn requires_api_key(&self) -> bool {
        matches!(self, Self::OpenAI | Self::Anthropic | Self::Google)
    }

    /// Output token cap for models without an entry in the table.
    fn fallback_max_output_tokens(&self) -> Option<u32> {
        match self {
            Self::OpenAI => Some(16_384),
            Self::Anthropic => Some(4_096),
            Self::Google => Some(8_192),
            Self::Ollama | Self::Echo => None,
        }
    }
}

const MAX_OUTPUT_TOKENS: &[(&str, u32)] = &[
    ("gpt-4o", 16_384),
    ("gpt-4o-mini", 16_384),
    ("o1-mini", 65_536),
    ("claude-3-haiku-20240307", 4_096),
    ("claude-3-5-haiku-20241022", 8_192),
    ("claude-3-5-sonnet-20241022", 8_192),
    ("gemini-1.5-pro", 8_192),
    ("gemini-1.5-flash", 8_192),
    ("gemini-2.0-flash-exp", 8_192),
];

/// Maximum output tokens to request for a model.
///
/// Known models use their published limit; unknown models fall back to a
/// per-vendor default. Local and echo providers impose no limit.
pub fn max_output_tokens(provider: ProviderType, model: &str) -> Option<u32> {
    MAX_OUTPUT_TOKENS
        .iter()
        .find(|(name, _)| *name == model)
        .map(|(_, tokens)| *tokens)
        .or_else(|| provider.fallback_max_output_tokens())
}
