//! Approximate translation cost.
//!
//! Prices are USD per million tokens. Token counts for previews are
//! estimated from character counts; real runs use the usage reported by the
//! provider.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Input,
    Output,
}

/// (model, input, output) in USD per million tokens.
const PRICES_PER_MILLION: &[(&str, f64, f64)] = &[
    ("gpt-4o", 2.50, 10.00),
    ("gpt-4o-mini", 0.150, 0.60),
    ("o1-mini", 3.00, 12.00),
    ("claude-3-haiku-20240307", 0.25, 1.25),
    ("claude-3-5-haiku-20241022", 0.80, 4.80),
    ("claude-3-5-sonnet-20241022", 3.00, 15.00),
    ("gemini-1.5-flash", 0.075, 0.30),
    ("gemini-1.5-pro", 1.25, 5.00),
];

/// Price of `tokens` tokens; zero for models without a known price.
pub fn calculate_price(tokens: u64, model: &str, kind: TokenKind) -> f64 {
    let Some(&(_, input, output)) = PRICES_PER_MILLION.iter().find(|(name, _, _)| *name == model)
    else {
        return 0.0;
    };
    let per_million = match kind {
        TokenKind::Input => input,
        TokenKind::Output => output,
    };
    tokens as f64 * per_million / 1_000_000.0
}

pub fn has_known_price(model: &str) -> bool {
    PRICES_PER_MILLION.iter().any(|(name, _, _)| *name == model)
}

/// Rough token count: four characters per token, rounded up.
pub fn estimate_tokens(text: &str) -> u64 {
    (text.chars().count() as u64).div_ceil(4)
}

/// Cost of sending `input_tokens` and getting `output_tokens` back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PriceEstimate {
    pub input: f64,
    pub output: f64,
}

impl PriceEstimate {
    pub fn new(model: &str, input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input: calculate_price(input_tokens, model, TokenKind::Input),
            output: calculate_price(output_tokens, model, TokenKind::Output),
        }
    }

    /// A translation returns about as many tokens as it is sent.
    pub fn for_translation(model: &str, tokens: u64) -> Self {
        Self::new(model, tokens, tokens)
    }

    pub fn total(&self) -> f64 {
        self.input + self.output
    }

    pub fn format_line(&self) -> String {
        format!(
            "Price for input: ${:.2}, Price for output: ${:.2}, Total price: ${:.2}",
            self.input,
            self.output,
            self.total()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_price() {
        let price = calculate_price(1_000_000, "gpt-4o-mini", TokenKind::Input);
        assert!((price - 0.15).abs() < 1e-9);

        let price = calculate_price(2_000, "claude-3-5-sonnet-20241022", TokenKind::Output);
        assert!((price - 0.03).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_model_is_free() {
        assert_eq!(calculate_price(1_000, "llama3.2", TokenKind::Input), 0.0);
        assert!(!has_known_price("llama3.2"));
        assert!(has_known_price("gpt-4o"));
    }

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
        assert_eq!(estimate_tokens("żółć"), 1);
    }

    #[test]
    fn test_price_estimate() {
        let estimate = PriceEstimate::for_translation("gpt-4o", 1_000_000);
        assert!((estimate.input - 2.5).abs() < 1e-9);
        assert!((estimate.output - 10.0).abs() < 1e-9);
        assert_eq!(
            estimate.format_line(),
            "Price for input: $2.50, Price for output: $10.00, Total price: $12.50"
        );
    }
}
