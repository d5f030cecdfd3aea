//! Prompt types for folio.

use serde::{Deserialize, Serialize};

/// Identifier of the built-in translation prompt.
pub const DEFAULT_PROMPT_ID: &str = "folio.translate.default";

const DEFAULT_SYSTEM_TEMPLATE: &str = concat!(
    "You are a professional book translator and {{to_lang}} native speaker.\n",
    "Please translate the text from {{from_lang}} to {{to_lang}}.\n",
    "{{book_details}}\n",
    "Keep all special characters and HTML tags as in the source text.\n",
    "Provide THE ENTIRE TRANSLATION in a single response and do not stop until the full text is translated.\n",
    "PLEASE RETURN ONLY {{to_lang}} TRANSLATION."
);

const DEFAULT_USER_TEMPLATE: &str = "{{source_text}}";

fn default_user_template() -> String {
    DEFAULT_USER_TEMPLATE.to_string()
}

/// A translation prompt definition, built in or loaded from YAML.
///
/// Templates see `from_lang`, `to_lang`, `book_details` and `source_text`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Unique prompt identifier
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// API version for schema evolution
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Creator identifier
    #[serde(rename = "createdBy", default)]
    pub created_by: String,

    /// System instruction template
    pub system: String,

    /// User message template
    #[serde(default = "default_user_template")]
    pub user: String,
}

impl Default for PromptDefinition {
    fn default() -> Self {
        Self {
            id: DEFAULT_PROMPT_ID.to_string(),
            title: "Professional book translator".to_string(),
            api_version: "1.0".to_string(),
            created_by: "folio".to_string(),
            system: DEFAULT_SYSTEM_TEMPLATE.to_string(),
            user: default_user_template(),
        }
    }
}

/// A fully rendered prompt ready for a completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuiltPrompt {
    /// System message
    pub system: String,

    /// User message
    pub user: String,

    /// Source prompt ID
    #[serde(rename = "sourcePromptId")]
    pub source_prompt_id: String,
}
