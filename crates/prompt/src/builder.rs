//! Prompt builder for rendering templates and injecting book context.

use crate::types::{BuiltPrompt, PromptDefinition};
use folio_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::HashMap;

/// Values substituted into a translation prompt.
#[derive(Debug, Clone, Default)]
pub struct TranslationVars {
    /// Full source language name (e.g., "English")
    pub from_lang: String,

    /// Full target language name (e.g., "Polish")
    pub to_lang: String,

    /// Output of [`book_details`]
    pub book_details: String,

    /// The text to translate
    pub source_text: String,
}

impl TranslationVars {
    fn into_map(self) -> HashMap<String, String> {
        HashMap::from([
            ("from_lang".to_string(), self.from_lang),
            ("to_lang".to_string(), self.to_lang),
            ("book_details".to_string(), self.book_details),
            ("source_text".to_string(), self.source_text),
        ])
    }
}

/// Render the optional book title/author context.
///
/// Returns an empty string when neither is known.
pub fn book_details(title: Option<&str>, author: Option<&str>) -> String {
    let title = title.map(str::trim).filter(|t| !t.is_empty());
    let author = author.map(str::trim).filter(|a| !a.is_empty());

    let mut details = String::new();
    if let Some(title) = title {
        details.push_str(&format!("The book title is '{}'. \n", title));
    }
    if let Some(author) = author {
        details.push_str(&format!("The book author is '{}'. \n", author));
    }
    if title.is_some() || author.is_some() {
        details.push_str(
            "Rely on your knowledge of the author and book to determine the appropriate tone and style for the translation. \n",
        );
    }
    details
}

/// Build a prompt from a definition and translation variables.
///
/// # Example
/// ```no_run
/// use folio_prompt::{book_details, build_prompt, PromptDefinition, TranslationVars};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let vars = TranslationVars {
///     from_lang: "English".to_string(),
///     to_lang: "Polish".to_string(),
///     book_details: book_details(Some("Emma"), Some("Jane Austen")),
///     source_text: "<p>Hello</p>".to_string(),
/// };
/// let built = build_prompt(&PromptDefinition::default(), vars)?;
/// println!("{}", built.system);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(definition: &PromptDefinition, vars: TranslationVars) -> AppResult<BuiltPrompt> {
    let variables = vars.into_map();

    let system = render_template(&definition.system, &variables)?;
    let user = render_template(&definition.user, &variables)?;

    Ok(BuiltPrompt {
        system,
        user,
        source_prompt_id: definition.id.clone(),
    })
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Source text is markup and must reach the model untouched
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("prompt", variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}
