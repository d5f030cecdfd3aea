//! Attribute minification.
//!
//! Long `id`, `class`, `src`, `alt`, `href` and `title` values are replaced
//! with placeholders (`v1`, `v2`, ...) before a chapter is sent to the model,
//! and put back afterwards. Equal values share one placeholder. Numbering
//! follows document order, then attribute name order.
//!
//! Only tags that actually change are re-rendered; everything else is copied
//! from the input byte for byte. A source value that already looks like a
//! placeholder is not guarded against.

use folio_epub::markup::{self, Token, TokenKind};
use std::collections::HashMap;

/// Attribute names that are minified, sorted.
pub const MINIFIED_ATTRIBUTES: [&str; 6] = ["alt", "class", "href", "id", "src", "title"];

/// Placeholder to original value mapping for one chapter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeMap {
    values: HashMap<String, String>,
    placeholders: HashMap<String, String>,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Original value for a placeholder.
    pub fn get(&self, placeholder: &str) -> Option<&str> {
        self.values.get(placeholder).map(String::as_str)
    }

    fn intern(&mut self, value: &str) -> String {
        if let Some(placeholder) = self.placeholders.get(value) {
            return placeholder.clone();
        }
        let placeholder = format!("v{}", self.values.len() + 1);
        self.values.insert(placeholder.clone(), value.to_string());
        self.placeholders
            .insert(value.to_string(), placeholder.clone());
        placeholder
    }
}

/// Multi-valued attributes compare as their space-joined values.
fn attribute_value(key: &str, raw: &str) -> String {
    if key.eq_ignore_ascii_case("class") {
        raw.split_whitespace().collect::<Vec<_>>().join(" ")
    } else {
        raw.to_string()
    }
}

fn is_tag(token: &Token) -> bool {
    matches!(token.kind, TokenKind::Start | TokenKind::Empty)
}

/// Replace attribute values with placeholders.
pub fn minify(html: &str) -> (String, AttributeMap) {
    let mut map = AttributeMap::new();
    let mut out = String::with_capacity(html.len());

    for token in markup::tokenize(html) {
        if !is_tag(&token) || token.attrs.is_empty() {
            out.push_str(&html[token.span]);
            continue;
        }

        let mut attrs = token.attrs.clone();
        let mut changed = false;
        for name in MINIFIED_ATTRIBUTES {
            let Some(attr) = attrs
                .iter_mut()
                .find(|a| a.key.eq_ignore_ascii_case(name))
            else {
                continue;
            };
            let placeholder = map.intern(&attribute_value(name, &attr.value));
            if attr.value != placeholder {
                attr.value = placeholder;
                changed = true;
            }
        }

        if changed {
            out.push_str(&markup::render_tag(
                &token.name,
                &attrs,
                token.kind == TokenKind::Empty,
            ));
        } else {
            out.push_str(&html[token.span]);
        }
    }

    tracing::trace!(
        "Minified {} attribute values ({} -> {} bytes)",
        map.len(),
        html.len(),
        out.len()
    );
    (out, map)
}

/// Put original values back for every attribute holding a known placeholder.
pub fn restore(html: &str, map: &AttributeMap) -> String {
    if map.is_empty() {
        return html.to_string();
    }

    let mut out = String::with_capacity(html.len() * 2);
    for token in markup::tokenize(html) {
        if !is_tag(&token) || token.attrs.is_empty() {
            out.push_str(&html[token.span]);
            continue;
        }

        let mut attrs = token.attrs.clone();
        let mut changed = false;
        for attr in attrs.iter_mut() {
            if let Some(original) = map.get(&attribute_value(&attr.key, &attr.value)) {
                attr.value = original.to_string();
                changed = true;
            }
        }

        if changed {
            out.push_str(&markup::render_tag(
                &token.name,
                &attrs,
                token.kind == TokenKind::Empty,
            ));
        } else {
            out.push_str(&html[token.span]);
        }
    }
    out
}
