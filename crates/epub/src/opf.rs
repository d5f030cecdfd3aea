//! Container and package document (OPF) parsing.

use crate::markup::{self, Token, TokenKind};
use folio_core::{AppError, AppResult};

pub const CONTAINER_PATH: &str = "META-INF/container.xml";
pub const NCX_MEDIA_TYPE: &str = "application/x-dtbncx+xml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestItem {
    pub id: String,
    pub href: String,
    pub media_type: String,
    pub properties: Option<String>,
}

impl ManifestItem {
    pub fn has_property(&self, property: &str) -> bool {
        self.properties
            .as_deref()
            .is_some_and(|p| p.split_whitespace().any(|prop| prop == property))
    }

    pub fn is_document(&self) -> bool {
        matches!(
            self.media_type.as_str(),
            "application/xhtml+xml" | "text/html"
        ) && !self.has_property("nav")
    }

    pub fn is_ncx(&self) -> bool {
        self.media_type == NCX_MEDIA_TYPE || self.href.to_ascii_lowercase().ends_with(".ncx")
    }
}

/// The parts of the package document the translator needs.
#[derive(Debug, Clone, Default)]
pub struct PackageDocument {
    /// Zip path of the OPF file
    pub path: String,
    pub manifest: Vec<ManifestItem>,
    /// `toc` attribute of the spine (NCX manifest id)
    pub spine_toc: Option<String>,
    pub title: Option<String>,
    pub creator: Option<String>,
    pub language: Option<String>,
}

impl PackageDocument {
    pub fn item(&self, id: &str) -> Option<&ManifestItem> {
        self.manifest.iter().find(|item| item.id == id)
    }

    /// Resolve a manifest href to a zip path.
    pub fn resolve(&self, href: &str) -> String {
        resolve_relative_path(&self.path, href)
    }

    /// Navigation item: spine `toc`, then the NCX by media type, then the EPUB 3 nav.
    pub fn navigation_item(&self) -> Option<&ManifestItem> {
        self.spine_toc
            .as_deref()
            .and_then(|id| self.item(id))
            .or_else(|| self.manifest.iter().find(|item| item.is_ncx()))
            .or_else(|| self.manifest.iter().find(|item| item.has_property("nav")))
    }
}

/// Read the OPF path from `META-INF/container.xml`.
pub fn parse_container(xml: &str) -> AppResult<String> {
    markup::tokenize(xml)
        .iter()
        .find(|t| t.is_start_of("rootfile"))
        .and_then(|t| t.attr("full-path"))
        .map(|p| html_escape::decode_html_entities(p).into_owned())
        .ok_or_else(|| AppError::Epub("container.xml has no rootfile full-path".to_string()))
}

pub fn parse_package(path: &str, xml: &str) -> AppResult<PackageDocument> {
    let tokens = markup::tokenize(xml);

    if !tokens.iter().any(|t| t.is_start_of("package")) {
        return Err(AppError::Epub(format!("{} is not a package document", path)));
    }

    let mut doc = PackageDocument {
        path: path.to_string(),
        ..Default::default()
    };

    for (idx, token) in tokens.iter().enumerate() {
        if !matches!(token.kind, TokenKind::Start | TokenKind::Empty) {
            continue;
        }
        match token.local_name().as_str() {
            "item" => {
                let (Some(id), Some(href)) = (token.attr("id"), token.attr("href")) else {
                    tracing::warn!("Skipping manifest item without id or href");
                    continue;
                };
                doc.manifest.push(ManifestItem {
                    id: decode(id),
                    href: decode(href),
                    media_type: token.attr("media-type").map(decode).unwrap_or_default(),
                    properties: token.attr("properties").map(decode),
                });
            }
            "spine" => doc.spine_toc = token.attr("toc").map(decode),
            "title" if doc.title.is_none() => doc.title = element_text(xml, &tokens, idx),
            "creator" if doc.creator.is_none() => doc.creator = element_text(xml, &tokens, idx),
            "language" if doc.language.is_none() => {
                doc.language = element_text(xml, &tokens, idx)
            }
            _ => {}
        }
    }

    tracing::debug!(
        "Parsed package {} ({} manifest items)",
        path,
        doc.manifest.len()
    );
    Ok(doc)
}

/// Rewrite (or insert) the `dc:language` element.
pub fn set_language(xml: &str, tag: &str) -> AppResult<String> {
    let tokens = markup::tokenize(xml);
    let escaped = html_escape::encode_text(tag);

    if let Some(idx) = tokens.iter().position(|t| t.is_start_of("language")) {
        let open = &tokens[idx];
        let replacement = match open.kind {
            TokenKind::Empty => {
                let name = open.name.clone();
                (open.span.clone(), format!("<{name}>{escaped}</{name}>"))
            }
            _ => {
                let end = element_end(&tokens, idx).unwrap_or(open.span.end);
                (open.span.end..end, escaped.to_string())
            }
        };
        let (range, text) = replacement;
        return Ok(format!("{}{}{}", &xml[..range.start], text, &xml[range.end..]));
    }

    let close = tokens
        .iter()
        .find(|t| t.is_end_of("metadata"))
        .ok_or_else(|| AppError::Epub("Package document has no metadata element".to_string()))?;

    Ok(format!(
        "{}<dc:language>{}</dc:language>\n{}",
        &xml[..close.span.start],
        escaped,
        &xml[close.span.start..]
    ))
}

/// Resolve `href` relative to the directory of `base_path`.
pub fn resolve_relative_path(base_path: &str, href: &str) -> String {
    let href = href.split('#').next().unwrap_or(href);
    if href.is_empty() {
        return normalize_path(base_path);
    }
    if href.starts_with('/') {
        return normalize_path(href.trim_start_matches('/'));
    }
    if href.contains("://") {
        return href.to_string();
    }

    let base_dir = base_path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
    if base_dir.is_empty() {
        normalize_path(href)
    } else {
        normalize_path(&format!("{}/{}", base_dir, href))
    }
}

fn normalize_path(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            _ => parts.push(part),
        }
    }
    parts.join("/")
}

fn decode(raw: &str) -> String {
    html_escape::decode_html_entities(raw).into_owned()
}

/// Start of the end tag closing the element opened at `idx`.
fn element_end(tokens: &[Token], idx: usize) -> Option<usize> {
    let local = tokens[idx].local_name();
    let mut depth = 0usize;
    for token in &tokens[idx + 1..] {
        if token.kind == TokenKind::Start && token.local_name() == local {
            depth += 1;
        } else if token.is_end_of(&local) {
            if depth == 0 {
                return Some(token.span.start);
            }
            depth -= 1;
        }
    }
    None
}

fn element_text(xml: &str, tokens: &[Token], idx: usize) -> Option<String> {
    if tokens[idx].kind == TokenKind::Empty {
        return None;
    }
    let end = element_end(tokens, idx)?;
    let text = markup::plain_text(&xml[tokens[idx].span.end..end]);
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
