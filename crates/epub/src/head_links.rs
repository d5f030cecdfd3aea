//! Head `<link>` preservation.
//!
//! Stylesheet links in a document head must survive the chapter rewrite. The
//! links present when a document is first seen are recorded; at write time
//! any recorded link missing from the head is put back before `</head>`.

use crate::book::Document;
use crate::markup::{self, Attr, TokenKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadLink {
    pub href: String,
    /// Space-joined `rel` values
    pub rel: Option<String>,
    pub media_type: Option<String>,
}

impl HeadLink {
    fn render(&self) -> String {
        let mut attrs = vec![Attr {
            key: "href".to_string(),
            value: self.href.clone(),
        }];
        if let Some(ref rel) = self.rel {
            attrs.push(Attr {
                key: "rel".to_string(),
                value: rel.clone(),
            });
        }
        if let Some(ref media_type) = self.media_type {
            attrs.push(Attr {
                key: "type".to_string(),
                value: media_type.clone(),
            });
        }
        markup::render_tag("link", &attrs, true)
    }
}

/// Record the head links of a document's current content.
pub fn preserve_head_links(doc: &mut Document) {
    let links = extract_head_links(doc.content());
    tracing::trace!("{}: {} head links", doc.name, links.len());
    doc.head_links = links;
}

/// Collect `<link>` elements inside `<head>`.
pub fn extract_head_links(src: &str) -> Vec<HeadLink> {
    let mut in_head = false;
    let mut links = Vec::new();

    for token in markup::tokenize(src) {
        match token.kind {
            TokenKind::Start if token.local_name() == "head" => in_head = true,
            TokenKind::End if token.local_name() == "head" => break,
            TokenKind::Start | TokenKind::Empty if in_head && token.local_name() == "link" => {
                let Some(href) = token.attr("href") else {
                    continue;
                };
                links.push(HeadLink {
                    href: href.to_string(),
                    rel: token
                        .attr("rel")
                        .map(|rel| rel.split_whitespace().collect::<Vec<_>>().join(" ")),
                    media_type: token.attr("type").map(str::to_string),
                });
            }
            _ => {}
        }
    }
    links
}

/// Re-insert recorded links that are missing from the head.
///
/// Returns `None` when nothing had to change.
pub fn restore_head_links(src: &str, links: &[HeadLink]) -> Option<String> {
    if links.is_empty() {
        return None;
    }

    let present = extract_head_links(src);
    let missing: Vec<&HeadLink> = links
        .iter()
        .filter(|link| !present.iter().any(|p| p.href == link.href))
        .collect();
    if missing.is_empty() {
        return None;
    }

    let tokens = markup::tokenize(src);
    let Some(close) = markup::head_close(&tokens) else {
        tracing::warn!("Cannot restore {} head links: no </head>", missing.len());
        return None;
    };

    let inserted: String = missing.iter().map(|link| link.render()).collect();
    Some(format!(
        "{}{}{}",
        &src[..close.start],
        inserted,
        &src[close.start..]
    ))
}
