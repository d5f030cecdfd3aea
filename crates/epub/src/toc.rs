//! Table of contents model.
//!
//! Parsed from the NCX or, when there is none, the EPUB 3 navigation
//! document. Entries remember where their labels live in the source so a
//! retitled tree can be written back without touching anything else.

use crate::markup::{self, Token, TokenKind};
use folio_core::{AppError, AppResult};
use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocLink {
    pub href: String,
    pub title: String,
    pub id: Option<String>,
}

/// A grouping node; it may point somewhere itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocSection {
    pub title: String,
    pub href: Option<String>,
    pub id: Option<String>,
    pub children: Vec<TocEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TocEntry {
    Link(TocLink),
    Section(TocSection),
}

impl TocEntry {
    pub fn title(&self) -> &str {
        match self {
            Self::Link(link) => &link.title,
            Self::Section(section) => &section.title,
        }
    }

    fn children(&self) -> &[TocEntry] {
        match self {
            Self::Link(_) => &[],
            Self::Section(section) => &section.children,
        }
    }

    fn same_shape(&self, other: &TocEntry) -> bool {
        match (self, other) {
            (Self::Link(a), Self::Link(b)) => a.href == b.href && a.id == b.id,
            (Self::Section(a), Self::Section(b)) => {
                a.href == b.href
                    && a.id == b.id
                    && a.children.len() == b.children.len()
                    && a.children
                        .iter()
                        .zip(&b.children)
                        .all(|(x, y)| x.same_shape(y))
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TocFormat {
    Ncx,
    Nav,
}

/// A parsed navigation document.
#[derive(Debug, Clone)]
pub struct TableOfContents {
    pub format: TocFormat,
    /// Zip path of the navigation document
    pub path: String,
    source: String,
    original: Vec<TocEntry>,
    entries: Vec<TocEntry>,
    /// Label spans in pre-order
    label_spans: Vec<Range<usize>>,
}

struct Frame {
    id: Option<String>,
    href: Option<String>,
    title: String,
    label: Option<Range<usize>>,
    children: Vec<Node>,
}

struct Node {
    entry: TocEntry,
    label: Range<usize>,
    children: Vec<Node>,
}

impl Frame {
    fn new(id: Option<String>) -> Self {
        Self {
            id,
            href: None,
            title: String::new(),
            label: None,
            children: Vec::new(),
        }
    }

    fn finish(self, at: usize) -> Node {
        let label = self.label.unwrap_or(at..at);
        let entry = if self.children.is_empty() {
            match self.href {
                Some(href) => TocEntry::Link(TocLink {
                    href,
                    title: self.title,
                    id: self.id,
                }),
                None => TocEntry::Section(TocSection {
                    title: self.title,
                    href: None,
                    id: self.id,
                    children: Vec::new(),
                }),
            }
        } else {
            TocEntry::Section(TocSection {
                title: self.title,
                href: self.href,
                id: self.id,
                children: self.children.iter().map(|n| n.entry.clone()).collect(),
            })
        };
        Node {
            entry,
            label,
            children: self.children,
        }
    }
}

fn collect_spans(nodes: &[Node], out: &mut Vec<Range<usize>>) {
    for node in nodes {
        out.push(node.label.clone());
        collect_spans(&node.children, out);
    }
}

/// Label text with inner whitespace runs collapsed to single spaces.
fn label_text(src: &str, span: &Range<usize>) -> String {
    markup::plain_text(&src[span.clone()])
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

impl TableOfContents {
    pub fn parse(format: TocFormat, path: &str, source: String) -> AppResult<Self> {
        let nodes = match format {
            TocFormat::Ncx => parse_ncx(&source)?,
            TocFormat::Nav => parse_nav(&source)?,
        };

        let mut label_spans = Vec::new();
        collect_spans(&nodes, &mut label_spans);
        let entries: Vec<TocEntry> = nodes.into_iter().map(|n| n.entry).collect();

        tracing::debug!("Parsed {} top-level ToC entries from {}", entries.len(), path);

        Ok(Self {
            format,
            path: path.to_string(),
            source,
            original: entries.clone(),
            entries,
            label_spans,
        })
    }

    pub fn entries(&self) -> &[TocEntry] {
        &self.entries
    }

    /// Replace the entries with a retitled tree of the same shape.
    pub fn set_entries(&mut self, entries: Vec<TocEntry>) -> AppResult<()> {
        let same = entries.len() == self.original.len()
            && entries
                .iter()
                .zip(&self.original)
                .all(|(a, b)| a.same_shape(b));
        if !same {
            return Err(AppError::Epub(
                "New table of contents does not match the structure of the original".to_string(),
            ));
        }
        self.entries = entries;
        Ok(())
    }

    pub fn is_modified(&self) -> bool {
        self.entries != self.original
    }

    /// Serialize, rewriting the labels whose titles changed.
    pub fn render(&self) -> String {
        let mut old_titles = Vec::new();
        flatten(&self.original, &mut old_titles);
        let mut new_titles = Vec::new();
        flatten(&self.entries, &mut new_titles);

        let mut edits: Vec<(Range<usize>, &str)> = self
            .label_spans
            .iter()
            .zip(old_titles.iter().zip(&new_titles))
            .filter(|(_, (old, new))| old != new)
            .map(|(span, (_, new))| (span.clone(), *new))
            .collect();
        edits.sort_by_key(|(span, _)| span.start);

        let mut out = String::with_capacity(self.source.len());
        let mut pos = 0;
        for (span, title) in edits {
            if span.start < pos {
                continue;
            }
            out.push_str(&self.source[pos..span.start]);
            out.push_str(&html_escape::encode_text(title));
            pos = span.end;
        }
        out.push_str(&self.source[pos..]);
        out
    }
}

fn flatten<'a>(entries: &'a [TocEntry], out: &mut Vec<&'a str>) {
    for entry in entries {
        out.push(entry.title());
        flatten(entry.children(), out);
    }
}

fn attr(token: &Token, key: &str) -> Option<String> {
    token
        .attr(key)
        .map(|v| html_escape::decode_html_entities(v).into_owned())
}

fn parse_ncx(src: &str) -> AppResult<Vec<Node>> {
    let tokens = markup::tokenize(src);
    if !tokens.iter().any(|t| t.is_start_of("navmap")) {
        return Err(AppError::Epub("NCX document has no navMap".to_string()));
    }

    let mut roots = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();
    let mut in_label = false;
    let mut text_start: Option<usize> = None;

    for token in &tokens {
        match (token.kind, token.local_name().as_str()) {
            (TokenKind::Start, "navpoint") => stack.push(Frame::new(attr(token, "id"))),
            (TokenKind::End, "navpoint") => {
                if let Some(frame) = stack.pop() {
                    let node = frame.finish(token.span.start);
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(node),
                        None => roots.push(node),
                    }
                }
            }
            (TokenKind::Start, "navlabel") => in_label = true,
            (TokenKind::End, "navlabel") => in_label = false,
            (TokenKind::Start, "text") if in_label => text_start = Some(token.span.end),
            (TokenKind::End, "text") if in_label => {
                if let (Some(start), Some(frame)) = (text_start.take(), stack.last_mut()) {
                    if frame.label.is_none() {
                        let span = start..token.span.start;
                        frame.title = label_text(src, &span);
                        frame.label = Some(span);
                    }
                }
            }
            (TokenKind::Start | TokenKind::Empty, "content") => {
                if let Some(frame) = stack.last_mut() {
                    frame.href = attr(token, "src");
                }
            }
            _ => {}
        }
    }

    Ok(roots)
}

fn is_toc_nav(token: &Token) -> bool {
    token.is_start_of("nav")
        && token
            .attrs
            .iter()
            .any(|a| markup::local_name(&a.key) == "type" && a.value.split_whitespace().any(|v| v == "toc"))
}

fn parse_nav(src: &str) -> AppResult<Vec<Node>> {
    let tokens = markup::tokenize(src);
    let start = tokens
        .iter()
        .position(is_toc_nav)
        .ok_or_else(|| AppError::Epub("Navigation document has no toc nav".to_string()))?;

    let mut roots = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();
    let mut label_start: Option<(usize, String)> = None;

    for token in &tokens[start + 1..] {
        let name = token.local_name();
        match (token.kind, name.as_str()) {
            (TokenKind::End, "nav") => break,
            (TokenKind::Start, "li") => stack.push(Frame::new(attr(token, "id"))),
            (TokenKind::End, "li") => {
                if let Some(frame) = stack.pop() {
                    let node = frame.finish(token.span.start);
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(node),
                        None => roots.push(node),
                    }
                }
            }
            (TokenKind::Start, "a" | "span") if label_start.is_none() => {
                if let Some(frame) = stack.last_mut() {
                    if frame.label.is_none() {
                        if name == "a" {
                            frame.href = attr(token, "href");
                            if frame.id.is_none() {
                                frame.id = attr(token, "id");
                            }
                        }
                        label_start = Some((token.span.end, name.clone()));
                    }
                }
            }
            (TokenKind::End, "a" | "span") => {
                if label_start.as_ref().is_some_and(|(_, n)| *n == name) {
                    if let (Some((start, _)), Some(frame)) = (label_start.take(), stack.last_mut())
                    {
                        let span = start..token.span.start;
                        frame.title = label_text(src, &span);
                        frame.label = Some(span);
                    }
                }
            }
            _ => {}
        }
    }

    Ok(roots)
}
