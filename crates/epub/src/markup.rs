//! Lenient markup tokenizer.
//!
//! Splits (X)HTML into tokens whose spans cover the input byte for byte, so
//! callers can rewrite single tags and copy everything else verbatim.
//! Mismatched end tags are tolerated; if the reader gives up, the rest of the
//! input becomes one raw token.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Start,
    End,
    Empty,
    Text,
    /// Comments, CDATA, declarations, doctypes and unparsable tails
    Other,
}

/// An attribute with its value kept in raw (escaped) form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Range<usize>,
    /// Qualified tag name; empty for text and other tokens
    pub name: String,
    pub attrs: Vec<Attr>,
}

impl Token {
    /// Tag name without namespace prefix, lower-cased.
    pub fn local_name(&self) -> String {
        local_name(&self.name).to_ascii_lowercase()
    }

    pub fn is_start_of(&self, local: &str) -> bool {
        matches!(self.kind, TokenKind::Start | TokenKind::Empty) && self.local_name() == local
    }

    pub fn is_end_of(&self, local: &str) -> bool {
        self.kind == TokenKind::End && self.local_name() == local
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.value.as_str())
    }
}

/// Strip a namespace prefix (`xhtml:body` -> `body`).
pub fn local_name(name: &str) -> &str {
    name.rsplit_once(':').map(|(_, local)| local).unwrap_or(name)
}

/// Tokenize markup into contiguous spanned tokens.
pub fn tokenize(src: &str) -> Vec<Token> {
    let mut reader = Reader::from_str(src);
    let config = reader.config_mut();
    config.trim_text(false);
    config.check_end_names = false;
    config.allow_unmatched_ends = true;
    config.expand_empty_elements = false;

    let mut tokens = Vec::new();
    loop {
        let start = reader.buffer_position() as usize;
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!("Markup reader stopped at byte {}: {}", start, e);
                if start < src.len() {
                    tokens.push(other(start..src.len()));
                }
                break;
            }
        };
        let end = reader.buffer_position() as usize;

        let token = match event {
            Event::Eof => {
                if start < src.len() {
                    tokens.push(other(start..src.len()));
                }
                break;
            }
            Event::Start(e) => tag(TokenKind::Start, &e, start..end),
            Event::Empty(e) => tag(TokenKind::Empty, &e, start..end),
            Event::End(e) => Token {
                kind: TokenKind::End,
                span: start..end,
                name: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
                attrs: Vec::new(),
            },
            Event::Text(_) => Token {
                kind: TokenKind::Text,
                span: start..end,
                name: String::new(),
                attrs: Vec::new(),
            },
            _ => other(start..end),
        };
        tokens.push(token);
    }
    tokens
}

fn other(span: Range<usize>) -> Token {
    Token {
        kind: TokenKind::Other,
        span,
        name: String::new(),
        attrs: Vec::new(),
    }
}

fn tag(kind: TokenKind, e: &BytesStart<'_>, span: Range<usize>) -> Token {
    let mut attributes = e.html_attributes();
    attributes.with_checks(false);

    let attrs = attributes
        .filter_map(Result::ok)
        .map(|a| Attr {
            key: String::from_utf8_lossy(a.key.as_ref()).into_owned(),
            value: String::from_utf8_lossy(a.value.as_ref()).into_owned(),
        })
        .collect();

    Token {
        kind,
        span,
        name: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
        attrs,
    }
}

/// Render a start or empty tag from its parts.
///
/// Values are written as stored (already escaped). A value containing a double
/// quote is wrapped in single quotes.
pub fn render_tag(name: &str, attrs: &[Attr], empty: bool) -> String {
    let mut out = String::with_capacity(name.len() + 2 + attrs.len() * 16);
    out.push('<');
    out.push_str(name);
    for attr in attrs {
        out.push(' ');
        out.push_str(&attr.key);
        if attr.value.contains('"') {
            out.push_str("='");
            out.push_str(&attr.value);
            out.push('\'');
        } else {
            out.push_str("=\"");
            out.push_str(&attr.value);
            out.push('"');
        }
    }
    out.push_str(if empty { "/>" } else { ">" });
    out
}

/// Location of a document's `<body>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodySpan {
    /// The `<body ...>` start tag
    pub start_tag: Range<usize>,
    /// Everything between the start tag and `</body>` (or end of input)
    pub inner: Range<usize>,
}

/// Find the body element.
pub fn body_span(src: &str) -> Option<BodySpan> {
    body_span_in(src, &tokenize(src))
}

pub fn body_span_in(src: &str, tokens: &[Token]) -> Option<BodySpan> {
    let open_idx = tokens.iter().position(|t| t.is_start_of("body"))?;
    let open = &tokens[open_idx];

    if open.kind == TokenKind::Empty {
        return Some(BodySpan {
            start_tag: open.span.clone(),
            inner: open.span.end..open.span.end,
        });
    }

    // An unparsable tail can swallow `</body>`; look for it as text there.
    let inner_end = tokens[open_idx + 1..]
        .iter()
        .rev()
        .find(|t| t.is_end_of("body"))
        .map(|t| t.span.start)
        .or_else(|| {
            src[open.span.end..]
                .rfind("</body>")
                .map(|pos| open.span.end + pos)
        })
        .unwrap_or(src.len());

    Some(BodySpan {
        start_tag: open.span.clone(),
        inner: open.span.end..inner_end,
    })
}

/// Find the `</head>` end tag.
pub fn head_close(tokens: &[Token]) -> Option<Range<usize>> {
    tokens
        .iter()
        .find(|t| t.is_end_of("head"))
        .map(|t| t.span.clone())
}

/// Extract human-readable text, decoding entities and skipping scripts and styles.
pub fn plain_text(src: &str) -> String {
    let mut out = String::new();
    let mut skip_depth = 0usize;

    for token in tokenize(src) {
        match token.kind {
            TokenKind::Start if is_skipped(&token.local_name()) => skip_depth += 1,
            TokenKind::End if is_skipped(&token.local_name()) => {
                skip_depth = skip_depth.saturating_sub(1)
            }
            TokenKind::Text if skip_depth == 0 => {
                out.push_str(&html_escape::decode_html_entities(&src[token.span]));
            }
            _ => {}
        }
    }
    out
}

fn is_skipped(name: &str) -> bool {
    matches!(name, "script" | "style" | "head")
}
