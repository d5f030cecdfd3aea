//! Text previews for the inspection commands.

use folio_epub::markup;
use once_cell::sync::Lazy;
use regex::Regex;

static BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{2,}").expect("valid regex"));

/// The first `limit` characters of a document's text, blank lines collapsed.
pub fn chapter_beginning(content: &str, limit: usize) -> String {
    let text: String = markup::plain_text(content).chars().take(limit).collect();
    BLANK_LINES.replace_all(&text, "\n").into_owned()
}

/// A chunk shortened to its first and last three lines when longer than six.
pub fn chunk_excerpt(chunk: &str) -> String {
    let lines: Vec<&str> = chunk.split('\n').collect();
    if lines.len() > 6 {
        format!(
            "{}\n...\n{}",
            lines[..3].join("\n"),
            lines[lines.len() - 3..].join("\n")
        )
    } else {
        chunk.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chapter_beginning() {
        let doc = "<html><head><title>Ignored</title></head><body>\n\n\n<h1>One</h1>\n\n<p>Fish &amp; chips</p></body></html>";
        assert_eq!(chapter_beginning(doc, 250), "\nOne\nFish & chips");
        assert_eq!(chapter_beginning(doc, 5), "\nOn");
    }

    #[test]
    fn test_chunk_excerpt() {
        assert_eq!(chunk_excerpt("a\nb\nc"), "a\nb\nc");

        let long = (1..=8).map(|i| i.to_string()).collect::<Vec<_>>().join("\n");
        assert_eq!(chunk_excerpt(&long), "1\n2\n3\n...\n6\n7\n8");
    }
}
