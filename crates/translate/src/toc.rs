//! Table of contents translation.

use crate::chapter::ChapterTranslator;
use crate::chunk::TranslationContext;
use folio_core::{AppError, AppResult};
use folio_epub::{TocEntry, TocLink};

/// Translate the titles of the top-level links.
///
/// Titles are sent one per line through the regular chunk pipeline and put
/// back by position. Whitespace inside a title is collapsed so every title
/// is exactly one line. Blank titles are not sent and stay as they are.
/// Sections and their children are returned unchanged. A response with a
/// different number of lines than titles sent is an error; no title is
/// replaced in that case.
pub async fn translate_toc(
    translator: &ChapterTranslator,
    entries: &[TocEntry],
    ctx: &TranslationContext,
) -> AppResult<Vec<TocEntry>> {
    let titles: Vec<String> = entries
        .iter()
        .filter_map(|entry| match entry {
            TocEntry::Link(link) => single_line(&link.title),
            TocEntry::Section(_) => None,
        })
        .collect();

    if titles.is_empty() {
        tracing::debug!("Table of contents has no top-level titles to translate");
        return Ok(entries.to_vec());
    }

    tracing::info!("Translating table of contents ({} links)...", titles.len());
    let translated = translator.translate_text(&titles.join("\n"), None, ctx).await?;
    let translated: Vec<&str> = translated.lines().map(str::trim).collect();

    if translated.len() != titles.len() {
        return Err(AppError::TocMismatch {
            links: titles.len(),
            titles: translated.len(),
        });
    }

    let mut translated = translated.into_iter();
    Ok(entries
        .iter()
        .map(|entry| match entry {
            TocEntry::Link(link) if single_line(&link.title).is_some() => TocEntry::Link(TocLink {
                title: translated.next().unwrap_or(&link.title).to_string(),
                ..link.clone()
            }),
            _ => entry.clone(),
        })
        .collect())
}

/// The title on one line, or `None` when it is blank.
fn single_line(title: &str) -> Option<String> {
    let words: Vec<&str> = title.split_whitespace().collect();
    (!words.is_empty()).then(|| words.join(" "))
}
