//! Chapter translation.
//!
//! A chapter goes through minify, split, translate, join, restore and graft.
//! The serialized `<body>` element is what gets minified and split; after
//! translation the inner markup of the restored body replaces the original
//! body contents, so the body start tag, head and prologue stay untouched.

use crate::attributes::{self, AttributeMap};
use crate::chunk::{ChunkTranslator, TranslationContext};
use crate::progress::ProgressReporter;
use crate::scratch::ScratchWriter;
use crate::splitter::split_by_newline;
use folio_core::AppResult;
use folio_epub::markup::{self, BodySpan};
use futures::stream::{self, StreamExt};

/// A chapter body ready to be sent: minified and split.
#[derive(Debug, Clone)]
pub struct PreparedBody {
    pub span: BodySpan,
    pub minified: String,
    pub attributes: AttributeMap,
    pub chunks: Vec<String>,
}

/// Minify and split the body of a document.
///
/// Returns `None` when there is no body or the body is blank.
pub fn prepare_body(content: &str, max_chunk_size: usize) -> Option<PreparedBody> {
    let span = markup::body_span(content)?;
    let inner = &content[span.inner.clone()];
    if inner.trim().is_empty() {
        return None;
    }

    let serialized = format!("{}{}</body>", &content[span.start_tag.clone()], inner);
    let (minified, attributes) = attributes::minify(&serialized);
    let chunks = split_by_newline(&minified, max_chunk_size);

    Some(PreparedBody {
        span,
        minified,
        attributes,
        chunks,
    })
}

/// Replace the body contents of `content` with the body of `translated`.
///
/// When the translation lost its body tags the whole text is used.
fn graft_body(content: &str, span: &BodySpan, translated: &str) -> String {
    let inner = match markup::body_span(translated) {
        Some(body) => &translated[body.inner],
        None => {
            tracing::warn!("Translated chapter has no <body> element; grafting the whole text");
            translated
        }
    };

    format!(
        "{}{}{}",
        &content[..span.inner.start],
        inner,
        &content[span.inner.end..]
    )
}

pub struct ChapterTranslator {
    chunks: ChunkTranslator,
    scratch: Option<ScratchWriter>,
    progress: ProgressReporter,
}

impl ChapterTranslator {
    pub fn new(chunks: ChunkTranslator) -> Self {
        let scratch = chunks.config().scratch_dir.as_ref().and_then(|dir| {
            match ScratchWriter::new(dir) {
                Ok(writer) => {
                    tracing::info!("Translated chunks will be stored in {}", dir.display());
                    Some(writer)
                }
                Err(e) => {
                    tracing::warn!("Scratch output disabled ({}): {}", dir.display(), e);
                    None
                }
            }
        });

        Self {
            chunks,
            scratch,
            progress: ProgressReporter::noop(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    pub fn chunk_translator(&self) -> &ChunkTranslator {
        &self.chunks
    }

    /// Split, translate and re-join plain text or markup.
    ///
    /// Chunks are translated `concurrency` at a time and always re-joined in
    /// order. With a chapter number each translated chunk is also written to
    /// the scratch directory.
    pub async fn translate_text(
        &self,
        text: &str,
        chapter: Option<usize>,
        ctx: &TranslationContext,
    ) -> AppResult<String> {
        let config = self.chunks.config();
        let chunks = split_by_newline(text, config.max_chunk_size);
        self.translate_chunks(&chunks, chapter, ctx).await
    }

    async fn translate_chunks(
        &self,
        chunks: &[String],
        chapter: Option<usize>,
        ctx: &TranslationContext,
    ) -> AppResult<String> {
        let total = chunks.len();
        let concurrency = self.chunks.config().concurrency.max(1);

        let mut results = stream::iter(chunks.iter().enumerate())
            .map(|(idx, chunk)| async move {
                tracing::info!("Translating chunk {}/{}...", idx + 1, total);
                self.progress.chunk(idx + 1, total, chunk.chars().count());
                self.chunks.translate(chunk, ctx).await
            })
            .buffered(concurrency);

        let mut translated = Vec::with_capacity(total);
        while let Some(result) = results.next().await {
            let text = result?;
            if let (Some(scratch), Some(chapter)) = (&self.scratch, chapter) {
                scratch.write_chunk(chapter, translated.len() + 1, &text);
            }
            translated.push(text);
        }

        Ok(translated.join("\n"))
    }

    /// Translate the body of a chapter document.
    ///
    /// Documents without a body, or with a blank one, come back unchanged.
    pub async fn translate_chapter(
        &self,
        content: &str,
        chapter: usize,
        ctx: &TranslationContext,
    ) -> AppResult<String> {
        let Some(prepared) = prepare_body(content, self.chunks.config().max_chunk_size) else {
            tracing::debug!("Chapter {} has no body content, leaving it unchanged", chapter);
            return Ok(content.to_string());
        };

        tracing::debug!(
            "Chapter {}: {} chunks, {} attribute placeholders",
            chapter,
            prepared.chunks.len(),
            prepared.attributes.len()
        );

        let translated = self
            .translate_chunks(&prepared.chunks, Some(chapter), ctx)
            .await?;
        let restored = attributes::restore(&translated, &prepared.attributes);

        Ok(graft_body(content, &prepared.span, &restored))
    }
}
