//! Newline-aligned chunk splitter.

/// Default chunk size in characters.
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 10_000;

/// Split text into chunks of at most `max_chunk_size` characters.
///
/// Lines are packed greedily and joined with `\n`; a chunk only ends where
/// the input had a newline, so joining the chunks with `\n` gives back the
/// input. A single line longer than the limit becomes its own chunk. Empty
/// input gives no chunks.
pub fn split_by_newline(text: &str, max_chunk_size: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;
    let mut started = false;

    for line in text.split('\n') {
        let line_chars = line.chars().count();

        if !started {
            current.push_str(line);
            current_chars = line_chars;
            started = true;
        } else if current_chars + 1 + line_chars > max_chunk_size {
            chunks.push(std::mem::take(&mut current));
            current.push_str(line);
            current_chars = line_chars;
        } else {
            current.push('\n');
            current.push_str(line);
            current_chars += 1 + line_chars;
        }
    }
    chunks.push(current);

    tracing::trace!(
        "Split {} characters into {} chunks (max {})",
        text.chars().count(),
        chunks.len(),
        max_chunk_size
    );
    chunks
}
