//! Scratch output of translated chunks.
//!
//! Each translated chunk can be dumped to
//! `chapter_0003_chunk_0007.html` under a scratch directory so a run can be
//! inspected afterwards. Write failures are logged and otherwise ignored.

use folio_core::AppResult;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ScratchWriter {
    dir: PathBuf,
}

impl ScratchWriter {
    /// Create the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> AppResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn chunk_path(&self, chapter: usize, chunk: usize) -> PathBuf {
        self.dir
            .join(sanitize_filename(&format!("chapter_{chapter:04}_chunk_{chunk:04}.html")))
    }

    pub fn write_chunk(&self, chapter: usize, chunk: usize, text: &str) {
        let path = self.chunk_path(chapter, chunk);
        match std::fs::write(&path, text) {
            Ok(()) => tracing::trace!("Saved chunk to {}", path.display()),
            Err(e) => tracing::warn!("Could not save chunk to {}: {}", path.display(), e),
        }
    }
}

fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|ch| match ch {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => ch,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_chunk() {
        let temp = TempDir::new().unwrap();
        let scratch = ScratchWriter::new(temp.path().join("run")).unwrap();

        scratch.write_chunk(3, 7, "<p>Tekst</p>");

        let path = temp.path().join("run").join("chapter_0003_chunk_0007.html");
        assert_eq!(scratch.chunk_path(3, 7), path);
        assert_eq!(std::fs::read_to_string(path).unwrap(), "<p>Tekst</p>");
    }

    #[test]
    fn test_write_failure_is_not_fatal() {
        let temp = TempDir::new().unwrap();
        let scratch = ScratchWriter::new(temp.path()).unwrap();
        std::fs::create_dir(scratch.chunk_path(1, 1)).unwrap();

        // Target is a directory; the write fails and is only logged
        scratch.write_chunk(1, 1, "x");
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("a/b:c*d?.html"), "a_b_c_d_.html");
    }
}
