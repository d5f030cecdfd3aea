//! Read-modify-write access to an EPUB.

use crate::head_links::{restore_head_links, HeadLink};
use crate::opf::{self, PackageDocument, CONTAINER_PATH};
use crate::package::EpubPackage;
use crate::toc::{TableOfContents, TocEntry, TocFormat};
use folio_core::{AppError, AppResult};
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

/// One XHTML document item of the book.
#[derive(Debug, Clone)]
pub struct Document {
    /// Zip path
    pub name: String,
    /// Manifest id
    pub id: String,
    /// Manifest href, relative to the package document
    pub href: String,
    content: String,
    original: String,
    pub(crate) head_links: Vec<HeadLink>,
}

impl Document {
    pub fn new(
        name: impl Into<String>,
        id: impl Into<String>,
        href: impl Into<String>,
        content: String,
    ) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            href: href.into(),
            original: content.clone(),
            content,
            head_links: Vec::new(),
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn set_content(&mut self, content: String) {
        self.content = content;
    }

    pub fn head_links(&self) -> &[HeadLink] {
        &self.head_links
    }

    /// Content as it will be written, with preserved head links put back.
    pub fn final_content(&self) -> String {
        restore_head_links(&self.content, &self.head_links).unwrap_or_else(|| self.content.clone())
    }

    pub fn is_modified(&self) -> bool {
        self.final_content() != self.original
    }
}

pub struct EpubBook {
    package: EpubPackage,
    opf: PackageDocument,
    opf_source: String,
    language_changed: bool,
    documents: Vec<Document>,
    toc: Option<TableOfContents>,
}

impl EpubBook {
    pub fn open(path: &Path) -> AppResult<Self> {
        tracing::info!("Opening {}", path.display());
        Self::from_package(EpubPackage::read(path)?)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> AppResult<Self> {
        Self::from_package(EpubPackage::from_bytes(bytes)?)
    }

    pub fn from_package(package: EpubPackage) -> AppResult<Self> {
        let container = package.read_string(CONTAINER_PATH)?;
        let opf_path = opf::parse_container(&container)?;
        let opf_source = package.read_string(&opf_path)?;
        let opf = opf::parse_package(&opf_path, &opf_source)?;

        let mut documents = Vec::new();
        for item in opf.manifest.iter().filter(|item| item.is_document()) {
            let name = opf.resolve(&item.href);
            match package.read_string(&name) {
                Ok(content) => documents.push(Document::new(name, &item.id, &item.href, content)),
                Err(e) => tracing::warn!("Skipping document {}: {}", item.href, e),
            }
        }

        let toc = load_toc(&package, &opf);

        tracing::info!(
            "Loaded '{}' ({} documents)",
            opf.title.as_deref().unwrap_or("untitled"),
            documents.len()
        );

        Ok(Self {
            package,
            opf,
            opf_source,
            language_changed: false,
            documents,
            toc,
        })
    }

    pub fn title(&self) -> Option<&str> {
        self.opf.title.as_deref()
    }

    pub fn author(&self) -> Option<&str> {
        self.opf.creator.as_deref()
    }

    pub fn language(&self) -> Option<&str> {
        self.opf.language.as_deref()
    }

    pub fn set_language(&mut self, tag: &str) -> AppResult<()> {
        self.opf_source = opf::set_language(&self.opf_source, tag)?;
        self.opf.language = Some(tag.to_string());
        self.language_changed = true;
        Ok(())
    }

    /// Document items in manifest order; chapter `i` is `documents()[i - 1]`.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn documents_mut(&mut self) -> &mut [Document] {
        &mut self.documents
    }

    pub fn toc(&self) -> Option<&[TocEntry]> {
        self.toc.as_ref().map(|toc| toc.entries())
    }

    pub fn set_toc(&mut self, entries: Vec<TocEntry>) -> AppResult<()> {
        match self.toc.as_mut() {
            Some(toc) => toc.set_entries(entries),
            None => Err(AppError::Epub("Book has no table of contents".to_string())),
        }
    }

    fn replacements(&self) -> HashMap<String, Vec<u8>> {
        let mut replacements = HashMap::new();

        for doc in &self.documents {
            if doc.is_modified() {
                replacements.insert(doc.name.clone(), doc.final_content().into_bytes());
            }
        }
        if self.language_changed {
            replacements.insert(self.opf.path.clone(), self.opf_source.clone().into_bytes());
        }
        if let Some(toc) = self.toc.as_ref().filter(|toc| toc.is_modified()) {
            replacements.insert(toc.path.clone(), toc.render().into_bytes());
        }
        replacements
    }

    /// Write the book with all mutations applied to a new file.
    pub fn write(&self, path: &Path) -> AppResult<()> {
        let replacements = self.replacements();
        tracing::info!(
            "Writing {} ({} entries changed)",
            path.display(),
            replacements.len()
        );
        self.package.write_with_replacements(path, &replacements)
    }

    pub fn to_bytes(&self) -> AppResult<Vec<u8>> {
        let cursor = self
            .package
            .write_to(Cursor::new(Vec::new()), &self.replacements())?;
        Ok(cursor.into_inner())
    }
}

fn load_toc(package: &EpubPackage, opf: &PackageDocument) -> Option<TableOfContents> {
    let item = opf.navigation_item()?;
    let path = opf.resolve(&item.href);
    let format = if item.is_ncx() {
        TocFormat::Ncx
    } else {
        TocFormat::Nav
    };

    let parsed = package
        .read_string(&path)
        .and_then(|source| TableOfContents::parse(format, &path, source));

    match parsed {
        Ok(toc) => Some(toc),
        Err(e) => {
            tracing::warn!("Ignoring table of contents {}: {}", path, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{book_bytes, chapter};
    use crate::head_links::preserve_head_links;
    use crate::toc::TocLink;
    use tempfile::TempDir;

    #[test]
    fn test_open_book_metadata_and_documents() {
        let book = EpubBook::from_bytes(book_bytes(3)).unwrap();
        assert_eq!(book.title(), Some("Test Book"));
        assert_eq!(book.author(), Some("Test Author"));
        assert_eq!(book.language(), Some("en"));

        let names: Vec<_> = book.documents().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["OEBPS/text/ch1.xhtml", "OEBPS/text/ch2.xhtml", "OEBPS/text/ch3.xhtml"]
        );
        assert_eq!(book.documents()[1].content(), chapter(2));
        assert_eq!(book.toc().unwrap().len(), 3);
    }

    #[test]
    fn test_untouched_book_writes_no_replacements() {
        let mut book = EpubBook::from_bytes(book_bytes(2)).unwrap();
        for doc in book.documents_mut() {
            preserve_head_links(doc);
        }
        assert!(book.replacements().is_empty());
    }

    #[test]
    fn test_write_applies_mutations() {
        let mut book = EpubBook::from_bytes(book_bytes(2)).unwrap();
        book.set_language("pl").unwrap();

        let doc = &mut book.documents_mut()[0];
        preserve_head_links(doc);
        doc.set_content(
            "<html><head><title>Rozdział 1</title></head><body><p>Tekst</p></body></html>".to_string(),
        );

        let mut entries = book.toc().unwrap().to_vec();
        entries[0] = TocEntry::Link(TocLink {
            href: "text/ch1.xhtml".to_string(),
            title: "Rozdział 1".to_string(),
            id: Some("np1".to_string()),
        });
        book.set_toc(entries).unwrap();

        let temp = TempDir::new().unwrap();
        let out = temp.path().join("out.epub");
        book.write(&out).unwrap();

        let reread = EpubBook::open(&out).unwrap();
        assert_eq!(reread.language(), Some("pl"));
        assert_eq!(reread.toc().unwrap()[0].title(), "Rozdział 1");
        assert_eq!(reread.toc().unwrap()[1].title(), "Chapter 2");

        let first = reread.documents()[0].content();
        assert!(first.contains("<p>Tekst</p>"));
        assert!(first.contains("<link href=\"../style.css\" rel=\"stylesheet\" type=\"text/css\"/></head>"));
        assert_eq!(reread.documents()[1].content(), chapter(2));

        let pkg = EpubPackage::read(&out).unwrap();
        assert_eq!(pkg.entries[0].name, "mimetype");
    }

    #[test]
    fn test_missing_container_is_epub_error() {
        let pkg = EpubPackage::from_bytes(book_bytes(1)).unwrap();
        let stripped = EpubPackage {
            entries: pkg
                .entries
                .into_iter()
                .filter(|e| e.name != CONTAINER_PATH)
                .collect(),
        };
        assert!(matches!(
            EpubBook::from_package(stripped),
            Err(AppError::Epub(_))
        ));
    }
}
