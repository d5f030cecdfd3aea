//! Raw zip container of an EPUB.
//!
//! Entries are kept in archive order together with their compression method,
//! timestamp and permissions, so a rewritten book differs from the input only
//! in the entries that were replaced.

use folio_core::{AppError, AppResult};
use std::collections::HashMap;
use std::fs::File;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

#[derive(Debug, Clone)]
pub struct EpubPackage {
    pub entries: Vec<PackageEntry>,
}

#[derive(Debug, Clone)]
pub struct PackageEntry {
    pub name: String,
    pub data: Vec<u8>,
    pub compression: CompressionMethod,
    pub last_modified: zip::DateTime,
    pub unix_mode: Option<u32>,
    pub is_dir: bool,
}

impl EpubPackage {
    pub fn read(path: &Path) -> AppResult<Self> {
        let file = File::open(path)
            .map_err(|e| AppError::Epub(format!("Failed to open {}: {}", path.display(), e)))?;
        Self::from_reader(file)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> AppResult<Self> {
        Self::from_reader(Cursor::new(bytes))
    }

    fn from_reader<R: Read + Seek>(reader: R) -> AppResult<Self> {
        let mut zip = ZipArchive::new(reader)
            .map_err(|e| AppError::Epub(format!("Not a zip archive: {}", e)))?;

        let mut entries = Vec::with_capacity(zip.len());
        for i in 0..zip.len() {
            let mut file = zip
                .by_index(i)
                .map_err(|e| AppError::Epub(format!("Failed to read zip entry {}: {}", i, e)))?;
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            entries.push(PackageEntry {
                name: file.name().to_string(),
                data,
                compression: file.compression(),
                last_modified: file.last_modified().unwrap_or_default(),
                unix_mode: file.unix_mode(),
                is_dir: file.is_dir(),
            });
        }

        tracing::debug!("Read {} zip entries", entries.len());
        Ok(Self { entries })
    }

    pub fn entry(&self, name: &str) -> Option<&PackageEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Read an entry as UTF-8 text.
    pub fn read_string(&self, name: &str) -> AppResult<String> {
        let entry = self
            .entry(name)
            .ok_or_else(|| AppError::Epub(format!("Missing entry in archive: {}", name)))?;
        String::from_utf8(entry.data.clone())
            .map_err(|e| AppError::Epub(format!("Entry {} is not valid UTF-8: {}", name, e)))
    }

    pub fn write_with_replacements(
        &self,
        output_path: &Path,
        replacements: &HashMap<String, Vec<u8>>,
    ) -> AppResult<()> {
        let file = File::create(output_path).map_err(|e| {
            AppError::Epub(format!("Failed to create {}: {}", output_path.display(), e))
        })?;
        self.write_to(file, replacements)?;
        Ok(())
    }

    /// Serialize the archive, substituting replaced entries.
    pub fn write_to<W: Write + Seek>(
        &self,
        writer: W,
        replacements: &HashMap<String, Vec<u8>>,
    ) -> AppResult<W> {
        let mut zout = ZipWriter::new(writer);
        for ent in &self.entries {
            let data = replacements.get(&ent.name).unwrap_or(&ent.data);
            let mut opts = SimpleFileOptions::default()
                .compression_method(ent.compression)
                .last_modified_time(ent.last_modified);
            if let Some(mode) = ent.unix_mode {
                opts = opts.unix_permissions(mode);
            }
            if ent.is_dir || ent.name.ends_with('/') {
                zout.add_directory(ent.name.as_str(), opts)
                    .map_err(|e| zip_error("add directory", &ent.name, e))?;
            } else {
                zout.start_file(ent.name.as_str(), opts)
                    .map_err(|e| zip_error("start file", &ent.name, e))?;
                zout.write_all(data)?;
            }
        }
        zout.finish()
            .map_err(|e| AppError::Epub(format!("Failed to finish archive: {}", e)))
    }
}

fn zip_error(action: &str, name: &str, err: zip::result::ZipError) -> AppError {
    AppError::Epub(format!("Failed to {} {}: {}", action, name, err))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_zip() -> Vec<u8> {
        let mut zout = ZipWriter::new(Cursor::new(Vec::new()));
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        zout.start_file("mimetype", stored).unwrap();
        zout.write_all(b"application/epub+zip").unwrap();
        zout.add_directory("OEBPS/", SimpleFileOptions::default())
            .unwrap();
        zout.start_file("OEBPS/a.txt", SimpleFileOptions::default())
            .unwrap();
        zout.write_all(b"alpha").unwrap();
        zout.finish().unwrap().into_inner()
    }

    #[test]
    fn test_read_entries_in_order() {
        let pkg = EpubPackage::from_bytes(build_zip()).unwrap();
        let names: Vec<_> = pkg.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["mimetype", "OEBPS/", "OEBPS/a.txt"]);
        assert_eq!(pkg.entries[0].compression, CompressionMethod::Stored);
        assert_eq!(pkg.read_string("OEBPS/a.txt").unwrap(), "alpha");
    }

    #[test]
    fn test_write_with_replacement() {
        let pkg = EpubPackage::from_bytes(build_zip()).unwrap();
        let mut replacements = HashMap::new();
        replacements.insert("OEBPS/a.txt".to_string(), b"beta".to_vec());

        let bytes = pkg
            .write_to(Cursor::new(Vec::new()), &replacements)
            .unwrap()
            .into_inner();
        let reread = EpubPackage::from_bytes(bytes).unwrap();

        assert_eq!(reread.entries[0].name, "mimetype");
        assert_eq!(reread.entries[0].compression, CompressionMethod::Stored);
        assert_eq!(reread.read_string("OEBPS/a.txt").unwrap(), "beta");
        assert_eq!(reread.read_string("mimetype").unwrap(), "application/epub+zip");
    }

    #[test]
    fn test_not_a_zip() {
        let err = EpubPackage::from_bytes(b"plain text".to_vec()).unwrap_err();
        assert!(matches!(err, AppError::Epub(_)));
    }

    #[test]
    fn test_missing_entry() {
        let pkg = EpubPackage::from_bytes(build_zip()).unwrap();
        assert!(pkg.read_string("nope").is_err());
    }
}
