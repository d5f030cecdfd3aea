//! In-memory EPUB fixtures for tests.
//!
//! Compiled for this crate's tests and, behind the `fixtures` feature, for
//! the translation pipeline's tests.

use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub fn chapter(n: usize) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
         <html xmlns=\"http://www.w3.org/1999/xhtml\">\n\
         <head><title>Chapter {n}</title><link href=\"../style.css\" rel=\"stylesheet\" type=\"text/css\"/></head>\n\
         <body class=\"chapter\">\n\
         <h1 id=\"c{n}\">Chapter {n}</h1>\n\
         <p class=\"text\">Line one of chapter {n}.</p>\n\
         <p class=\"text\">Line two of chapter {n}.</p>\n\
         </body>\n\
         </html>"
    )
}

/// A small EPUB 2 book with `chapters` documents and an NCX.
pub fn book_bytes(chapters: usize) -> Vec<u8> {
    let mut manifest = String::new();
    let mut spine = String::new();
    let mut nav_points = String::new();
    for n in 1..=chapters {
        manifest.push_str(&format!(
            "<item id=\"ch{n}\" href=\"text/ch{n}.xhtml\" media-type=\"application/xhtml+xml\"/>\n"
        ));
        spine.push_str(&format!("<itemref idref=\"ch{n}\"/>"));
        nav_points.push_str(&format!(
            "<navPoint id=\"np{n}\"><navLabel><text>Chapter {n}</text></navLabel><content src=\"text/ch{n}.xhtml\"/></navPoint>\n"
        ));
    }

    let opf = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <package xmlns=\"http://www.idpf.org/2007/opf\" version=\"2.0\">\n\
         <metadata xmlns:dc=\"http://purl.org/dc/elements/1.1/\">\n\
         <dc:title>Test Book</dc:title>\n\
         <dc:creator>Test Author</dc:creator>\n\
         <dc:language>en</dc:language>\n\
         </metadata>\n\
         <manifest>\n\
         <item id=\"ncx\" href=\"toc.ncx\" media-type=\"application/x-dtbncx+xml\"/>\n\
         <item id=\"css\" href=\"style.css\" media-type=\"text/css\"/>\n\
         {manifest}</manifest>\n\
         <spine toc=\"ncx\">{spine}</spine>\n\
         </package>"
    );

    let ncx = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <ncx xmlns=\"http://www.daisy.org/z3986/2005/ncx/\" version=\"2005-1\">\n\
         <navMap>\n{nav_points}</navMap>\n</ncx>"
    );

    let container = "<?xml version=\"1.0\"?>\n\
        <container version=\"1.0\" xmlns=\"urn:oasis:names:tc:opendocument:xmlns:container\">\
        <rootfiles><rootfile full-path=\"OEBPS/content.opf\" media-type=\"application/oebps-package+xml\"/></rootfiles>\
        </container>";

    let mut zout = ZipWriter::new(Cursor::new(Vec::new()));
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let deflated = SimpleFileOptions::default();

    zout.start_file("mimetype", stored).unwrap();
    zout.write_all(b"application/epub+zip").unwrap();
    zout.start_file("META-INF/container.xml", deflated).unwrap();
    zout.write_all(container.as_bytes()).unwrap();
    zout.start_file("OEBPS/content.opf", deflated).unwrap();
    zout.write_all(opf.as_bytes()).unwrap();
    zout.start_file("OEBPS/toc.ncx", deflated).unwrap();
    zout.write_all(ncx.as_bytes()).unwrap();
    zout.start_file("OEBPS/style.css", deflated).unwrap();
    zout.write_all(b"p { margin: 0; }").unwrap();
    for n in 1..=chapters {
        zout.start_file(format!("OEBPS/text/ch{n}.xhtml"), deflated)
            .unwrap();
        zout.write_all(chapter(n).as_bytes()).unwrap();
    }
    zout.finish().unwrap().into_inner()
}
