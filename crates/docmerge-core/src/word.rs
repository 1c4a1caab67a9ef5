//! Word (OOXML `.docx`) documents, reduced to their paragraph text.
//!
//! A `.docx` file is a zip package; the body lives in the main document part
//! (normally `word/document.xml`). Only top-level body paragraphs are read:
//! table cells and text boxes are skipped, and run formatting is discarded.

use std::io::{Cursor, Read, Write};

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{Error, Result};

const WORDPROCESSING_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const OFFICE_DOCUMENT_REL: &str = "/officeDocument";
const DEFAULT_MAIN_PART: &str = "word/document.xml";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

/// One body paragraph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paragraph {
    /// Plain text; tabs as `\t`, line breaks as `\n`
    pub text: String,
    /// Start this paragraph on a new page
    pub page_break_before: bool,
}

impl Paragraph {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            page_break_before: false,
        }
    }

    #[must_use]
    pub const fn with_page_break(mut self) -> Self {
        self.page_break_before = true;
        self
    }
}

/// A parsed Word upload.
#[derive(Debug, Clone)]
pub struct WordDocument {
    name: String,
    paragraphs: Vec<Paragraph>,
}

impl WordDocument {
    /// Parse `.docx` bytes into paragraphs. Malformed input fails with [`Error::Parse`].
    pub fn parse(name: impl Into<String>, bytes: &[u8]) -> Result<Self> {
        let name = name.into();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(|e| Error::parse(&name, e))?;

        let main_part = main_part_name(&mut archive);
        let xml = read_part(&mut archive, &main_part).map_err(|e| Error::parse(&name, e))?;
        let paragraphs = body_paragraphs(&xml).map_err(|e| Error::parse(&name, e))?;

        Ok(Self { name, paragraphs })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }

    pub fn into_paragraphs(self) -> Vec<Paragraph> {
        self.paragraphs
    }
}

/// Join several documents' paragraphs, with a page break before each
/// document after the first.
///
/// Only text survives; the sources' own page-break flags are dropped. A
/// document without paragraphs passes its pending break on to the next one.
/// A break still pending after the last document becomes an empty
/// paragraph, so a trailing empty source still starts a new page.
pub fn join_paragraphs(documents: impl IntoIterator<Item = WordDocument>) -> Vec<Paragraph> {
    let mut joined = Vec::new();
    let mut pending_break = false;

    for (i, doc) in documents.into_iter().enumerate() {
        if i > 0 {
            pending_break = true;
        }
        for paragraph in doc.into_paragraphs() {
            joined.push(Paragraph {
                text: paragraph.text,
                page_break_before: std::mem::take(&mut pending_break),
            });
        }
    }

    if pending_break {
        joined.push(Paragraph::new("").with_page_break());
    }

    joined
}

/// Assemble a minimal `.docx` package from paragraphs.
pub fn build(paragraphs: &[Paragraph]) -> Result<Vec<u8>> {
    let document_xml = document_xml(paragraphs)?;

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let parts: [(&str, &[u8]); 3] = [
        ("[Content_Types].xml", CONTENT_TYPES.as_bytes()),
        ("_rels/.rels", ROOT_RELS.as_bytes()),
        (DEFAULT_MAIN_PART, &document_xml),
    ];
    for (name, body) in parts {
        zip.start_file(name, options)
            .map_err(|e| Error::WordBuild(e.to_string()))?;
        zip.write_all(body)?;
    }

    let cursor = zip.finish().map_err(|e| Error::WordBuild(e.to_string()))?;
    Ok(cursor.into_inner())
}

// =============================================================================
// Reading
// =============================================================================

/// Locate the main document part through the package relationships.
fn main_part_name<R: Read + std::io::Seek>(archive: &mut ZipArchive<R>) -> String {
    read_part(archive, "_rels/.rels")
        .ok()
        .and_then(|rels| office_document_target(&rels))
        .unwrap_or_else(|| DEFAULT_MAIN_PART.to_string())
}

fn office_document_target(rels: &str) -> Option<String> {
    let mut reader = Reader::from_str(rels);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e) | Event::Empty(e))
                if e.local_name().as_ref() == b"Relationship"
                    && attribute(&e, b"Type").is_some_and(|t| t.ends_with(OFFICE_DOCUMENT_REL)) =>
            {
                return attribute(&e, b"Target").map(|t| t.trim_start_matches('/').to_string());
            }
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
    }
}

fn read_part<R: Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> std::result::Result<String, String> {
    let mut part = archive
        .by_name(name)
        .map_err(|e| format!("missing part {name}: {e}"))?;
    let mut xml = String::new();
    part.read_to_string(&mut xml)
        .map_err(|e| format!("unreadable part {name}: {e}"))?;
    Ok(xml)
}

fn attribute(e: &BytesStart<'_>, local: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == local)
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

fn is_off(value: Option<&str>) -> bool {
    matches!(value, Some("0" | "false" | "off"))
}

/// Elements whose descendants never belong to the enclosing paragraph's text.
fn is_nested_container(name: &[u8]) -> bool {
    matches!(name, b"txbxContent" | b"tbl" | b"footnote" | b"comment")
}

struct BodyReader {
    stack: Vec<Vec<u8>>,
    paragraphs: Vec<Paragraph>,
    current: Option<Paragraph>,
    /// Stack depth at which the open paragraph started
    depth: usize,
}

impl BodyReader {
    fn parent_is(&self, name: &[u8]) -> bool {
        self.stack.last().is_some_and(|n| n == name)
    }

    /// Whether the cursor sits directly inside the open paragraph's content.
    fn in_paragraph(&self) -> bool {
        self.current.is_some()
            && !self.stack[self.depth..]
                .iter()
                .any(|n| is_nested_container(n))
    }

    fn starts_body_paragraph(&self, name: &[u8]) -> bool {
        name == b"p" && self.current.is_none() && self.parent_is(b"body")
    }

    fn marker(&mut self, e: &BytesStart<'_>) {
        if !self.in_paragraph() {
            return;
        }
        let in_run = self.parent_is(b"r");
        let in_props = self.parent_is(b"pPr");
        let Some(paragraph) = self.current.as_mut() else {
            return;
        };

        match e.local_name().as_ref() {
            b"tab" if in_run => paragraph.text.push('\t'),
            b"cr" if in_run => paragraph.text.push('\n'),
            b"br" if in_run => {
                if attribute(e, b"type").as_deref() != Some("page") {
                    paragraph.text.push('\n');
                }
            }
            b"pageBreakBefore" if in_props => {
                paragraph.page_break_before = !is_off(attribute(e, b"val").as_deref());
            }
            _ => {}
        }
    }
}

fn body_paragraphs(xml: &str) -> std::result::Result<Vec<Paragraph>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut body = BodyReader {
        stack: Vec::new(),
        paragraphs: Vec::new(),
        current: None,
        depth: 0,
    };

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = e.local_name().as_ref().to_vec();
                if body.starts_body_paragraph(&name) {
                    body.current = Some(Paragraph::default());
                    body.depth = body.stack.len() + 1;
                } else {
                    body.marker(&e);
                }
                body.stack.push(name);
            }
            Event::Empty(e) => {
                if body.starts_body_paragraph(e.local_name().as_ref()) {
                    body.paragraphs.push(Paragraph::default());
                } else {
                    body.marker(&e);
                }
            }
            Event::End(_) => {
                body.stack.pop();
                if body.current.is_some() && body.stack.len() < body.depth {
                    body.paragraphs.extend(body.current.take());
                }
            }
            Event::Text(t) => {
                if body.in_paragraph() && body.parent_is(b"t") {
                    let text = t.unescape()?;
                    if let Some(paragraph) = body.current.as_mut() {
                        paragraph.text.push_str(&text);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(body.paragraphs)
}

// =============================================================================
// Writing
// =============================================================================

struct XmlOut(Writer<Vec<u8>>);

impl XmlOut {
    fn event(&mut self, event: Event<'_>) -> Result<()> {
        self.0
            .write_event(event)
            .map_err(|e| Error::WordBuild(e.to_string()))
    }

    fn start(&mut self, name: &str) -> Result<()> {
        self.event(Event::Start(BytesStart::new(name)))
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn empty(&mut self, name: &str) -> Result<()> {
        self.event(Event::Empty(BytesStart::new(name)))
    }
}

fn document_xml(paragraphs: &[Paragraph]) -> Result<Vec<u8>> {
    let mut out = XmlOut(Writer::new(Vec::new()));

    out.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    let mut document = BytesStart::new("w:document");
    document.push_attribute(("xmlns:w", WORDPROCESSING_NS));
    out.event(Event::Start(document))?;
    out.start("w:body")?;

    for paragraph in paragraphs {
        out.start("w:p")?;
        if paragraph.page_break_before {
            out.start("w:pPr")?;
            out.empty("w:pageBreakBefore")?;
            out.end("w:pPr")?;
        }
        if !paragraph.text.is_empty() {
            out.start("w:r")?;
            for (i, line) in paragraph.text.split('\n').enumerate() {
                if i > 0 {
                    out.empty("w:br")?;
                }
                for (j, segment) in line.split('\t').enumerate() {
                    if j > 0 {
                        out.empty("w:tab")?;
                    }
                    if !segment.is_empty() {
                        let mut t = BytesStart::new("w:t");
                        t.push_attribute(("xml:space", "preserve"));
                        out.event(Event::Start(t))?;
                        out.event(Event::Text(BytesText::new(segment)))?;
                        out.end("w:t")?;
                    }
                }
            }
            out.end("w:r")?;
        }
        out.end("w:p")?;
    }

    out.end("w:body")?;
    out.end("w:document")?;
    Ok(out.0.into_inner())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn docx(paragraphs: &[&str]) -> Vec<u8> {
        let paragraphs: Vec<Paragraph> = paragraphs.iter().map(|t| Paragraph::new(*t)).collect();
        build(&paragraphs).unwrap()
    }

    fn texts(doc: &WordDocument) -> Vec<&str> {
        doc.paragraphs().iter().map(|p| p.text.as_str()).collect()
    }

    /// Package a hand-written document.xml body.
    fn package(body: &str) -> Vec<u8> {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><w:document xmlns:w="{WORDPROCESSING_NS}"><w:body>{body}</w:body></w:document>"#
        );
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        zip.start_file("[Content_Types].xml", options).unwrap();
        zip.write_all(CONTENT_TYPES.as_bytes()).unwrap();
        zip.start_file("_rels/.rels", options).unwrap();
        zip.write_all(ROOT_RELS.as_bytes()).unwrap();
        zip.start_file("word/document.xml", options).unwrap();
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn test_build_then_parse_keeps_paragraph_text() {
        let bytes = docx(&["Hello", "", "tab\there", "two\nlines", "a < b & c"]);
        let doc = WordDocument::parse("x.docx", &bytes).unwrap();

        assert_eq!(texts(&doc), ["Hello", "", "tab\there", "two\nlines", "a < b & c"]);
    }

    #[test]
    fn test_page_break_flag_is_written_and_read() {
        let bytes = build(&[Paragraph::new("one"), Paragraph::new("two").with_page_break()]).unwrap();
        let doc = WordDocument::parse("x.docx", &bytes).unwrap();

        let flags: Vec<bool> = doc.paragraphs().iter().map(|p| p.page_break_before).collect();
        assert_eq!(flags, [false, true]);
    }

    #[test]
    fn test_parse_concatenates_runs_and_skips_tables() {
        let bytes = package(
            "<w:p><w:r><w:t>Hel</w:t></w:r><w:r><w:rPr><w:b/></w:rPr><w:t>lo</w:t></w:r></w:p>\
             <w:tbl><w:tr><w:tc><w:p><w:r><w:t>cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl>\
             <w:p/>\
             <w:p><w:pPr><w:tabs><w:tab w:val=\"left\" w:pos=\"720\"/></w:tabs></w:pPr><w:r><w:t>after</w:t></w:r></w:p>",
        );
        let doc = WordDocument::parse("x.docx", &bytes).unwrap();

        assert_eq!(texts(&doc), ["Hello", "", "after"]);
    }

    #[test]
    fn test_parse_ignores_text_box_content() {
        let bytes = package(
            "<w:p><w:r><w:t>outer</w:t></w:r><w:r><w:pict><w:txbxContent><w:p><w:r><w:t>inner</w:t></w:r></w:p></w:txbxContent></w:pict></w:r></w:p>",
        );
        let doc = WordDocument::parse("x.docx", &bytes).unwrap();

        assert_eq!(texts(&doc), ["outer"]);
    }

    #[test]
    fn test_page_break_before_off_values() {
        let bytes = package(
            "<w:p><w:pPr><w:pageBreakBefore w:val=\"false\"/></w:pPr><w:r><w:t>a</w:t></w:r></w:p>",
        );
        let doc = WordDocument::parse("x.docx", &bytes).unwrap();

        assert!(!doc.paragraphs()[0].page_break_before);
    }

    #[test]
    fn test_parse_rejects_non_zip() {
        let err = WordDocument::parse("bad.docx", b"plain text").unwrap_err();
        assert!(matches!(err, Error::Parse { ref name, .. } if name == "bad.docx"));
    }

    #[test]
    fn test_parse_rejects_zip_without_document() {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("hello.txt", SimpleFileOptions::default()).unwrap();
        zip.write_all(b"hi").unwrap();
        let bytes = zip.finish().unwrap().into_inner();

        assert!(WordDocument::parse("empty.docx", &bytes).is_err());
    }

    #[test]
    fn test_join_inserts_one_break_between_documents() {
        let x = WordDocument::parse("x.docx", &docx(&["Hello"])).unwrap();
        let y = WordDocument::parse("y.docx", &docx(&["World"])).unwrap();

        let joined = join_paragraphs([x, y]);
        assert_eq!(
            joined,
            [Paragraph::new("Hello"), Paragraph::new("World").with_page_break()]
        );
    }

    #[test]
    fn test_join_carries_break_over_empty_document() {
        let x = WordDocument::parse("x.docx", &docx(&["a"])).unwrap();
        let empty = WordDocument::parse("e.docx", &docx(&[])).unwrap();
        let y = WordDocument::parse("y.docx", &docx(&["b", "c"])).unwrap();

        let joined = join_paragraphs([x, empty, y]);
        let flags: Vec<bool> = joined.iter().map(|p| p.page_break_before).collect();
        assert_eq!(flags, [false, true, false]);
    }

    #[test]
    fn test_join_keeps_break_before_trailing_empty_document() {
        let x = WordDocument::parse("x.docx", &docx(&["a"])).unwrap();
        let empty = WordDocument::parse("e.docx", &docx(&[])).unwrap();

        let joined = join_paragraphs([x, empty]);
        assert_eq!(joined, [Paragraph::new("a"), Paragraph::new("").with_page_break()]);
    }
}
