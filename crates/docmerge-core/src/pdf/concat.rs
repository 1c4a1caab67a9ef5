//! Concatenate parsed PDFs into one document.

use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::debug;

use super::PdfDocument;
use crate::error::{Error, Result};

/// Page attributes a page may inherit from its page tree ancestors.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Upper bound on page tree depth, guards against cyclic Parent chains.
const MAX_TREE_DEPTH: usize = 64;

/// Concatenate every page of every document, in the given order.
///
/// The source page trees are dropped and all pages hang off one flat tree, so
/// inheritable attributes are copied onto each page first. Documents without
/// pages contribute nothing; an empty input produces a valid zero-page PDF.
pub fn concatenate(documents: Vec<PdfDocument>) -> Result<Vec<u8>> {
    let mut merged = Document::with_version("1.5");
    let mut max_id: u32 = 1;
    let mut pages: Vec<(ObjectId, Dictionary)> = Vec::new();
    let sources = documents.len();

    for pdf in documents {
        let name = pdf.name().to_string();
        let mut doc = pdf.into_inner();

        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        for page_id in doc.get_pages().into_values() {
            let page = flatten_page(&doc, page_id)
                .map_err(|e| Error::parse(&name, format!("page object {page_id:?}: {e}")))?;
            pages.push((page_id, page));
        }

        for (object_id, object) in doc.objects {
            match object.type_name().unwrap_or(b"") {
                b"Catalog" | b"Pages" | b"Page" | b"Outlines" | b"Outline" => {}
                _ => {
                    merged.objects.insert(object_id, object);
                }
            }
        }
    }

    merged.max_id = max_id;
    let pages_id = merged.new_object_id();

    let mut kids = Vec::with_capacity(pages.len());
    for (page_id, mut page) in pages {
        page.set("Parent", Object::Reference(pages_id));
        merged.objects.insert(page_id, Object::Dictionary(page));
        kids.push(Object::Reference(page_id));
    }
    let total_pages = kids.len();

    merged.objects.insert(
        pages_id,
        Object::Dictionary(Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(kids)),
            (
                "Count",
                Object::Integer(i64::try_from(total_pages).unwrap_or(i64::MAX)),
            ),
        ])),
    );

    let catalog_id = merged.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    merged.trailer.set("Root", Object::Reference(catalog_id));

    merged.prune_objects();
    merged.renumber_objects();
    merged.compress();

    let mut output = Vec::new();
    merged
        .save_to(&mut output)
        .map_err(|e| Error::PdfWrite(format!("failed to save merged PDF: {e}")))?;

    debug!(
        "Concatenated {} documents into {} pages ({} bytes)",
        sources,
        total_pages,
        output.len()
    );
    Ok(output)
}

/// Copy of a page dictionary with inherited attributes made explicit.
fn flatten_page(doc: &Document, page_id: ObjectId) -> lopdf::Result<Dictionary> {
    let mut page = doc.get_dictionary(page_id)?.clone();
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();

    for _ in 0..MAX_TREE_DEPTH {
        let Some(node_id) = parent else { break };
        let Ok(node) = doc.get_dictionary(node_id) else {
            break;
        };
        for key in INHERITABLE {
            if !page.has(key)
                && let Ok(value) = node.get(key)
            {
                page.set(key.to_vec(), value.clone());
            }
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }

    Ok(page)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::pdf::fixtures::{every_page_has_media_box, labelled_pdf, page_labels};

    fn parsed(name: &str, labels: &[&str]) -> PdfDocument {
        PdfDocument::parse(name, &labelled_pdf(labels)).unwrap()
    }

    #[test]
    fn test_concatenate_preserves_document_order() {
        let out = concatenate(vec![
            parsed("a.pdf", &["a1", "a2"]),
            parsed("b.pdf", &["b1"]),
            parsed("c.pdf", &["c1", "c2"]),
        ])
        .unwrap();

        assert_eq!(page_labels(&out), ["a1", "a2", "b1", "c1", "c2"]);
    }

    #[test]
    fn test_concatenate_single_is_identity_on_pages() {
        let out = concatenate(vec![parsed("a.pdf", &["a1", "a2", "a3"])]).unwrap();
        assert_eq!(page_labels(&out), ["a1", "a2", "a3"]);
    }

    #[test]
    fn test_concatenate_skips_empty_documents() {
        let out = concatenate(vec![
            parsed("a.pdf", &["a1"]),
            parsed("empty.pdf", &[]),
            parsed("b.pdf", &["b1"]),
        ])
        .unwrap();

        assert_eq!(page_labels(&out), ["a1", "b1"]);
    }

    #[test]
    fn test_concatenate_nothing_is_valid_empty_pdf() {
        let out = concatenate(Vec::new()).unwrap();
        let doc = PdfDocument::parse("merged.pdf", &out).unwrap();
        assert_eq!(doc.page_count(), 0);
    }

    #[test]
    fn test_inherited_attributes_survive() {
        let out =
            concatenate(vec![parsed("a.pdf", &["a1"]), parsed("b.pdf", &["b1"])]).unwrap();
        assert!(every_page_has_media_box(&out));
    }
}
