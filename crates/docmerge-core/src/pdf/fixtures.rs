//! In-memory PDFs for unit tests.
//!
//! Every page carries its label as a single text-showing operation, so tests
//! can recover the page sequence of any output without rendering it.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream};

/// Build a PDF with one page per label.
///
/// Resources and MediaBox live on the page tree node, so pages only get them
/// through inheritance.
pub fn labelled_pdf(labels: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let page_tree_id = doc.new_object_id();

    let font_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
    ]));
    let resources_id = doc.add_object(Dictionary::from_iter([(
        "Font",
        Object::Dictionary(Dictionary::from_iter([("F1", Object::Reference(font_id))])),
    )]));

    let mut kids = Vec::with_capacity(labels.len());
    for label in labels {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![100.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*label)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id =
            doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap_or_default()));
        let page_id = doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(page_tree_id)),
            ("Contents", Object::Reference(content_id)),
        ]));
        kids.push(Object::Reference(page_id));
    }

    let count = i64::try_from(kids.len()).unwrap_or_default();
    doc.objects.insert(
        page_tree_id,
        Object::Dictionary(Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(kids)),
            ("Count", Object::Integer(count)),
            ("Resources", Object::Reference(resources_id)),
            (
                "MediaBox",
                Object::Array(vec![0.into(), 0.into(), 612.into(), 792.into()]),
            ),
        ])),
    );

    let catalog_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(page_tree_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut output = Vec::new();
    doc.save_to(&mut output).unwrap_or_default();
    output
}

/// Labels of every page, in page order.
pub fn page_labels(bytes: &[u8]) -> Vec<String> {
    let Ok(doc) = Document::load_mem(bytes) else {
        return Vec::new();
    };
    doc.get_pages()
        .into_values()
        .map(|page_id| {
            let content = doc.get_page_content(page_id).unwrap_or_default();
            label_in(&content)
        })
        .collect()
}

fn label_in(content: &[u8]) -> String {
    let text = String::from_utf8_lossy(content);
    text.split_once('(')
        .and_then(|(_, rest)| rest.split_once(')'))
        .map(|(label, _)| label.to_string())
        .unwrap_or_default()
}

/// Whether a page of `bytes` can still reach a MediaBox (own or inherited).
pub fn every_page_has_media_box(bytes: &[u8]) -> bool {
    let Ok(doc) = Document::load_mem(bytes) else {
        return false;
    };
    doc.get_pages().into_values().all(|page_id| {
        let mut current = Some(page_id);
        while let Some(id) = current {
            let Ok(dict) = doc.get_dictionary(id) else {
                return false;
            };
            if dict.has(b"MediaBox") {
                return true;
            }
            current = dict.get(b"Parent").and_then(Object::as_reference).ok();
        }
        false
    })
}
