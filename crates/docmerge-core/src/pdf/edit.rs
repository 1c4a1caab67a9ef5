//! Page-deletion edits.

use tracing::debug;

use super::{PageSelection, PdfDocument};
use crate::error::Result;

/// Outcome of a page-deletion edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEdit {
    /// Nothing selected; the original bytes stand as they are
    Passthrough,
    /// The rewritten document and its remaining page count
    Rewritten { bytes: Vec<u8>, pages: usize },
}

/// Delete the selected 1-based pages from `original`.
///
/// The input is never modified. An empty selection short-circuits to
/// [`PageEdit::Passthrough`] without parsing anything.
pub fn delete_pages(name: &str, original: &[u8], selection: &PageSelection) -> Result<PageEdit> {
    if selection.is_empty() {
        debug!("Empty page selection for {}, nothing to rewrite", name);
        return Ok(PageEdit::Passthrough);
    }

    delete_parsed_pages(PdfDocument::parse(name, original)?, selection)
}

/// Same as [`delete_pages`], for a document the caller already parsed
/// (for instance to learn its page count first).
pub fn delete_parsed_pages(mut doc: PdfDocument, selection: &PageSelection) -> Result<PageEdit> {
    if selection.is_empty() {
        return Ok(PageEdit::Passthrough);
    }

    doc.delete_pages(selection)?;
    let pages = doc.page_count();
    let bytes = doc.to_bytes()?;

    Ok(PageEdit::Rewritten { bytes, pages })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::pdf::fixtures::{labelled_pdf, page_labels};

    #[test]
    fn test_empty_selection_is_passthrough() {
        let original = labelled_pdf(&["a1", "a2"]);
        let edit = delete_pages("a.pdf", &original, &PageSelection::new()).unwrap();
        assert_eq!(edit, PageEdit::Passthrough);
    }

    #[test]
    fn test_rewrite_drops_selected_pages() {
        let original = labelled_pdf(&["a1", "a2", "a3"]);
        let edit = delete_pages("a.pdf", &original, &[2].into_iter().collect()).unwrap();

        let PageEdit::Rewritten { bytes, pages } = edit else {
            panic!("expected a rewrite");
        };
        assert_eq!(pages, 2);
        assert_eq!(page_labels(&bytes), ["a1", "a3"]);
        // The original buffer is untouched
        assert_eq!(page_labels(&original), ["a1", "a2", "a3"]);
    }

    #[test]
    fn test_parsed_document_is_rewritten() {
        let doc = PdfDocument::parse("a.pdf", &labelled_pdf(&["a1", "a2", "a3"])).unwrap();
        let selection = PageSelection::parse("1-2", doc.page_count()).unwrap();

        let PageEdit::Rewritten { bytes, pages } = delete_parsed_pages(doc, &selection).unwrap()
        else {
            panic!("expected a rewrite");
        };
        assert_eq!(pages, 1);
        assert_eq!(page_labels(&bytes), ["a3"]);
    }

    #[test]
    fn test_corrupt_input_fails_to_parse() {
        let err = delete_pages("a.pdf", b"%PDF-garbage", &[1].into_iter().collect()).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }
}
