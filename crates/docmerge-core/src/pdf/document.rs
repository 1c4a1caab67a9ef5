use std::collections::BTreeSet;

use lopdf::{Document, ObjectId};
use tracing::debug;

use crate::error::{Error, Result};

/// A parsed PDF upload.
pub struct PdfDocument {
    /// Display name, used in error messages
    name: String,
    inner: Document,
}

impl PdfDocument {
    /// Parse PDF bytes. Malformed input fails with [`Error::Parse`].
    pub fn parse(name: impl Into<String>, bytes: &[u8]) -> Result<Self> {
        let name = name.into();
        let inner = Document::load_mem(bytes).map_err(|e| Error::parse(&name, e))?;
        Ok(Self { name, inner })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn page_count(&self) -> usize {
        self.inner.get_pages().len()
    }

    /// Page object IDs in page order.
    pub fn page_ids(&self) -> Vec<ObjectId> {
        self.inner.get_pages().into_values().collect()
    }

    /// Remove the given 1-based pages, keeping the rest in their original order.
    ///
    /// Every page number must exist. Removing all pages leaves a valid
    /// zero-page document.
    pub fn delete_pages(&mut self, selection: &PageSelection) -> Result<()> {
        let total = self.page_count();
        selection.validate(total)?;
        if selection.is_empty() {
            return Ok(());
        }

        let pages: Vec<u32> = selection.iter().collect();
        self.inner.delete_pages(&pages);
        self.inner.prune_objects();
        self.inner.renumber_objects();

        debug!(
            "Deleted {} of {} pages from {}",
            pages.len(),
            total,
            self.name
        );
        Ok(())
    }

    /// Serialize to PDF bytes.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        self.inner
            .save_to(&mut output)
            .map_err(|e| Error::PdfWrite(format!("{}: {e}", self.name)))?;
        Ok(output)
    }

    pub(crate) fn into_inner(self) -> Document {
        self.inner
    }
}

impl std::fmt::Debug for PdfDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfDocument")
            .field("name", &self.name)
            .field("page_count", &self.page_count())
            .finish()
    }
}

/// A set of 1-based page numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSelection(BTreeSet<u32>);

impl PageSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a page list such as "1-3, 5" for a document with `total` pages.
    ///
    /// Blank input is an empty selection. Ranges are checked against `total`
    /// before they are expanded, so a page past the end fails with
    /// [`Error::InvalidPage`] whatever the size of the range.
    pub fn parse(list: &str, total: usize) -> Result<Self> {
        let invalid = || Error::InvalidPageRange(list.to_string());
        let out_of_range = |page: u32| Error::InvalidPage { page, total };
        let mut pages = BTreeSet::new();

        for part in list.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            if let Some((start, end)) = part.split_once('-') {
                let start: u32 = start.trim().parse().map_err(|_| invalid())?;
                let end: u32 = end.trim().parse().map_err(|_| invalid())?;
                if start == 0 || start > end {
                    return Err(invalid());
                }
                if end as usize > total {
                    let first_missing = u32::try_from(total + 1).unwrap_or(u32::MAX);
                    return Err(out_of_range(start.max(first_missing)));
                }
                pages.extend(start..=end);
            } else {
                let page: u32 = part.parse().map_err(|_| invalid())?;
                if page == 0 {
                    return Err(invalid());
                }
                if page as usize > total {
                    return Err(out_of_range(page));
                }
                pages.insert(page);
            }
        }

        Ok(Self(pages))
    }

    /// Every page from 1 to `total`.
    pub fn all(total: usize) -> Self {
        let total = u32::try_from(total).unwrap_or(u32::MAX);
        Self((1..=total).collect())
    }

    /// Check that every page exists in a document with `total` pages.
    pub fn validate(&self, total: usize) -> Result<()> {
        match self.0.iter().find(|&&p| p == 0 || p as usize > total) {
            Some(&page) => Err(Error::InvalidPage { page, total }),
            None => Ok(()),
        }
    }

    pub fn contains(&self, page: u32) -> bool {
        self.0.contains(&page)
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<u32> for PageSelection {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<u32> for PageSelection {
    fn extend<I: IntoIterator<Item = u32>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::pdf::fixtures::{labelled_pdf, page_labels};

    #[test]
    fn test_parse_rejects_garbage() {
        let err = PdfDocument::parse("broken.pdf", b"not a pdf").unwrap_err();
        assert!(matches!(err, Error::Parse { ref name, .. } if name == "broken.pdf"));
    }

    #[test]
    fn test_page_count() {
        let doc = PdfDocument::parse("a.pdf", &labelled_pdf(&["a1", "a2", "a3"])).unwrap();
        assert_eq!(doc.page_count(), 3);
        assert_eq!(doc.page_ids().len(), 3);
    }

    #[test]
    fn test_delete_keeps_remaining_in_order() {
        let mut doc =
            PdfDocument::parse("a.pdf", &labelled_pdf(&["a1", "a2", "a3", "a4"])).unwrap();
        doc.delete_pages(&[1, 3].into_iter().collect()).unwrap();

        assert_eq!(page_labels(&doc.to_bytes().unwrap()), ["a2", "a4"]);
    }

    #[test]
    fn test_delete_all_pages_gives_empty_document() {
        let mut doc = PdfDocument::parse("a.pdf", &labelled_pdf(&["a1", "a2"])).unwrap();
        doc.delete_pages(&PageSelection::all(2)).unwrap();

        let bytes = doc.to_bytes().unwrap();
        let reparsed = PdfDocument::parse("a.pdf", &bytes).unwrap();
        assert_eq!(reparsed.page_count(), 0);
    }

    #[test]
    fn test_delete_out_of_range_page_fails() {
        let mut doc = PdfDocument::parse("a.pdf", &labelled_pdf(&["a1", "a2"])).unwrap();
        let err = doc.delete_pages(&[3].into_iter().collect()).unwrap_err();

        assert!(matches!(err, Error::InvalidPage { page: 3, total: 2 }));
        assert_eq!(doc.page_count(), 2);
    }

    #[test]
    fn test_selection_parse() {
        let sel = PageSelection::parse("1-3, 5,5 ,", 5).unwrap();
        assert_eq!(sel.iter().collect::<Vec<_>>(), [1, 2, 3, 5]);

        assert!(PageSelection::parse("", 0).unwrap().is_empty());
        assert!(PageSelection::parse("0", 5).is_err());
        assert!(PageSelection::parse("4-2", 5).is_err());
        assert!(PageSelection::parse("2-x", 5).is_err());
    }

    #[test]
    fn test_selection_parse_checks_page_count() {
        assert!(matches!(
            PageSelection::parse("7", 3),
            Err(Error::InvalidPage { page: 7, total: 3 })
        ));
        assert!(matches!(
            PageSelection::parse("2-4", 3),
            Err(Error::InvalidPage { page: 4, total: 3 })
        ));
        assert!(matches!(
            PageSelection::parse("5-9", 3),
            Err(Error::InvalidPage { page: 5, total: 3 })
        ));
    }

    #[test]
    fn test_huge_range_is_rejected_before_expansion() {
        let started = std::time::Instant::now();
        let err = PageSelection::parse("1-4000000000", 3).unwrap_err();

        assert!(matches!(err, Error::InvalidPage { page: 4, total: 3 }));
        assert!(started.elapsed() < std::time::Duration::from_secs(1));
    }

    #[test]
    fn test_selection_validate() {
        let sel: PageSelection = [1, 4].into_iter().collect();
        assert!(sel.validate(4).is_ok());
        assert!(sel.validate(3).is_err());
        assert!(PageSelection::new().validate(0).is_ok());
    }
}
