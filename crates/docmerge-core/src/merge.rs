//! Ordered merge resolution.
//!
//! A merge happens in two steps. [`MergePlan::resolve`] runs against live
//! session state: it filters the selected entries by format and swaps in
//! edited bytes from the overlay. The plan owns cheap `Bytes` handles, so the
//! session can be released before [`MergePlan::build`] does the slow part.

use bytes::Bytes;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{MERGED_COMBINED_NAME, MERGED_PDF_NAME, MERGED_WORD_NAME};
use crate::convert::PdfConverter;
use crate::document::{DocumentKind, EntryKey, UploadedDocument};
use crate::error::{Error, Result};
use crate::overlay::EditOverlay;
use crate::pdf::{self, PdfDocument};
use crate::word::{self, WordDocument};

/// Which artifact a merge produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeTarget {
    /// PDF entries only, into one PDF
    Pdf,
    /// Word entries only, into one Word document
    Word,
    /// Every entry into one PDF, converting Word entries first
    Combined,
}

impl MergeTarget {
    pub fn from_slug(slug: &str) -> Option<Self> {
        match slug {
            "pdf" => Some(Self::Pdf),
            "word" => Some(Self::Word),
            "combined" => Some(Self::Combined),
            _ => None,
        }
    }

    pub const fn accepts(self, kind: DocumentKind) -> bool {
        match self {
            Self::Pdf => matches!(kind, DocumentKind::Pdf),
            Self::Word => matches!(kind, DocumentKind::Word),
            Self::Combined => true,
        }
    }

    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Pdf => MERGED_PDF_NAME,
            Self::Word => MERGED_WORD_NAME,
            Self::Combined => MERGED_COMBINED_NAME,
        }
    }

    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Pdf | Self::Combined => DocumentKind::Pdf.content_type(),
            Self::Word => DocumentKind::Word.content_type(),
        }
    }
}

impl std::fmt::Display for MergeTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pdf => write!(f, "PDF"),
            Self::Word => write!(f, "Word"),
            Self::Combined => write!(f, "PDF or Word"),
        }
    }
}

/// One entry with its effective bytes.
#[derive(Debug, Clone)]
pub struct ResolvedEntry {
    pub key: EntryKey,
    pub name: String,
    pub kind: DocumentKind,
    pub bytes: Bytes,
}

/// Everything a merge needs, detached from the session.
#[derive(Debug, Clone)]
pub struct MergePlan {
    target: MergeTarget,
    entries: Vec<ResolvedEntry>,
}

/// A finished merge, ready to download.
#[derive(Debug, Clone)]
pub struct MergedArtifact {
    pub file_name: &'static str,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
    /// Number of source documents that went in
    pub sources: usize,
}

impl MergePlan {
    /// Filter `selected` (already in merge order) down to `target`'s formats
    /// and resolve each entry's effective bytes through the overlay.
    pub fn resolve(
        target: MergeTarget,
        selected: &[&UploadedDocument],
        overlay: &EditOverlay,
    ) -> Self {
        let entries = selected
            .iter()
            .filter_map(|doc| {
                let kind = doc.kind().filter(|k| target.accepts(*k))?;
                Some(ResolvedEntry {
                    key: doc.key().clone(),
                    name: doc.name().to_string(),
                    kind,
                    bytes: overlay.resolve(doc.key(), doc.payload()),
                })
            })
            .collect();

        Self { target, entries }
    }

    pub const fn target(&self) -> MergeTarget {
        self.target
    }

    pub fn entries(&self) -> &[ResolvedEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether any entry still needs Word-to-PDF conversion.
    pub fn needs_conversion(&self) -> bool {
        self.target == MergeTarget::Combined
            && self.entries.iter().any(|e| e.kind == DocumentKind::Word)
    }

    /// Replace every Word entry with its PDF rendition.
    ///
    /// A combined merge is only offered with a converter, even when every
    /// selected entry is already a PDF. Conversions run concurrently; the
    /// first failure aborts the whole plan.
    pub async fn convert_words(self, converter: Option<&dyn PdfConverter>) -> Result<Self> {
        if self.target != MergeTarget::Combined {
            return Ok(self);
        }
        let converter = converter.ok_or(Error::ConversionUnavailable)?;
        if !self.needs_conversion() {
            return Ok(self);
        }

        let entries = try_join_all(self.entries.into_iter().map(|entry| async move {
            if entry.kind != DocumentKind::Word {
                return Ok(entry);
            }
            let pdf = converter.convert(&entry.name, &entry.bytes).await?;
            Ok::<_, Error>(ResolvedEntry {
                kind: DocumentKind::Pdf,
                bytes: Bytes::from(pdf),
                ..entry
            })
        }))
        .await?;

        Ok(Self {
            target: self.target,
            entries,
        })
    }

    /// Assemble the output artifact.
    ///
    /// Parsing is all-or-nothing: one unreadable entry fails the merge and no
    /// partial artifact is produced. An empty plan is
    /// [`Error::EmptySelection`].
    pub fn build(self) -> Result<MergedArtifact> {
        if self.entries.is_empty() {
            return Err(Error::EmptySelection(self.target));
        }

        let sources = self.entries.len();
        let bytes = match self.target {
            MergeTarget::Pdf | MergeTarget::Combined => build_pdf(&self.entries)?,
            MergeTarget::Word => build_word(&self.entries)?,
        };

        info!(
            "Merged {} {} documents into {} ({} bytes)",
            sources,
            self.target,
            self.target.file_name(),
            bytes.len()
        );

        Ok(MergedArtifact {
            file_name: self.target.file_name(),
            content_type: self.target.content_type(),
            bytes,
            sources,
        })
    }
}

fn build_pdf(entries: &[ResolvedEntry]) -> Result<Vec<u8>> {
    let documents = entries
        .iter()
        .map(|entry| match entry.kind {
            DocumentKind::Pdf => PdfDocument::parse(&entry.name, &entry.bytes),
            DocumentKind::Word => Err(Error::ConversionUnavailable),
        })
        .collect::<Result<Vec<_>>>()?;

    pdf::concatenate(documents)
}

fn build_word(entries: &[ResolvedEntry]) -> Result<Vec<u8>> {
    let documents = entries
        .iter()
        .map(|entry| WordDocument::parse(&entry.name, &entry.bytes))
        .collect::<Result<Vec<_>>>()?;

    word::build(&word::join_paragraphs(documents))
}
