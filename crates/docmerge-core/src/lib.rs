//! Document Merger Core Library
//!
//! This library holds everything a merge session needs, independent of the
//! web front end:
//! - A registry that mirrors the current upload set
//! - Page-deletion edits for PDFs, kept in an overlay beside the originals
//! - Merge order and inclusion, then PDF and Word merging
//! - Optional Word-to-PDF conversion through an office suite

pub mod config;
pub mod convert;
pub mod document;
pub mod error;
pub mod merge;
pub mod ordering;
pub mod overlay;
pub mod pdf;
pub mod registry;
pub mod session;
pub mod util;
pub mod word;

pub use config::{
    AppConfig, ConverterConfig, MERGED_COMBINED_NAME, MERGED_PDF_NAME, MERGED_WORD_NAME,
};
pub use convert::{OfficeConverter, PdfConverter, detect_converter};
pub use document::{DocumentKind, EntryKey, Upload, UploadedDocument};
pub use error::{Error, Result};
pub use merge::{MergePlan, MergeTarget, MergedArtifact, ResolvedEntry};
pub use ordering::{Move, OrderingSelection};
pub use overlay::EditOverlay;
pub use pdf::{PageEdit, PageSelection, PdfDocument};
pub use registry::{FileRegistry, Fingerprint, Reconciliation};
pub use session::{DocumentSession, ReconcileOutcome};
pub use word::{Paragraph, WordDocument};
