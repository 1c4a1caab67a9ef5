use thiserror::Error;

use crate::merge::MergeTarget;

/// Unified error type for docmerge-core
///
/// This enum encompasses all error cases that can occur in the library:
/// - Parsing uploads (PDF and Word)
/// - Editing and writing PDFs
/// - Session bookkeeping (unknown entries)
/// - Merge resolution and optional Word-to-PDF conversion
/// - Configuration and general I/O
#[derive(Error, Debug)]
pub enum Error {
    // ==========================================================================
    // Parse Errors
    // ==========================================================================
    /// An uploaded document could not be parsed
    #[error("failed to parse {name}: {reason}")]
    Parse { name: String, reason: String },

    /// File extension is neither PDF nor Word
    #[error("unsupported file type: {0}")]
    UnsupportedFormat(String),

    // ==========================================================================
    // Edit / Write Errors
    // ==========================================================================
    /// Page list could not be understood (e.g. "3-x")
    #[error("invalid page list '{0}'")]
    InvalidPageRange(String),

    /// Page number outside 1..=total
    #[error("invalid page number {page} (document has {total} pages)")]
    InvalidPage { page: u32, total: usize },

    /// Failed to serialize a PDF
    #[error("failed to write PDF: {0}")]
    PdfWrite(String),

    /// Failed to assemble a Word document
    #[error("failed to build Word document: {0}")]
    WordBuild(String),

    // ==========================================================================
    // Session Errors
    // ==========================================================================
    /// No registry entry with this key
    #[error("no uploaded document with key {0}")]
    NotFound(String),

    /// Merge requested but no entry matches the target format
    #[error("no {0} documents selected")]
    EmptySelection(MergeTarget),

    // ==========================================================================
    // Conversion Errors
    // ==========================================================================
    /// Word-to-PDF conversion requested but no converter is installed
    #[error("Word to PDF conversion is not available")]
    ConversionUnavailable,

    /// The converter ran but failed
    #[error("conversion of {name} failed: {reason}")]
    Conversion { name: String, reason: String },

    // ==========================================================================
    // Configuration Errors
    // ==========================================================================
    /// Failed to load configuration file
    #[error("failed to load config: {0}")]
    ConfigLoad(String),

    /// Invalid configuration value
    #[error("invalid config value for '{field}': {reason}")]
    ConfigInvalid { field: String, reason: String },

    // ==========================================================================
    // I/O Errors
    // ==========================================================================
    /// General I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error is an expected no-op rather than a failure.
    ///
    /// Callers should report these as a notice (or do nothing), never as an error banner.
    pub const fn is_benign(&self) -> bool {
        matches!(self, Self::EmptySelection(_))
    }

    pub(crate) fn parse(name: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Parse {
            name: name.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
