//! Uploaded documents and their identity.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// The two document formats the merger understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pdf,
    Word,
}

impl DocumentKind {
    /// Sniff the kind from a file name's extension (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        if ext.eq_ignore_ascii_case("pdf") {
            Some(Self::Pdf)
        } else if ext.eq_ignore_ascii_case("docx") {
            Some(Self::Word)
        } else {
            None
        }
    }

    pub const fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Word => "docx",
        }
    }

    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Word => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pdf => write!(f, "PDF"),
            Self::Word => write!(f, "Word"),
        }
    }
}

/// Stable identity of an uploaded document.
///
/// SHA-256 over the file name and content, hex encoded. Identical name and
/// bytes always produce the same key; any content change produces a new one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryKey(String);

impl EntryKey {
    pub fn derive(name: &str, payload: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        // Null separator keeps ("ab", "c") and ("a", "bc") apart
        hasher.update(name.as_bytes());
        hasher.update([0u8]);
        hasher.update(payload);
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntryKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EntryKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for EntryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A file as it currently sits in the upload widget.
#[derive(Debug, Clone)]
pub struct Upload {
    pub name: String,
    pub bytes: Bytes,
}

impl Upload {
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// A registry entry: one uploaded file with its stable key.
///
/// The payload is an immutable buffer; cloning it is O(1) and every read
/// starts from the beginning.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    key: EntryKey,
    name: String,
    payload: Bytes,
}

impl UploadedDocument {
    pub fn from_upload(upload: Upload) -> Self {
        Self {
            key: EntryKey::derive(&upload.name, &upload.bytes),
            name: upload.name,
            payload: upload.bytes,
        }
    }

    pub const fn key(&self) -> &EntryKey {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The original uploaded bytes.
    pub const fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn size(&self) -> usize {
        self.payload.len()
    }

    pub fn kind(&self) -> Option<DocumentKind> {
        DocumentKind::from_name(&self.name)
    }

    pub fn is_kind(&self, kind: DocumentKind) -> bool {
        self.kind() == Some(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_name_is_case_insensitive() {
        assert_eq!(DocumentKind::from_name("a.pdf"), Some(DocumentKind::Pdf));
        assert_eq!(DocumentKind::from_name("REPORT.PDF"), Some(DocumentKind::Pdf));
        assert_eq!(DocumentKind::from_name("x.Docx"), Some(DocumentKind::Word));
        assert_eq!(DocumentKind::from_name("notes.txt"), None);
        assert_eq!(DocumentKind::from_name("pdf"), None);
        assert_eq!(DocumentKind::from_name("archive.pdf.zip"), None);
    }

    #[test]
    fn test_key_is_fixed_length_hash() {
        let k = EntryKey::derive("a.pdf", b"%PDF-1.5");
        assert_eq!(k.as_str().len(), 64);
        assert!(k.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_key_stable_for_same_input() {
        assert_eq!(EntryKey::derive("a.pdf", b"abc"), EntryKey::derive("a.pdf", b"abc"));
    }

    #[test]
    fn test_key_differs_by_content_with_same_size() {
        assert_ne!(EntryKey::derive("a.pdf", b"abc"), EntryKey::derive("a.pdf", b"abd"));
    }

    #[test]
    fn test_key_differs_by_name() {
        assert_ne!(EntryKey::derive("a.pdf", b"abc"), EntryKey::derive("b.pdf", b"abc"));
    }

    #[test]
    fn test_key_separator_prevents_shifting_collisions() {
        assert_ne!(EntryKey::derive("ab", b"c"), EntryKey::derive("a", b"bc"));
    }

    #[test]
    fn test_payload_rereads_from_start() {
        let doc = UploadedDocument::from_upload(Upload::new("a.pdf", b"payload".to_vec()));
        let first = doc.payload().clone();
        let second = doc.payload().clone();
        assert_eq!(first, second);
        assert_eq!(doc.size(), 7);
    }
}
