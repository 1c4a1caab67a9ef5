//! The session file registry.
//!
//! The registry mirrors what is currently sitting in the upload widget. The
//! browser always sends the complete upload set, never a delta; the registry
//! decides whether that set is the same one it already holds (keep entries,
//! keep the user's ordering and edits) or a different one (start over).

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::document::{EntryKey, Upload, UploadedDocument};

/// Order-insensitive digest of an upload set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint a set of entry keys. Order and duplicates do not matter.
    pub fn of<'a>(keys: impl IntoIterator<Item = &'a EntryKey>) -> Self {
        let mut keys: Vec<&str> = keys.into_iter().map(EntryKey::as_str).collect();
        keys.sort_unstable();
        keys.dedup();

        let mut hasher = Sha256::new();
        for key in keys {
            hasher.update(key.as_bytes());
            hasher.update([0u8]);
        }
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// What a reconcile pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// Same upload set as before; entries untouched.
    Unchanged,
    /// Different upload set; everything derived from the old one must go.
    Replaced,
}

impl Reconciliation {
    pub const fn is_replaced(self) -> bool {
        matches!(self, Self::Replaced)
    }
}

/// Ordered, de-duplicated list of uploaded documents.
#[derive(Debug, Default)]
pub struct FileRegistry {
    entries: Vec<UploadedDocument>,
    fingerprint: Option<Fingerprint>,
}

impl FileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bring the registry in line with the full current upload set.
    ///
    /// Entries are rebuilt in upload order only when the set's fingerprint
    /// changed. Uploads with identical name and content collapse into one entry.
    pub fn reconcile(&mut self, uploads: Vec<Upload>) -> Reconciliation {
        let documents: Vec<UploadedDocument> =
            uploads.into_iter().map(UploadedDocument::from_upload).collect();
        let fingerprint = Fingerprint::of(documents.iter().map(UploadedDocument::key));

        if self.fingerprint.as_ref() == Some(&fingerprint) {
            debug!("Upload set unchanged ({} entries)", self.entries.len());
            return Reconciliation::Unchanged;
        }

        self.entries.clear();
        for doc in documents {
            if self.contains(doc.key()) {
                debug!("Dropping duplicate upload {}", doc.name());
                continue;
            }
            self.entries.push(doc);
        }
        self.fingerprint = Some(fingerprint);

        debug!("Upload set replaced ({} entries)", self.entries.len());
        Reconciliation::Replaced
    }

    /// Forget everything, including the stored fingerprint.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.fingerprint = None;
    }

    pub fn entries(&self) -> &[UploadedDocument] {
        &self.entries
    }

    pub fn get(&self, key: &EntryKey) -> Option<&UploadedDocument> {
        self.entries.iter().find(|e| e.key() == key)
    }

    pub fn contains(&self, key: &EntryKey) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &EntryKey> {
        self.entries.iter().map(UploadedDocument::key)
    }

    pub const fn fingerprint(&self) -> Option<&Fingerprint> {
        self.fingerprint.as_ref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
