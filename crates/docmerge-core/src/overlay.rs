//! Edited replacements for registry entries.

use bytes::Bytes;
use std::collections::HashMap;

use crate::document::EntryKey;
use crate::error::{Error, Result};
use crate::registry::FileRegistry;

/// Replacement payloads produced by page-deletion edits, keyed by entry.
///
/// Holds at most one payload per key; a later edit replaces the earlier one.
#[derive(Debug, Default)]
pub struct EditOverlay {
    edits: HashMap<EntryKey, Bytes>,
}

impl EditOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `edited` as the active replacement for `key`.
    ///
    /// Fails with [`Error::NotFound`] if the registry has no such entry.
    pub fn apply_edit(
        &mut self,
        registry: &FileRegistry,
        key: &EntryKey,
        edited: impl Into<Bytes>,
    ) -> Result<()> {
        if !registry.contains(key) {
            return Err(Error::NotFound(key.to_string()));
        }
        self.edits.insert(key.clone(), edited.into());
        Ok(())
    }

    /// Effective bytes for an entry: the edit if one exists, else the original.
    pub fn resolve(&self, key: &EntryKey, original: &Bytes) -> Bytes {
        self.edits.get(key).unwrap_or(original).clone()
    }

    /// Drop the edit for `key`. Returns whether one existed.
    pub fn revert(&mut self, key: &EntryKey) -> bool {
        self.edits.remove(key).is_some()
    }

    /// Drop edits whose entry is no longer in the registry.
    pub fn prune(&mut self, registry: &FileRegistry) {
        self.edits.retain(|key, _| registry.contains(key));
    }

    pub fn clear(&mut self) {
        self.edits.clear();
    }

    pub fn is_edited(&self, key: &EntryKey) -> bool {
        self.edits.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::document::Upload;

    fn registry_with(names: &[&str]) -> FileRegistry {
        let mut registry = FileRegistry::new();
        registry.reconcile(
            names
                .iter()
                .map(|n| Upload::new(*n, n.as_bytes().to_vec()))
                .collect(),
        );
        registry
    }

    #[test]
    fn test_resolve_falls_back_to_original() {
        let registry = registry_with(&["a.pdf"]);
        let overlay = EditOverlay::new();
        let entry = &registry.entries()[0];

        assert_eq!(overlay.resolve(entry.key(), entry.payload()), *entry.payload());
    }

    #[test]
    fn test_apply_edit_replaces_earlier_edit() {
        let registry = registry_with(&["a.pdf"]);
        let mut overlay = EditOverlay::new();
        let entry = &registry.entries()[0];

        overlay.apply_edit(&registry, entry.key(), b"first".to_vec()).unwrap();
        overlay.apply_edit(&registry, entry.key(), b"second".to_vec()).unwrap();

        assert_eq!(overlay.len(), 1);
        assert_eq!(overlay.resolve(entry.key(), entry.payload()).as_ref(), b"second");
    }

    #[test]
    fn test_apply_edit_unknown_key_is_not_found() {
        let registry = registry_with(&["a.pdf"]);
        let mut overlay = EditOverlay::new();

        let err = overlay
            .apply_edit(&registry, &EntryKey::from("missing"), b"x".to_vec())
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(overlay.is_empty());
    }

    #[test]
    fn test_prune_drops_stale_keys() {
        let mut registry = registry_with(&["a.pdf", "b.pdf"]);
        let mut overlay = EditOverlay::new();
        let a = registry.entries()[0].key().clone();
        overlay.apply_edit(&registry, &a, b"edited".to_vec()).unwrap();

        registry.reconcile(vec![Upload::new("b.pdf", b"b.pdf".to_vec())]);
        overlay.prune(&registry);

        assert!(!overlay.is_edited(&a));
        assert!(overlay.is_empty());
    }

    #[test]
    fn test_revert() {
        let registry = registry_with(&["a.pdf"]);
        let mut overlay = EditOverlay::new();
        let key = registry.entries()[0].key().clone();
        overlay.apply_edit(&registry, &key, b"edited".to_vec()).unwrap();

        assert!(overlay.revert(&key));
        assert!(!overlay.revert(&key));
        assert!(!overlay.is_edited(&key));
    }
}
