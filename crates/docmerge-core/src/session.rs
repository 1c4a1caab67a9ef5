//! Per-session document workspace.
//!
//! Ties the registry, the edit overlay and the ordering selection together
//! and keeps them consistent: whenever the upload set is replaced, every
//! edit and every ordering decision derived from the old set is dropped.

use tracing::info;

use crate::document::{DocumentKind, EntryKey, Upload, UploadedDocument};
use crate::error::{Error, Result};
use crate::merge::{MergePlan, MergeTarget};
use crate::ordering::{Move, OrderingSelection};
use crate::overlay::EditOverlay;
use crate::pdf::{self, PageEdit, PageSelection};
use crate::registry::{FileRegistry, Reconciliation};

/// Result of feeding an upload set to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub reconciliation: Reconciliation,
    /// Names of uploads skipped because they are neither PDF nor Word
    pub skipped: Vec<String>,
}

/// All document state owned by one user session.
#[derive(Debug, Default)]
pub struct DocumentSession {
    registry: FileRegistry,
    overlay: EditOverlay,
    ordering: OrderingSelection,
}

impl DocumentSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconcile against the complete current upload set.
    pub fn reconcile(&mut self, uploads: Vec<Upload>) -> ReconcileOutcome {
        let (supported, unsupported): (Vec<_>, Vec<_>) = uploads
            .into_iter()
            .partition(|upload| DocumentKind::from_name(&upload.name).is_some());
        let skipped: Vec<String> = unsupported.into_iter().map(|u| u.name).collect();

        let reconciliation = self.registry.reconcile(supported);
        if reconciliation.is_replaced() {
            self.overlay.clear();
            self.ordering.clear();
            info!(
                "Upload set replaced: {} entries, {} skipped",
                self.registry.len(),
                skipped.len()
            );
        }
        self.overlay.prune(&self.registry);

        ReconcileOutcome {
            reconciliation,
            skipped,
        }
    }

    /// Forget every upload, edit and ordering decision.
    pub fn reset(&mut self) {
        self.registry.reset();
        self.overlay.clear();
        self.ordering.clear();
        info!("Session reset");
    }

    pub const fn registry(&self) -> &FileRegistry {
        &self.registry
    }

    pub const fn overlay(&self) -> &EditOverlay {
        &self.overlay
    }

    pub const fn ordering(&self) -> &OrderingSelection {
        &self.ordering
    }

    pub fn entry(&self, key: &EntryKey) -> Result<&UploadedDocument> {
        self.registry
            .get(key)
            .ok_or_else(|| Error::NotFound(key.to_string()))
    }

    /// Commit the outcome of a page-deletion edit.
    ///
    /// A passthrough clears any earlier edit, so the entry is back to its
    /// original pages.
    pub fn apply_page_edit(&mut self, key: &EntryKey, edit: PageEdit) -> Result<()> {
        let name = self.entry(key)?.name().to_string();
        match edit {
            PageEdit::Passthrough => {
                if self.overlay.revert(key) {
                    info!("Edit for {} reverted by empty selection", name);
                }
            }
            PageEdit::Rewritten { bytes, pages } => {
                self.overlay.apply_edit(&self.registry, key, bytes)?;
                info!("Applied edit to {}: {} pages remain", name, pages);
            }
        }
        Ok(())
    }

    /// Delete pages of a PDF entry in place.
    ///
    /// The selection is always applied to the original upload, never to an
    /// earlier edit, so page numbers match what the user was shown.
    pub fn edit_pages(&mut self, key: &EntryKey, selection: &PageSelection) -> Result<()> {
        let entry = self.entry(key)?;
        if !entry.is_kind(DocumentKind::Pdf) {
            return Err(Error::UnsupportedFormat(entry.name().to_string()));
        }
        let edit = pdf::delete_pages(entry.name(), entry.payload(), selection)?;
        self.apply_page_edit(key, edit)
    }

    /// Drop the edit for `key`. Returns whether one existed.
    pub fn revert_edit(&mut self, key: &EntryKey) -> Result<bool> {
        let name = self.entry(key)?.name().to_string();
        let reverted = self.overlay.revert(key);
        if reverted {
            info!("Reverted edit for {}", name);
        }
        Ok(reverted)
    }

    pub fn shift(&mut self, key: &EntryKey, direction: Move) -> Result<bool> {
        self.entry(key)?;
        Ok(self.ordering.shift(&self.registry, key, direction))
    }

    /// Include or exclude an entry from merges. Returns the new state.
    pub fn toggle(&mut self, key: &EntryKey) -> Result<bool> {
        self.entry(key)?;
        Ok(self.ordering.toggle(key))
    }

    pub fn restore_default_order(&mut self) {
        self.ordering.clear();
    }

    /// Entries in merge order, excluded ones included.
    pub fn arranged(&self) -> Vec<&UploadedDocument> {
        self.ordering.arrange(&self.registry)
    }

    /// Snapshot what a merge for `target` needs, so the session can be
    /// released before the merge runs.
    pub fn plan(&self, target: MergeTarget) -> MergePlan {
        MergePlan::resolve(
            target,
            &self.ordering.selected(&self.registry),
            &self.overlay,
        )
    }

    /// Whether at least one selected entry would take part in `target`.
    pub fn can_merge(&self, target: MergeTarget) -> bool {
        self.ordering
            .selected(&self.registry)
            .iter()
            .any(|entry| entry.kind().is_some_and(|kind| target.accepts(kind)))
    }
}
