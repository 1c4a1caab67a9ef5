//! User-chosen merge order.

use std::collections::HashSet;

use crate::document::{EntryKey, UploadedDocument};
use crate::registry::FileRegistry;

/// Direction for a single reorder step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    Up,
    Down,
}

/// A permutation and subset of registry entries.
///
/// Only decides merge order; the registry itself is never reordered. Keys
/// the registry no longer holds are ignored, and registry entries the
/// selection has never seen are appended in upload order, so the selection
/// can never name a file that is gone or hide one that was just added.
#[derive(Debug, Default, Clone)]
pub struct OrderingSelection {
    order: Vec<EntryKey>,
    excluded: HashSet<EntryKey>,
}

impl OrderingSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Back to upload order with every entry included.
    pub fn clear(&mut self) {
        self.order.clear();
        self.excluded.clear();
    }

    /// Registry entries in merge order, including excluded ones.
    pub fn arrange<'a>(&self, registry: &'a FileRegistry) -> Vec<&'a UploadedDocument> {
        let mut arranged: Vec<&UploadedDocument> =
            self.order.iter().filter_map(|key| registry.get(key)).collect();
        for entry in registry.entries() {
            if !self.order.contains(entry.key()) {
                arranged.push(entry);
            }
        }
        arranged
    }

    /// Registry entries that take part in a merge, in merge order.
    pub fn selected<'a>(&self, registry: &'a FileRegistry) -> Vec<&'a UploadedDocument> {
        self.arrange(registry)
            .into_iter()
            .filter(|entry| self.is_included(entry.key()))
            .collect()
    }

    pub fn is_included(&self, key: &EntryKey) -> bool {
        !self.excluded.contains(key)
    }

    /// Include or exclude an entry. Returns the new inclusion state.
    pub fn toggle(&mut self, key: &EntryKey) -> bool {
        if self.excluded.remove(key) {
            true
        } else {
            self.excluded.insert(key.clone());
            false
        }
    }

    /// Swap an entry with its neighbour. Returns false if it could not move.
    pub fn shift(&mut self, registry: &FileRegistry, key: &EntryKey, direction: Move) -> bool {
        let mut order: Vec<EntryKey> = self
            .arrange(registry)
            .into_iter()
            .map(|entry| entry.key().clone())
            .collect();

        let Some(pos) = order.iter().position(|k| k == key) else {
            return false;
        };
        let target = match direction {
            Move::Up if pos > 0 => pos - 1,
            Move::Down if pos + 1 < order.len() => pos + 1,
            _ => return false,
        };

        order.swap(pos, target);
        self.order = order;
        true
    }
}
