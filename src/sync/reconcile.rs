//! Per-note write decisions.
//!
//! Pure bookkeeping with no I/O: the engine feeds each incoming note through
//! [`Reconciler::decide`] and acts on the answer.

use std::collections::{HashMap, HashSet};

use crate::model::Note;
use crate::sync::types::SyncMode;

/// What to do with one incoming note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Outside the folder filter; ignored entirely.
    Filtered,
    /// Stored copy has the same `updated` value.
    Skip,
    /// Insert or replace the stored row.
    Upsert,
}

/// Tracks seen ids and the watermark across a run.
#[derive(Debug, Default)]
pub struct Reconciler {
    mode: SyncMode,
    note_folders: Option<HashSet<String>>,
    snapshot: HashMap<String, Option<String>>,
    seen: HashSet<String>,
    watermark: Option<String>,
}

impl Reconciler {
    /// `note_folders` is the folder filter's subtree, `snapshot` the stored
    /// `id → updated` map (only consulted in sync modes).
    #[must_use]
    pub fn new(
        mode: SyncMode,
        note_folders: Option<HashSet<String>>,
        snapshot: HashMap<String, Option<String>>,
    ) -> Self {
        Self {
            mode,
            note_folders,
            snapshot,
            seen: HashSet::new(),
            watermark: None,
        }
    }

    pub fn decide(&mut self, note: &Note) -> Decision {
        if let Some(scope) = &self.note_folders {
            if !note.in_folders(scope) {
                return Decision::Filtered;
            }
        }

        // Recorded before the skip check: unchanged notes still exist.
        if self.mode.deletes_missing() {
            self.seen.insert(note.id.clone());
        }

        if self.mode.is_sync() && self.is_unchanged(note) {
            return Decision::Skip;
        }

        if !note.updated.is_empty()
            && self
                .watermark
                .as_deref()
                .is_none_or(|current| note.updated.as_str() > current)
        {
            self.watermark = Some(note.updated.clone());
        }
        Decision::Upsert
    }

    fn is_unchanged(&self, note: &Note) -> bool {
        self.snapshot
            .get(&note.id)
            .is_some_and(|stored| stored.as_deref() == Some(note.updated.as_str()))
    }

    /// Ids of in-scope notes seen so far. Only tracked in delete-missing mode.
    #[must_use]
    pub fn seen(&self) -> &HashSet<String> {
        &self.seen
    }

    /// Highest `updated` value among upserted notes.
    #[must_use]
    pub fn watermark(&self) -> Option<&str> {
        self.watermark.as_deref()
    }
}
