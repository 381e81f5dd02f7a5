//! Mapping from source folder ids to local surrogate keys.

use std::collections::HashMap;

use tracing::debug;

use crate::error::Result;
use crate::folders::{FolderGraph, FolderScope};
use crate::model::{Folder, Note};
use crate::storage::NotesDb;

/// `long_id → folders.id` for the folders written this run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FolderKeys {
    keys: HashMap<String, i64>,
}

impl FolderKeys {
    /// Write folders parent-first and record their keys.
    ///
    /// With a scope, only its persisted folders are written, and a parent
    /// outside that set is stored as NULL. A parent that has no key yet
    /// (a cycle back-edge) is stored as NULL too.
    ///
    /// # Errors
    ///
    /// Returns an error if a folder write fails.
    pub fn persist(db: &mut NotesDb, folders: &[Folder], scope: Option<&FolderScope>) -> Result<Self> {
        let kept: Vec<Folder> = match scope {
            Some(scope) => folders
                .iter()
                .filter(|f| scope.persists(&f.long_id))
                .cloned()
                .collect(),
            None => folders.to_vec(),
        };

        let mut keys: HashMap<String, i64> = HashMap::with_capacity(kept.len());
        for folder in FolderGraph::new(&kept).topological_order() {
            let parent = folder
                .parent
                .as_deref()
                .filter(|p| scope.is_none_or(|s| s.persists(p)))
                .and_then(|p| keys.get(p).copied());

            let id = db.upsert_folder(&folder.long_id, folder.name.as_deref(), parent)?;
            keys.insert(folder.long_id.clone(), id);
        }

        debug!(count = keys.len(), "Persisted folders");
        Ok(Self { keys })
    }

    #[must_use]
    pub fn get(&self, long_id: &str) -> Option<i64> {
        self.keys.get(long_id).copied()
    }

    /// Local folder key for a note, `None` if its folder was not written.
    #[must_use]
    pub fn note_folder(&self, note: &Note) -> Option<i64> {
        note.folder.as_deref().and_then(|f| self.get(f))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
