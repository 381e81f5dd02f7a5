//! Note model.

use serde::{Deserialize, Serialize};

/// A note as yielded by the extractor.
///
/// `folder` holds the owning folder's `long_id`; it is only translated to a
/// local folder key when the note is written to the database. Field order
/// matches the `--dump` JSON line layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Stable external identifier
    pub id: String,

    /// Creation timestamp (`YYYY-MM-DDTHH:MM:SS`)
    pub created: String,

    /// Modification timestamp, drives change detection
    pub updated: String,

    /// Owning folder `long_id`
    pub folder: Option<String>,

    pub title: String,

    pub body: String,
}

impl Note {
    /// Whether this note lives in one of the given folders.
    #[must_use]
    pub fn in_folders(&self, folders: &std::collections::HashSet<String>) -> bool {
        self.folder.as_ref().is_some_and(|f| folders.contains(f))
    }
}
