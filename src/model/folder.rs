//! Folder model.
//!
//! Folders form a forest keyed by `long_id`. Raw extractor data may carry
//! dangling or cyclic `parent` references; see [`crate::folders::FolderGraph`]
//! for how those are ordered safely.

use serde::Serialize;

/// A folder as listed by the extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Folder {
    /// Stable external identifier (a Core Data URI for Apple Notes)
    pub long_id: String,

    /// Display name, not unique
    pub name: Option<String>,

    /// `long_id` of the containing folder, `None` for top-level folders
    pub parent: Option<String>,

    /// Primary key inside NoteStore.sqlite, when folders were read from it
    #[serde(skip)]
    pub source_pk: Option<i64>,
}

impl Folder {
    /// Create a folder with no NoteStore key.
    pub fn new(long_id: impl Into<String>, name: Option<&str>, parent: Option<&str>) -> Self {
        Self {
            long_id: long_id.into(),
            name: name.map(String::from),
            parent: parent.map(String::from),
            source_pk: None,
        }
    }

    /// Attach the NoteStore primary key.
    #[must_use]
    pub fn with_source_pk(mut self, pk: i64) -> Self {
        self.source_pk = Some(pk);
        self
    }

    /// Whether the folder's display name equals `name`.
    #[must_use]
    pub fn is_named(&self, name: &str) -> bool {
        self.name.as_deref() == Some(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_folder() {
        let folder = Folder::new("folder-2", Some("Folder 2"), Some("folder-1")).with_source_pk(7);
        assert_eq!(folder.long_id, "folder-2");
        assert!(folder.is_named("Folder 2"));
        assert!(!folder.is_named("Folder 1"));
        assert_eq!(folder.parent.as_deref(), Some("folder-1"));
        assert_eq!(folder.source_pk, Some(7));
    }

    #[test]
    fn test_source_pk_not_serialized() {
        let folder = Folder::new("f", Some("F"), None).with_source_pk(3);
        let json = serde_json::to_value(&folder).unwrap();
        assert!(json.get("source_pk").is_none());
        assert_eq!(json["parent"], serde_json::Value::Null);
    }
}
