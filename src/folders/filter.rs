//! `--folder` reference resolution.
//!
//! A reference is matched, in order, as an exact `long_id`, as a
//! `/`-delimited path (when it contains `/`), or as an exact name. The
//! matched folder's subtree scopes which notes are exported; the subtree
//! plus its ancestor chain scopes which folder rows are written, so the
//! `parent` foreign key of every written folder can be satisfied.

use std::collections::HashSet;

use tracing::debug;

use crate::error::{Error, FolderCandidate, FolderLookup, Result};
use crate::folders::graph::FolderGraph;
use crate::model::Folder;

/// A resolved folder filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderScope {
    /// `long_id` of the folder the reference matched
    pub target: String,
    /// The target and all of its descendants
    pub note_folders: HashSet<String>,
    /// `note_folders` plus the target's ancestor chain
    pub persisted_folders: HashSet<String>,
}

impl FolderScope {
    /// Resolve a `--folder` reference against the full folder set.
    ///
    /// # Errors
    ///
    /// Returns `EmptyFolderPath` for references like `"/"`, `FolderNotFound`
    /// when nothing matches, and `AmbiguousFolder` when several folders do.
    pub fn resolve(reference: &str, folders: &[Folder]) -> Result<Self> {
        let graph = FolderGraph::new(folders);
        let target = match_reference(reference, folders, &graph)?;

        let note_folders = graph.subtree(&target.long_id);
        let mut persisted_folders = note_folders.clone();
        for ancestor in graph.ancestors(&target.long_id) {
            if !persisted_folders.insert(ancestor.to_string()) {
                break;
            }
        }

        debug!(
            reference,
            matched = %target.long_id,
            subtree = note_folders.len(),
            persisted = persisted_folders.len(),
            "Resolved folder filter"
        );

        Ok(Self {
            target: target.long_id.clone(),
            note_folders,
            persisted_folders,
        })
    }

    /// Whether notes stored in this folder are in scope.
    #[must_use]
    pub fn includes_notes_of(&self, long_id: &str) -> bool {
        self.note_folders.contains(long_id)
    }

    /// Whether this folder row is written to the database.
    #[must_use]
    pub fn persists(&self, long_id: &str) -> bool {
        self.persisted_folders.contains(long_id)
    }

    /// In-scope folders that carry a NoteStore key.
    ///
    /// Returns their `long_id`s and keys in input order. Both are empty when
    /// folders were not listed from the NoteStore.
    #[must_use]
    pub fn source_targets(&self, folders: &[Folder]) -> (Vec<String>, Vec<i64>) {
        folders
            .iter()
            .filter(|f| self.includes_notes_of(&f.long_id))
            .filter_map(|f| f.source_pk.map(|pk| (f.long_id.clone(), pk)))
            .unzip()
    }
}

fn match_reference<'a>(
    reference: &str,
    folders: &'a [Folder],
    graph: &FolderGraph<'a>,
) -> Result<&'a Folder> {
    if let Some(exact) = folders.iter().find(|f| f.long_id == reference) {
        return Ok(exact);
    }

    if reference.contains('/') {
        let segments: Vec<&str> = reference.split('/').filter(|s| !s.is_empty()).collect();
        if segments.is_empty() {
            return Err(Error::EmptyFolderPath);
        }
        let matches: Vec<&Folder> = folders
            .iter()
            .filter(|f| graph.matches_path(f, &segments))
            .collect();
        return single_match(reference, FolderLookup::Path, matches, || graph.all_paths());
    }

    let matches: Vec<&Folder> = folders.iter().filter(|f| f.is_named(reference)).collect();
    single_match(reference, FolderLookup::Name, matches, || graph.all_names())
}

fn single_match<'a>(
    reference: &str,
    lookup: FolderLookup,
    matches: Vec<&'a Folder>,
    available: impl FnOnce() -> Vec<String>,
) -> Result<&'a Folder> {
    match matches.as_slice() {
        [] => Err(Error::FolderNotFound {
            reference: reference.to_string(),
            lookup,
            available: available(),
        }),
        [only] => Ok(*only),
        _ => Err(Error::AmbiguousFolder {
            reference: reference.to_string(),
            lookup,
            candidates: matches
                .iter()
                .map(|f| FolderCandidate {
                    long_id: f.long_id.clone(),
                    name: f.name.clone(),
                    parent: f.parent.clone(),
                })
                .collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_folders() -> Vec<Folder> {
        vec![
            Folder::new("1", Some("Folder 1"), None),
            Folder::new("2", Some("Folder 2"), Some("1")),
        ]
    }

    fn tree() -> Vec<Folder> {
        vec![
            Folder::new("root", Some("iCloud"), None),
            Folder::new("work", Some("Work"), Some("root")),
            Folder::new("work-notes", Some("Notes"), Some("work")),
            Folder::new("deep", Some("Deep"), Some("work-notes")),
            Folder::new("home", Some("Home"), Some("root")),
            Folder::new("home-notes", Some("Notes"), Some("home")),
        ]
    }

    #[test]
    fn test_resolve_by_path() {
        let scope = FolderScope::resolve("Folder 1/Folder 2", &two_folders()).unwrap();
        assert_eq!(scope.target, "2");
        assert_eq!(scope.note_folders, HashSet::from(["2".to_string()]));
        assert_eq!(
            scope.persisted_folders,
            HashSet::from(["1".to_string(), "2".to_string()])
        );
    }

    #[test]
    fn test_resolve_by_name() {
        let scope = FolderScope::resolve("Folder 2", &two_folders()).unwrap();
        assert_eq!(scope.target, "2");
    }

    #[test]
    fn test_resolve_by_long_id_beats_name() {
        let folders = vec![
            Folder::new("Work", Some("Personal"), None),
            Folder::new("x", Some("Work"), None),
        ];
        let scope = FolderScope::resolve("Work", &folders).unwrap();
        assert_eq!(scope.target, "Work");
    }

    #[test]
    fn test_resolve_long_id_containing_slash() {
        let folders = vec![Folder::new(
            "x-coredata://ABC/ICFolder/p12",
            Some("Notes"),
            None,
        )];
        let scope = FolderScope::resolve("x-coredata://ABC/ICFolder/p12", &folders).unwrap();
        assert_eq!(scope.target, "x-coredata://ABC/ICFolder/p12");
    }

    #[test]
    fn test_ambiguous_name() {
        let err = FolderScope::resolve("Notes", &tree()).unwrap_err();
        match err {
            Error::AmbiguousFolder {
                lookup, candidates, ..
            } => {
                assert_eq!(lookup, FolderLookup::Name);
                let ids: Vec<_> = candidates.iter().map(|c| c.long_id.as_str()).collect();
                assert_eq!(ids, vec!["work-notes", "home-notes"]);
                assert_eq!(candidates[0].parent.as_deref(), Some("work"));
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }
    }

    #[test]
    fn test_path_disambiguates() {
        let scope = FolderScope::resolve("Work/Notes", &tree()).unwrap();
        assert_eq!(scope.target, "work-notes");
        assert_eq!(
            scope.note_folders,
            HashSet::from(["work-notes".to_string(), "deep".to_string()])
        );
        assert!(scope.persists("work"));
        assert!(scope.persists("root"));
        assert!(!scope.persists("home"));
        assert!(!scope.includes_notes_of("work"));
    }

    #[test]
    fn test_path_ignores_empty_segments() {
        let scope = FolderScope::resolve("/Home/Notes/", &tree()).unwrap();
        assert_eq!(scope.target, "home-notes");
    }

    #[test]
    fn test_path_not_found_lists_paths() {
        let err = FolderScope::resolve("Work/Missing", &tree()).unwrap_err();
        match err {
            Error::FolderNotFound {
                lookup, available, ..
            } => {
                assert_eq!(lookup, FolderLookup::Path);
                assert!(available.contains(&"iCloud/Work/Notes/Deep".to_string()));
                assert!(available.contains(&"iCloud/Home/Notes".to_string()));
            }
            other => panic!("expected not found, got {other:?}"),
        }
    }

    #[test]
    fn test_name_not_found_lists_names() {
        let err = FolderScope::resolve("Recipes", &tree()).unwrap_err();
        match err {
            Error::FolderNotFound {
                lookup, available, ..
            } => {
                assert_eq!(lookup, FolderLookup::Name);
                assert_eq!(available, vec!["Deep", "Home", "Notes", "Work", "iCloud"]);
            }
            other => panic!("expected not found, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_path_is_usage_error() {
        let err = FolderScope::resolve("//", &tree()).unwrap_err();
        assert!(matches!(err, Error::EmptyFolderPath));
    }

    #[test]
    fn test_ancestor_walk_handles_cycle() {
        let folders = vec![
            Folder::new("a", Some("A"), Some("b")),
            Folder::new("b", Some("B"), Some("a")),
        ];
        let scope = FolderScope::resolve("A", &folders).unwrap();
        assert_eq!(scope.note_folders.len(), 2);
        assert_eq!(scope.persisted_folders.len(), 2);
    }

    #[test]
    fn test_source_targets_only_keyed_subtree_folders() {
        let folders = vec![
            Folder::new("p1", Some("Root"), None).with_source_pk(1),
            Folder::new("p2", Some("Work"), Some("p1")).with_source_pk(2),
            Folder::new("p3", Some("Deep"), Some("p2")).with_source_pk(3),
            Folder::new("x", Some("Unkeyed"), Some("p2")),
        ];
        let scope = FolderScope::resolve("Work", &folders).unwrap();
        let (ids, pks) = scope.source_targets(&folders);
        assert_eq!(ids, vec!["p2", "p3"]);
        assert_eq!(pks, vec![2, 3]);

        let (ids, pks) = scope.source_targets(&tree());
        assert!(ids.is_empty() && pks.is_empty());
    }

    #[test]
    fn test_dangling_parent_is_kept_in_persisted_set() {
        let folders = vec![Folder::new("child", Some("Child"), Some("gone"))];
        let scope = FolderScope::resolve("Child", &folders).unwrap();
        assert!(scope.persists("gone"));
        assert!(!scope.includes_notes_of("gone"));
    }
}
