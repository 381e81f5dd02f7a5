//! Folder parent/child graph.
//!
//! Builds a children index over a folder set and answers ordering and
//! hierarchy queries. Raw folder data may contain dangling parents (a
//! `parent` that is not in the set) and cycles; every traversal here
//! keeps an owned visited set so it terminates on any input.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::model::Folder;

/// Index over a borrowed folder set.
#[derive(Debug)]
pub struct FolderGraph<'a> {
    folders: &'a [Folder],
    by_id: HashMap<&'a str, &'a Folder>,
    children: HashMap<&'a str, Vec<&'a Folder>>,
}

impl<'a> FolderGraph<'a> {
    /// Index a folder set. Children keep their input order.
    #[must_use]
    pub fn new(folders: &'a [Folder]) -> Self {
        let mut by_id = HashMap::with_capacity(folders.len());
        let mut children: HashMap<&str, Vec<&Folder>> = HashMap::new();

        for folder in folders {
            by_id.insert(folder.long_id.as_str(), folder);
            if let Some(parent) = folder.parent.as_deref() {
                children.entry(parent).or_default().push(folder);
            }
        }

        Self {
            folders,
            by_id,
            children,
        }
    }

    /// Look up a folder by `long_id`.
    #[must_use]
    pub fn get(&self, long_id: &str) -> Option<&'a Folder> {
        self.by_id.get(long_id).copied()
    }

    /// Direct children of a folder, in input order.
    #[must_use]
    pub fn children_of(&self, long_id: &str) -> &[&'a Folder] {
        self.children.get(long_id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Whether the folder has no parent inside this set.
    fn is_root(&self, folder: &Folder) -> bool {
        folder
            .parent
            .as_deref()
            .is_none_or(|parent| !self.by_id.contains_key(parent))
    }

    /// Order folders so that every parent present in the set precedes its
    /// children.
    ///
    /// Pre-order depth-first traversal seeded from each root in input order,
    /// followed by a sweep that seeds from any folder still unvisited (folders
    /// whose parent chain loops without reaching a root). Every input folder
    /// is emitted exactly once.
    #[must_use]
    pub fn topological_order(&self) -> Vec<&'a Folder> {
        let mut visited: HashSet<&str> = HashSet::with_capacity(self.folders.len());
        let mut ordered = Vec::with_capacity(self.folders.len());

        for folder in self.folders.iter().filter(|f| self.is_root(f)) {
            self.visit(folder, &mut visited, &mut ordered);
        }
        for folder in self.folders {
            if !visited.contains(folder.long_id.as_str()) {
                self.visit(self.cycle_entry(folder), &mut visited, &mut ordered);
            }
        }

        ordered
    }

    /// First folder that repeats when walking up from `folder`.
    ///
    /// Seeding the sweep there emits folders hanging off a cycle after
    /// their parents.
    fn cycle_entry(&self, folder: &'a Folder) -> &'a Folder {
        let mut seen: HashSet<&str> = HashSet::from([folder.long_id.as_str()]);
        let mut current = folder;
        while let Some(parent) = current.parent.as_deref().and_then(|p| self.get(p)) {
            if !seen.insert(parent.long_id.as_str()) {
                return parent;
            }
            current = parent;
        }
        current
    }

    fn visit(
        &self,
        start: &'a Folder,
        visited: &mut HashSet<&'a str>,
        ordered: &mut Vec<&'a Folder>,
    ) {
        let mut stack = vec![start];
        while let Some(folder) = stack.pop() {
            if !visited.insert(folder.long_id.as_str()) {
                continue;
            }
            ordered.push(folder);
            // Reversed so the first child is popped first.
            stack.extend(self.children_of(&folder.long_id).iter().rev().copied());
        }
    }

    /// The folder and every descendant reachable through the children index.
    #[must_use]
    pub fn subtree(&self, long_id: &str) -> HashSet<String> {
        let mut collected: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::from([long_id]);

        while let Some(current) = queue.pop_front() {
            if !collected.insert(current.to_string()) {
                continue;
            }
            queue.extend(self.children_of(current).iter().map(|c| c.long_id.as_str()));
        }

        collected
    }

    /// Parent chain of a folder, nearest first.
    ///
    /// Includes a dangling parent id as the last entry. Stops before
    /// revisiting an id.
    #[must_use]
    pub fn ancestors(&self, long_id: &str) -> Vec<&'a str> {
        let mut seen: HashSet<&str> = HashSet::from([long_id]);
        let mut chain = Vec::new();
        let mut current = self.get(long_id).and_then(|f| f.parent.as_deref());

        while let Some(parent) = current {
            if !seen.insert(parent) {
                break;
            }
            chain.push(parent);
            current = self.get(parent).and_then(|f| f.parent.as_deref());
        }

        chain
    }

    /// Whether `folder` is named by the last segment and its ancestors are
    /// named by the preceding segments, innermost first.
    ///
    /// Levels above the given segments are unconstrained.
    #[must_use]
    pub fn matches_path(&self, folder: &Folder, segments: &[&str]) -> bool {
        let Some((last, rest)) = segments.split_last() else {
            return false;
        };
        if !folder.is_named(last) {
            return false;
        }

        let mut current = folder;
        for segment in rest.iter().rev() {
            let Some(parent) = current.parent.as_deref().and_then(|p| self.get(p)) else {
                return false;
            };
            if !parent.is_named(segment) {
                return false;
            }
            current = parent;
        }
        true
    }

    /// `/`-joined names from the outermost reachable ancestor to `folder`.
    ///
    /// The upward walk stops at a cycle, a missing parent, or a parent
    /// without a name. Returns `None` when the folder itself has no name.
    #[must_use]
    pub fn path_of(&self, folder: &Folder) -> Option<String> {
        let mut parts = vec![folder.name.as_deref()?];
        let mut seen: HashSet<&str> = HashSet::from([folder.long_id.as_str()]);
        let mut current = folder.parent.as_deref();

        while let Some(parent_id) = current {
            if !seen.insert(parent_id) {
                break;
            }
            let Some(parent) = self.get(parent_id) else {
                break;
            };
            let Some(name) = parent.name.as_deref() else {
                break;
            };
            parts.push(name);
            current = parent.parent.as_deref();
        }

        parts.reverse();
        Some(parts.join("/"))
    }

    /// Every folder path, sorted and de-duplicated.
    #[must_use]
    pub fn all_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.folders.iter().filter_map(|f| self.path_of(f)).collect();
        paths.sort();
        paths.dedup();
        paths
    }

    /// Every folder name, sorted and de-duplicated.
    #[must_use]
    pub fn all_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.folders.iter().filter_map(|f| f.name.clone()).collect();
        names.sort();
        names.dedup();
        names
    }
}
