//! Folder hierarchy handling.
//!
//! - [`graph`] - parent/child index, topological order, subtree and path queries
//! - [`filter`] - resolving a `--folder` reference to a [`FolderScope`]

pub mod filter;
pub mod graph;

pub use filter::FolderScope;
pub use graph::FolderGraph;
