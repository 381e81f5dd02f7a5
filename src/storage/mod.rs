//! SQLite storage layer for exported notes.
//!
//! # Submodules
//!
//! - [`schema`] - Table definitions for `folders`, `notes` and `sync_state`
//! - [`sqlite`] - The [`NotesDb`] row store

pub mod schema;
pub mod sqlite;

pub use sqlite::{FolderRow, NoteRow, NotesDb};
