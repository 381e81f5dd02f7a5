//! Data models for exported notes.
//!
//! This module contains the typed records produced by the extractor:
//! - Folder
//! - Note

pub mod folder;
pub mod note;

pub use folder::Folder;
pub use note::Note;
