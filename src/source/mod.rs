//! Note and folder extraction.
//!
//! Defines the interface the export engine reads from. The concrete
//! [`AppleNotes`] source runs AppleScript through `osascript` and, when the
//! Notes store is readable, lists folders straight from `NoteStore.sqlite`.

pub mod applescript;
pub mod notestore;
pub mod parse;
pub mod process;

pub use applescript::AppleNotes;
pub use notestore::NoteStore;

use crate::error::Result;
use crate::model::{Folder, Note};

/// Lazy, forward-only stream of notes. Consumed once per run.
pub type NoteStream<'a> = Box<dyn Iterator<Item = Result<Note>> + 'a>;

/// Trait for note sources.
///
/// Implemented by [`AppleNotes`]; tests supply in-memory fakes.
pub trait NoteSource {
    /// Total number of notes, ignoring folders.
    fn count_notes(&self) -> Result<usize>;

    /// Fast count of notes stored in the given source folder keys.
    ///
    /// Default implementation reports the count as unavailable.
    fn count_notes_in_folders(&self, _folder_keys: &[i64]) -> Result<Option<usize>> {
        Ok(None)
    }

    /// Every folder, in no particular order.
    fn list_folders(&self) -> Result<Vec<Folder>>;

    /// Stream notes.
    ///
    /// `scope` restricts extraction to notes held directly in the listed
    /// folder `long_id`s. `since` asks for notes modified after the given
    /// timestamp; sources may ignore it and return more.
    fn list_notes(&self, scope: Option<&[String]>, since: Option<&str>) -> Result<NoteStream<'_>>;
}
