//! `--dump`: notes as JSON lines, no database.

use std::io::Write;

use tracing::debug;

use crate::error::Result;
use crate::folders::FolderScope;
use crate::source::NoteSource;
use crate::sync::progress::Progress;

/// Write every in-scope note to `out` as one JSON object per line.
///
/// Folders stay as their source `long_id`s. Returns the number of notes
/// written.
///
/// # Errors
///
/// Returns resolution, extractor, serialization or write errors.
pub fn dump_notes<S, W>(
    source: &S,
    folder_filter: Option<&str>,
    stop_after: Option<usize>,
    out: &mut W,
    progress: &Progress,
) -> Result<usize>
where
    S: NoteSource + ?Sized,
    W: Write,
{
    let (scope, target_ids) = match folder_filter {
        Some(reference) => {
            progress.stage("Fetching folders from Notes…");
            let folders = source.list_folders()?;
            let scope = FolderScope::resolve(reference, &folders)?;
            let (ids, _) = scope.source_targets(&folders);
            (Some(scope), ids)
        }
        None => (None, Vec::new()),
    };
    let extract_scope = (!target_ids.is_empty()).then_some(target_ids.as_slice());

    progress.stage("Fetching notes from Notes…");
    let mut written = 0usize;
    for note in source.list_notes(extract_scope, None)? {
        let note = note?;
        if scope
            .as_ref()
            .is_some_and(|s| !note.in_folders(&s.note_folders))
        {
            continue;
        }

        serde_json::to_writer(&mut *out, &note)?;
        writeln!(out)?;
        written += 1;
        if stop_after.is_some_and(|cap| written >= cap) {
            break;
        }
    }
    out.flush()?;

    debug!(written, "Dumped notes");
    Ok(written)
}
