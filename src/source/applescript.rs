//! Apple Notes extraction through `osascript`.

use std::cell::OnceCell;
use std::path::Path;

use chrono::NaiveDateTime;
use tracing::{debug, info};

use crate::config;
use crate::error::{Error, Result};
use crate::model::Folder;
use crate::source::notestore::{self, NoteStore};
use crate::source::parse::{parse_folders, NoteRecords};
use crate::source::process::{run_script, ProcessLines};
use crate::source::{NoteSource, NoteStream};

const COUNT_SCRIPT: &str = r#"
tell application "Notes"
    set noteCount to count of notes
end tell
log noteCount
"#;

const COREDATA_ID_SCRIPT: &str = r#"tell application "Notes" to get id of folder 1"#;

const FOLDERS_SCRIPT: &str = r#"
tell application "Notes"
    set allFolders to folders
    repeat with aFolder in allFolders
        set folderId to id of aFolder
        set folderName to name of aFolder
        set folderContainer to container of aFolder
        if class of folderContainer is folder then
            set folderContainerId to id of folderContainer
        else
            set folderContainerId to ""
        end if
        log "long_id: " & folderId
        log "name: " & folderName
        log "parent: " & folderContainerId
        log "==="
    end repeat
end tell
"#;

/// Per-note logging shared by every note script.
const NOTE_BODY: &str = r#"
      set noteId to the id of eachNote
      set noteTitle to the name of eachNote
      set noteBody to the body of eachNote
      set noteCreatedDate to the creation date of eachNote
      set noteCreated to (noteCreatedDate as «class isot» as string)
      set noteUpdatedDate to the modification date of eachNote
      set noteUpdated to (noteUpdatedDate as «class isot» as string)
      set noteContainer to container of eachNote
      set noteFolderId to the id of noteContainer
      log "{split}-id: " & noteId & "\n"
      log "{split}-created: " & noteCreated & "\n"
      log "{split}-updated: " & noteUpdated & "\n"
      log "{split}-folder: " & noteFolderId & "\n"
      log "{split}-title: " & noteTitle & "\n\n"
      log noteBody & "\n"
      log "{split}{split}" & "\n"
"#;

/// Which notes a script walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NoteSelection<'a> {
    All,
    Folders(&'a [String]),
}

/// Quote a value as an AppleScript string literal.
fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Turn a stored `YYYY-MM-DDTHH:MM:SS` watermark into the text of an
/// AppleScript `date "..."` literal.
fn applescript_date(since: &str) -> String {
    NaiveDateTime::parse_from_str(since, "%Y-%m-%dT%H:%M:%S").map_or_else(
        |_| since.replace('T', " "),
        |dt| dt.format("%Y-%m-%d %H:%M:%S").to_string(),
    )
}

/// Random record separator, unlikely to appear in a note body.
fn split_token() -> String {
    let mut token = uuid::Uuid::new_v4().simple().to_string();
    token.truncate(16);
    token
}

/// Build a note extraction script.
fn note_script(split: &str, selection: NoteSelection<'_>, since: Option<&str>) -> String {
    let filter = if since.is_some() {
        " whose modification date > cutoffDate"
    } else {
        ""
    };
    let mut script = String::from("tell application \"Notes\"\n");
    if let Some(since) = since {
        script.push_str(&format!("   set cutoffDate to date {}\n", quote(&applescript_date(since))));
    }

    let body = NOTE_BODY.replace("{split}", split);
    match selection {
        NoteSelection::All => {
            script.push_str(&format!("   repeat with eachNote in (every note{filter})"));
            script.push_str(&body);
            script.push_str("   end repeat\n");
        }
        NoteSelection::Folders(ids) => {
            let literal = ids.iter().map(|id| quote(id)).collect::<Vec<_>>().join(", ");
            script.push_str(&format!("   set folderIds to {{{literal}}}\n"));
            script.push_str("   repeat with folderId in folderIds\n");
            script.push_str("      set targetFolder to folder id folderId\n");
            script.push_str(&format!(
                "      repeat with eachNote in (every note of targetFolder{filter})"
            ));
            script.push_str(&body);
            script.push_str("      end repeat\n   end repeat\n");
        }
    }
    script.push_str("end tell\n");
    script
}

/// Notes source backed by the Notes app.
#[derive(Debug)]
pub struct AppleNotes {
    program: String,
    notestore: Option<NoteStore>,
    coredata_base: OnceCell<String>,
}

impl AppleNotes {
    pub fn new(program: impl Into<String>, notestore: Option<NoteStore>) -> Self {
        Self {
            program: program.into(),
            notestore,
            coredata_base: OnceCell::new(),
        }
    }

    /// Build a source from the environment and an optional explicit
    /// NoteStore path.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit NoteStore is missing or cannot be
    /// opened.
    pub fn from_env(notestore_path: Option<&Path>) -> Result<Self> {
        let notestore = config::resolve_notestore_path(notestore_path)?
            .map(|path| NoteStore::open(&path))
            .transpose()?;
        if let Some(store) = &notestore {
            info!(path = %store.path().display(), "Reading folders from NoteStore");
        }
        Ok(Self::new(config::osascript_program(), notestore))
    }

    /// `x-coredata://<store>` prefix of folder ids, fetched once.
    fn coredata_base(&self) -> Result<String> {
        if let Some(base) = self.coredata_base.get() {
            return Ok(base.clone());
        }
        let output = run_script(&self.program, COREDATA_ID_SCRIPT)?;
        let base = notestore::coredata_base(&output).ok_or_else(|| {
            Error::Extractor("Could not determine coredata store identifier".to_string())
        })?;
        debug!(%base, "Resolved coredata base");
        Ok(self.coredata_base.get_or_init(|| base).clone())
    }
}

impl NoteSource for AppleNotes {
    fn count_notes(&self) -> Result<usize> {
        let output = run_script(&self.program, COUNT_SCRIPT)?;
        output
            .parse()
            .map_err(|_| Error::Extractor(format!("Unexpected note count output: {output:?}")))
    }

    fn count_notes_in_folders(&self, folder_keys: &[i64]) -> Result<Option<usize>> {
        match &self.notestore {
            Some(store) if !folder_keys.is_empty() => {
                store.count_notes_in_folders(folder_keys).map(Some)
            }
            _ => Ok(None),
        }
    }

    fn list_folders(&self) -> Result<Vec<Folder>> {
        match &self.notestore {
            Some(store) => store.list_folders(&self.coredata_base()?),
            None => parse_folders(ProcessLines::spawn(&self.program, FOLDERS_SCRIPT)?),
        }
    }

    fn list_notes(&self, scope: Option<&[String]>, since: Option<&str>) -> Result<NoteStream<'_>> {
        let selection = match scope {
            Some([]) => return Ok(Box::new(std::iter::empty())),
            Some(ids) => NoteSelection::Folders(ids),
            None => NoteSelection::All,
        };
        let split = split_token();
        let script = note_script(&split, selection, since);
        debug!(?since, scoped = scope.is_some(), "Extracting notes");

        let lines = ProcessLines::spawn(&self.program, &script)?;
        Ok(Box::new(NoteRecords::new(lines, &split)))
    }
}
