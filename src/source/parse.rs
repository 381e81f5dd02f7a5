//! Parsers for the script line protocols.
//!
//! Notes arrive as token-framed records:
//!
//! ```text
//! <tok>-id: x-coredata://.../ICNote/p1
//! <tok>-created: 2023-03-08T16:36:41
//! <tok>-updated: 2023-03-08T15:36:41
//! <tok>-folder: x-coredata://.../ICFolder/p2
//! <tok>-title: Title 1
//! <div>body line</div>
//! <tok><tok>
//! ```
//!
//! Folders arrive as `long_id: / name: / parent:` lines closed by `===`.
//! Input lines are expected to be trimmed already.

use tracing::{debug, warn};

use crate::error::Result;
use crate::model::{Folder, Note};

const NOTE_KEYS: [&str; 5] = ["id", "title", "folder", "created", "updated"];

/// Value of a `key: value` line, `Some("")` for a bare `key:`.
fn field<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(prefix)?.strip_prefix(':')?;
    if rest.is_empty() {
        Some("")
    } else {
        rest.strip_prefix(' ')
    }
}

#[derive(Debug, Default)]
struct PartialNote {
    id: Option<String>,
    created: Option<String>,
    updated: Option<String>,
    folder: Option<String>,
    title: Option<String>,
    body: Vec<String>,
}

impl PartialNote {
    fn set(&mut self, key: &str, value: &str) {
        let value = value.to_string();
        match key {
            "id" => self.id = Some(value),
            "created" => self.created = Some(value),
            "updated" => self.updated = Some(value),
            "folder" => self.folder = Some(value),
            _ => self.title = Some(value),
        }
    }

    fn finish(self) -> Option<Note> {
        let Some(id) = self.id.filter(|id| !id.is_empty()) else {
            debug!("Dropping note record without id");
            return None;
        };
        if self.updated.is_none() {
            warn!(%id, "Note record has no updated timestamp");
        }

        Some(Note {
            created: self.created.unwrap_or_default(),
            updated: self.updated.unwrap_or_default(),
            folder: self.folder.filter(|f| !f.is_empty()),
            title: self.title.unwrap_or_default(),
            body: self.body.join("\n").trim().to_string(),
            id,
        })
    }
}

/// Assembles notes from a stream of trimmed script lines.
///
/// Errors from the underlying lines are passed through. A trailing record
/// without its terminator is discarded.
pub struct NoteRecords<I> {
    lines: I,
    prefixes: Vec<(&'static str, String)>,
    terminator: String,
    current: PartialNote,
}

impl<I> NoteRecords<I>
where
    I: Iterator<Item = Result<String>>,
{
    pub fn new(lines: I, split: &str) -> Self {
        Self {
            lines,
            prefixes: NOTE_KEYS
                .iter()
                .map(|key| (*key, format!("{split}-{key}")))
                .collect(),
            terminator: format!("{split}{split}"),
            current: PartialNote::default(),
        }
    }

    fn metadata<'l>(&self, line: &'l str) -> Option<(&'static str, &'l str)> {
        self.prefixes
            .iter()
            .find_map(|(key, prefix)| field(line, prefix).map(|value| (*key, value)))
    }
}

impl<I> Iterator for NoteRecords<I>
where
    I: Iterator<Item = Result<String>>,
{
    type Item = Result<Note>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e)),
            };

            if line == self.terminator {
                if let Some(note) = std::mem::take(&mut self.current).finish() {
                    return Some(Ok(note));
                }
                continue;
            }

            match self.metadata(&line) {
                Some((key, value)) => self.current.set(key, value),
                None => self.current.body.push(line),
            }
        }
    }
}

/// Parse folder listing lines.
///
/// Empty values mean absent. Blocks without a `long_id` are skipped.
///
/// # Errors
///
/// Returns the first error produced by `lines`.
pub fn parse_folders<I>(lines: I) -> Result<Vec<Folder>>
where
    I: IntoIterator<Item = Result<String>>,
{
    let mut folders = Vec::new();
    let mut long_id: Option<String> = None;
    let mut name: Option<String> = None;
    let mut parent: Option<String> = None;

    for line in lines {
        let line = line?;
        let non_empty = |v: &str| (!v.is_empty()).then(|| v.to_string());

        if let Some(value) = field(&line, "long_id") {
            long_id = non_empty(value);
        } else if let Some(value) = field(&line, "name") {
            name = non_empty(value);
        } else if let Some(value) = field(&line, "parent") {
            parent = non_empty(value);
        } else if line == "===" {
            match long_id.take() {
                Some(id) => folders.push(Folder {
                    long_id: id,
                    name: name.take(),
                    parent: parent.take(),
                    source_pk: None,
                }),
                None => {
                    warn!(name = ?name, "Skipping folder without long_id");
                    name = None;
                    parent = None;
                }
            }
        }
    }

    Ok(folders)
}
