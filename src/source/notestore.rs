//! Read-only access to the Notes app's `NoteStore.sqlite`.
//!
//! Core Data keeps every synced object in `ZICCLOUDSYNCINGOBJECT`; the
//! entity number for folders is looked up in `Z_PRIMARYKEY`. Folder
//! `long_id`s are rebuilt as `<coredata base>/ICFolder/p<pk>`, which is the
//! same identifier AppleScript reports.

use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags, OptionalExtension};
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::Folder;

/// Core Data entity number of notes.
const NOTE_ENTITY: i64 = 12;

/// An open NoteStore database.
#[derive(Debug)]
pub struct NoteStore {
    conn: Connection,
    path: PathBuf,
}

fn store_error(err: rusqlite::Error) -> Error {
    Error::Extractor(format!("NoteStore query failed: {err}"))
}

impl NoteStore {
    /// Open the store read-only.
    ///
    /// # Errors
    ///
    /// Returns an `Extractor` error if the file cannot be opened.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(store_error)?;
        debug!(path = %path.display(), "Opened NoteStore");
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Core Data entity number used for folders.
    fn folder_entity(&self) -> Result<i64> {
        self.conn
            .query_row(
                "SELECT Z_ENT FROM Z_PRIMARYKEY WHERE Z_NAME = 'ICFolder'",
                [],
                |row| row.get(0),
            )
            .optional()
            .map_err(store_error)?
            .ok_or_else(|| {
                Error::Extractor("Could not find ICFolder entity in NoteStore.sqlite".to_string())
            })
    }

    /// List every folder, keyed under `coredata_base`.
    ///
    /// # Errors
    ///
    /// Returns an `Extractor` error if the store layout is not recognised.
    pub fn list_folders(&self, coredata_base: &str) -> Result<Vec<Folder>> {
        let entity = self.folder_entity()?;
        let long_id = |pk: i64| format!("{coredata_base}/ICFolder/p{pk}");

        let mut stmt = self
            .conn
            .prepare(
                "SELECT
                    f.Z_PK,
                    COALESCE(f.ZNAME, f.ZTITLE, f.ZTITLE1, f.ZTITLE2, f.ZUSERTITLE),
                    p.Z_PK
                 FROM ZICCLOUDSYNCINGOBJECT f
                 LEFT JOIN ZICCLOUDSYNCINGOBJECT p ON f.ZPARENT = p.Z_PK
                 WHERE f.Z_ENT = ?1",
            )
            .map_err(store_error)?;

        let folders = stmt
            .query_map([entity], |row| {
                let pk: i64 = row.get(0)?;
                let name: Option<String> = row.get(1)?;
                let parent_pk: Option<i64> = row.get(2)?;
                Ok(Folder {
                    long_id: long_id(pk),
                    name,
                    parent: parent_pk.map(long_id),
                    source_pk: Some(pk),
                })
            })
            .map_err(store_error)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(store_error)?;

        debug!(count = folders.len(), "Listed folders from NoteStore");
        Ok(folders)
    }

    /// Count notes held directly in the given folder primary keys.
    ///
    /// # Errors
    ///
    /// Returns an `Extractor` error if the query fails.
    pub fn count_notes_in_folders(&self, folder_pks: &[i64]) -> Result<usize> {
        let pks = serde_json::to_string(folder_pks)?;
        let count: i64 = self
            .conn
            .query_row(
                "SELECT count(*) FROM ZICCLOUDSYNCINGOBJECT
                 WHERE Z_ENT = ?1 AND ZFOLDER IN (SELECT value FROM json_each(?2))",
                rusqlite::params![NOTE_ENTITY, pks],
                |row| row.get(0),
            )
            .map_err(store_error)?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

/// Extract `x-coredata://<store>` from a Core Data object URI.
#[must_use]
pub fn coredata_base(object_id: &str) -> Option<String> {
    const SCHEME: &str = "x-coredata://";
    let rest = object_id.trim().strip_prefix(SCHEME)?;
    let (host, _) = rest.split_once('/')?;
    if host.is_empty() {
        return None;
    }
    Some(format!("{SCHEME}{host}"))
}
