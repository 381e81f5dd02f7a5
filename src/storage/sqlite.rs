//! SQLite storage implementation.
//!
//! Every write is its own statement with no surrounding transaction, so a
//! run that aborts midway leaves the rows written so far in place. Reruns
//! converge because notes upsert on `id` and folders upsert on `long_id`.

use crate::error::Result;
use crate::model::Note;
use crate::storage::schema::{apply_schema, apply_sync_state_schema};
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;

/// Key under which the sync watermark is stored.
pub const LAST_SYNC_KEY: &str = "last_sync";

/// SQLite-backed output database.
#[derive(Debug)]
pub struct NotesDb {
    conn: Connection,
}

/// A row of the `folders` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderRow {
    pub id: i64,
    pub long_id: String,
    pub name: Option<String>,
    pub parent: Option<i64>,
}

/// A row of the `notes` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteRow {
    pub id: String,
    pub created: Option<String>,
    pub updated: Option<String>,
    pub folder: Option<i64>,
    pub title: Option<String>,
    pub body: Option<String>,
}

impl NotesDb {
    /// Open (or create) a database and apply the schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Names of all tables, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn table_names(&self) -> Result<Vec<String>> {
        let names = self
            .conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")?
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(names)
    }

    // ======================================================================
    // Folders
    // ======================================================================

    /// Surrogate id of a stored folder.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn folder_id(&self, long_id: &str) -> Result<Option<i64>> {
        let id = self
            .conn
            .query_row(
                "SELECT id FROM folders WHERE long_id = ?1",
                [long_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    /// Insert or replace a folder keyed on `long_id`, returning its id.
    ///
    /// An existing row keeps its surrogate id, so notes that still point
    /// at it stay valid.
    ///
    /// # Errors
    ///
    /// Returns an error if the upsert fails, including a `parent` that does
    /// not reference a stored folder.
    pub fn upsert_folder(
        &mut self,
        long_id: &str,
        name: Option<&str>,
        parent: Option<i64>,
    ) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO folders (long_id, name, parent)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(long_id) DO UPDATE SET
               name = excluded.name,
               parent = excluded.parent",
            rusqlite::params![long_id, name, parent],
        )?;
        let id = self.conn.query_row(
            "SELECT id FROM folders WHERE long_id = ?1",
            [long_id],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// All folder rows ordered by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn folder_rows(&self) -> Result<Vec<FolderRow>> {
        let rows = self
            .conn
            .prepare("SELECT id, long_id, name, parent FROM folders ORDER BY id")?
            .query_map([], |row| {
                Ok(FolderRow {
                    id: row.get(0)?,
                    long_id: row.get(1)?,
                    name: row.get(2)?,
                    parent: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // ======================================================================
    // Notes
    // ======================================================================

    /// Insert or fully replace a note, with its folder already mapped to a
    /// local folder id.
    ///
    /// # Errors
    ///
    /// Returns an error if the upsert fails.
    pub fn upsert_note(&mut self, note: &Note, folder: Option<i64>) -> Result<()> {
        self.conn.execute(
            "INSERT INTO notes (id, created, updated, folder, title, body)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
               created = excluded.created,
               updated = excluded.updated,
               folder = excluded.folder,
               title = excluded.title,
               body = excluded.body",
            rusqlite::params![
                note.id,
                note.created,
                note.updated,
                folder,
                note.title,
                note.body,
            ],
        )?;
        Ok(())
    }

    /// Map of every stored note id to its `updated` value.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn note_snapshot(&self) -> Result<HashMap<String, Option<String>>> {
        let snapshot = self
            .conn
            .prepare("SELECT id, updated FROM notes")?
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<HashMap<_, _>, _>>()?;
        Ok(snapshot)
    }

    /// All note rows ordered by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn note_rows(&self) -> Result<Vec<NoteRow>> {
        let rows = self
            .conn
            .prepare("SELECT id, created, updated, folder, title, body FROM notes ORDER BY id")?
            .query_map([], |row| {
                Ok(NoteRow {
                    id: row.get(0)?,
                    created: row.get(1)?,
                    updated: row.get(2)?,
                    folder: row.get(3)?,
                    title: row.get(4)?,
                    body: row.get(5)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Whether a note with this id is stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn note_exists(&self, id: &str) -> Result<bool> {
        Ok(self
            .conn
            .prepare("SELECT 1 FROM notes WHERE id = ?1")?
            .exists([id])?)
    }

    /// Delete stored notes whose id is not in `seen`.
    ///
    /// With `folders`, only notes in one of those local folder ids are
    /// candidates; notes elsewhere, including those with no folder, are left
    /// alone. Without it every stored note is a candidate.
    ///
    /// Returns the number of deleted rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn delete_notes_not_in(
        &mut self,
        seen: &HashSet<String>,
        folders: Option<&[i64]>,
    ) -> Result<usize> {
        let mut seen_ids: Vec<&str> = seen.iter().map(String::as_str).collect();
        seen_ids.sort_unstable();
        let seen_json = serde_json::to_string(&seen_ids)?;

        let deleted = match folders {
            Some(folders) => self.conn.execute(
                "DELETE FROM notes
                 WHERE folder IN (SELECT value FROM json_each(?1))
                   AND id NOT IN (SELECT value FROM json_each(?2))",
                rusqlite::params![serde_json::to_string(folders)?, seen_json],
            )?,
            None => self.conn.execute(
                "DELETE FROM notes WHERE id NOT IN (SELECT value FROM json_each(?1))",
                [seen_json],
            )?,
        };
        Ok(deleted)
    }

    // ======================================================================
    // Sync state
    // ======================================================================

    /// Create the `sync_state` table if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the table cannot be created.
    pub fn ensure_sync_state(&mut self) -> Result<()> {
        apply_sync_state_schema(&self.conn)?;
        Ok(())
    }

    /// Stored sync watermark, if any.
    ///
    /// Returns `None` when the `sync_state` table does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn last_sync(&self) -> Result<Option<String>> {
        let has_table = self
            .conn
            .prepare("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'sync_state'")?
            .exists([])?;
        if !has_table {
            return Ok(None);
        }

        let value = self
            .conn
            .query_row(
                "SELECT value FROM sync_state WHERE key = ?1",
                [LAST_SYNC_KEY],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()?
            .flatten();
        Ok(value)
    }

    /// Store the sync watermark.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn set_last_sync(&mut self, value: &str) -> Result<()> {
        self.ensure_sync_state()?;
        self.conn.execute(
            "INSERT INTO sync_state (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            rusqlite::params![LAST_SYNC_KEY, value],
        )?;
        Ok(())
    }
}
