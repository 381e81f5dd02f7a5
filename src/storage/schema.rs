//! Database schema definitions.
//!
//! The layout matches what earlier exports of this tool produced, so an
//! existing `notes.db` can be synced in place.

use rusqlite::{Connection, Result};

/// Folders and notes tables.
///
/// `folders.id` is the local surrogate key; `long_id` is the stable Apple
/// Notes identifier and carries a unique index so folder writes can upsert
/// on it.
pub const SCHEMA_SQL: &str = r"
CREATE TABLE IF NOT EXISTS folders (
    id INTEGER PRIMARY KEY,
    long_id TEXT,
    name TEXT,
    parent INTEGER REFERENCES folders(id)
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_folders_long_id ON folders(long_id);

CREATE TABLE IF NOT EXISTS notes (
    id TEXT PRIMARY KEY,
    created TEXT,
    updated TEXT,
    folder INTEGER REFERENCES folders(id),
    title TEXT,
    body TEXT
);
";

/// Key/value table holding the sync watermark.
///
/// Only created by `--sync` runs.
pub const SYNC_STATE_SQL: &str = r"
CREATE TABLE IF NOT EXISTS sync_state (
    key TEXT PRIMARY KEY,
    value TEXT
);
";

/// Apply the folders/notes schema.
///
/// Idempotent: every statement uses `IF NOT EXISTS`.
///
/// # Errors
///
/// Returns an error if the SQL execution fails or pragmas cannot be set.
pub fn apply_schema(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.execute_batch(SCHEMA_SQL)
}

/// Create the `sync_state` table if missing.
///
/// # Errors
///
/// Returns an error if the SQL execution fails.
pub fn apply_sync_state_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SYNC_STATE_SQL)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables(conn: &Connection) -> Vec<String> {
        conn.prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn test_apply_schema() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).expect("Failed to apply schema");

        assert_eq!(tables(&conn), vec!["folders", "notes"]);
    }

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).expect("First apply failed");
        apply_schema(&conn).expect("Second apply failed");
        apply_sync_state_schema(&conn).unwrap();
        apply_sync_state_schema(&conn).unwrap();

        assert_eq!(tables(&conn), vec!["folders", "notes", "sync_state"]);
    }

    #[test]
    fn test_folder_columns_and_foreign_key() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).unwrap();

        let columns: Vec<String> = conn
            .prepare("PRAGMA table_info(folders)")
            .unwrap()
            .query_map([], |row| row.get(1))
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(columns, vec!["id", "long_id", "name", "parent"]);

        // (table, from, to)
        let fks: Vec<(String, String, String)> = conn
            .prepare("PRAGMA foreign_key_list(folders)")
            .unwrap()
            .query_map([], |row| Ok((row.get(2)?, row.get(3)?, row.get(4)?)))
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert!(fks.contains(&("folders".into(), "parent".into(), "id".into())));
    }

    #[test]
    fn test_note_folder_foreign_key_enforced() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO notes (id, created, updated, folder, title, body)
             VALUES ('n1', '', '', 99, '', '')",
            [],
        );
        assert!(result.is_err());
    }
}
