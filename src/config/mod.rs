//! Configuration management.
//!
//! Resolves where folder metadata is read from and which program runs the
//! Notes scripts. There is no config file; everything comes from flags and
//! environment variables.
//!
//! # NoteStore resolution
//!
//! Folder listing prefers the Notes app's own SQLite store because it
//! exposes folder primary keys, which enable scoped note extraction and a
//! fast scoped count. When no store is usable, folders are listed through
//! AppleScript instead.

use crate::error::{Error, Result};

use std::path::{Path, PathBuf};

/// Environment variable holding an explicit NoteStore path.
pub const NOTESTORE_ENV: &str = "APPLE_NOTES_TO_SQLITE_NOTESTORE";

/// Environment variable that disables NoteStore use when set to `0`,
/// `false` or `no`.
pub const USE_NOTESTORE_ENV: &str = "APPLE_NOTES_TO_SQLITE_USE_NOTESTORE";

/// Environment variable overriding the script runner program.
pub const OSASCRIPT_ENV: &str = "APPLE_NOTES_TO_SQLITE_OSASCRIPT";

/// Location of the Notes store relative to the home directory.
const NOTESTORE_RELATIVE: &str = "Library/Group Containers/group.com.apple.notes/NoteStore.sqlite";

/// The standard NoteStore location under the user's home directory.
#[must_use]
pub fn default_notestore_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(NOTESTORE_RELATIVE))
}

/// Whether a `USE_NOTESTORE` value switches the store off.
fn is_disabled_value(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "0" | "false" | "no")
}

/// Check if NoteStore use is disabled through the environment.
#[must_use]
pub fn notestore_disabled() -> bool {
    std::env::var(USE_NOTESTORE_ENV).is_ok_and(|v| is_disabled_value(&v))
}

/// Resolve the NoteStore database to read folders from.
///
/// Priority:
/// 1. If `explicit_path` is provided (flag or `APPLE_NOTES_TO_SQLITE_NOTESTORE`), it must exist
/// 2. `APPLE_NOTES_TO_SQLITE_USE_NOTESTORE=0|false|no` → no store
/// 3. Default location, when the file exists
///
/// Returns `None` when folders should be listed through AppleScript.
///
/// # Errors
///
/// Returns `NoteStoreMissing` if an explicit path does not exist.
pub fn resolve_notestore_path(explicit_path: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit_path {
        if !path.exists() {
            return Err(Error::NoteStoreMissing {
                path: path.to_path_buf(),
            });
        }
        return Ok(Some(path.to_path_buf()));
    }

    if notestore_disabled() {
        return Ok(None);
    }

    Ok(default_notestore_path().filter(|p| p.exists()))
}

/// Program used to run AppleScript.
///
/// `APPLE_NOTES_TO_SQLITE_OSASCRIPT` if set and non-empty, else `osascript`.
#[must_use]
pub fn osascript_program() -> String {
    std::env::var(OSASCRIPT_ENV)
        .ok()
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| "osascript".to_string())
}
