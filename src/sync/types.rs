//! Export options, sync state and run reports.

use serde::Serialize;

use crate::error::{Error, Result};

/// How stored notes are reconciled with the source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Upsert every in-scope note.
    #[default]
    FullReplace,
    /// Only write notes whose `updated` value changed since the last run.
    ChangesOnly,
    /// As `ChangesOnly`, then delete stored notes the run did not see.
    ChangesDeleteMissing,
}

impl SyncMode {
    /// Build a mode from the `--sync` / `--sync-delete-missing` flags.
    ///
    /// # Errors
    ///
    /// Returns a usage error when delete-missing is asked for without sync.
    pub fn from_flags(sync: bool, delete_missing: bool) -> Result<Self> {
        match (sync, delete_missing) {
            (false, false) => Ok(Self::FullReplace),
            (true, false) => Ok(Self::ChangesOnly),
            (true, true) => Ok(Self::ChangesDeleteMissing),
            (false, true) => Err(Error::Usage(
                "--sync-delete-missing requires --sync".to_string(),
            )),
        }
    }

    /// Whether unchanged notes are skipped and a watermark is kept.
    #[must_use]
    pub const fn is_sync(self) -> bool {
        !matches!(self, Self::FullReplace)
    }

    #[must_use]
    pub const fn deletes_missing(self) -> bool {
        matches!(self, Self::ChangesDeleteMissing)
    }
}

impl std::fmt::Display for SyncMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FullReplace => write!(f, "full"),
            Self::ChangesOnly => write!(f, "sync"),
            Self::ChangesDeleteMissing => write!(f, "sync-delete-missing"),
        }
    }
}

/// Options for one export run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportOptions {
    pub mode: SyncMode,
    /// `--folder` reference
    pub folder_filter: Option<String>,
    /// `--stop-after` record cap
    pub stop_after: Option<usize>,
}

impl ExportOptions {
    /// Reject flag combinations before any extraction happens.
    ///
    /// # Errors
    ///
    /// Returns a usage error for delete-missing with a record cap.
    pub fn validate(&self) -> Result<()> {
        if self.mode.deletes_missing() && self.stop_after.is_some() {
            return Err(Error::Usage(
                "--sync-delete-missing cannot be used with --stop-after".to_string(),
            ));
        }
        Ok(())
    }
}

/// Persisted state carried between sync runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncState {
    /// Highest `updated` value written by the last completed sync
    pub last_sync: Option<String>,
}

/// Summary of an export run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportReport {
    pub mode: SyncMode,
    /// Matched `--folder` target, as a `long_id`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    /// Folder rows written
    pub folders: usize,
    /// In-scope notes read from the source
    pub seen: usize,
    /// Notes upserted
    pub written: usize,
    /// Notes left alone because their `updated` value was unchanged
    pub skipped: usize,
    /// Notes dropped for being outside the folder filter
    pub filtered: usize,
    /// Stored notes deleted for no longer existing
    pub deleted: usize,
    /// Progress estimate used for the run, if any
    pub expected: Option<usize>,
    /// Watermark persisted by this run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watermark: Option<String>,
}
