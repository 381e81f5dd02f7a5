//! Error types for apple-notes-to-sqlite.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=usage, 3=folder resolution, 6=extractor, etc.)
//! - Recovery hints listing available folders or conflicting candidates
//! - Structured JSON output for `--json` consumers

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for export operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
///
/// Each code maps to a SCREAMING_SNAKE string and a category-based
/// exit code. Scripts match on either.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Usage (exit 2)
    UsageError,
    EmptyFolderPath,

    // Folder resolution (exit 3)
    FolderNotFound,
    AmbiguousFolder,

    // Database (exit 5)
    DatabaseError,

    // Extractor (exit 6)
    ExtractorError,

    // Config (exit 7)
    ConfigError,

    // I/O (exit 8)
    IoError,
    JsonError,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::UsageError => "USAGE_ERROR",
            Self::EmptyFolderPath => "EMPTY_FOLDER_PATH",
            Self::FolderNotFound => "FOLDER_NOT_FOUND",
            Self::AmbiguousFolder => "AMBIGUOUS_FOLDER",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::ExtractorError => "EXTRACTOR_ERROR",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::UsageError | Self::EmptyFolderPath => 2,
            Self::FolderNotFound | Self::AmbiguousFolder => 3,
            Self::DatabaseError => 5,
            Self::ExtractorError => 6,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError => 8,
        }
    }

    /// Whether rerunning with corrected input can succeed.
    ///
    /// True for usage and folder resolution errors. Extractor and
    /// database failures need the environment fixed first.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::UsageError | Self::EmptyFolderPath | Self::FolderNotFound | Self::AmbiguousFolder
        )
    }
}

// ── Folder lookup details ─────────────────────────────────────

/// How a `--folder` reference was interpreted when it failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderLookup {
    /// Bare folder name.
    Name,
    /// `/`-delimited folder path.
    Path,
}

impl fmt::Display for FolderLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name => write!(f, "name"),
            Self::Path => write!(f, "path"),
        }
    }
}

/// A folder that matched an ambiguous `--folder` reference.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FolderCandidate {
    pub long_id: String,
    pub name: Option<String>,
    pub parent: Option<String>,
}

impl fmt::Display for FolderCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "- long_id=\"{}\", name=\"{}\", parent=\"{}\"",
            self.long_id,
            self.name.as_deref().unwrap_or_default(),
            self.parent.as_deref().unwrap_or_default()
        )
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur while exporting notes.
#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Usage(String),

    #[error("Folder path cannot be empty")]
    EmptyFolderPath,

    #[error("No folder found matching {lookup} \"{reference}\"")]
    FolderNotFound {
        reference: String,
        lookup: FolderLookup,
        /// Folder names (name lookup) or folder paths (path lookup).
        available: Vec<String>,
    },

    #[error("Multiple folders matched {lookup} \"{reference}\"")]
    AmbiguousFolder {
        reference: String,
        lookup: FolderLookup,
        candidates: Vec<FolderCandidate>,
    },

    #[error("Extractor failed: {0}")]
    Extractor(String),

    #[error("NoteStore not found at {path}")]
    NoteStoreMissing { path: PathBuf },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::Usage(_) => ErrorCode::UsageError,
            Self::EmptyFolderPath => ErrorCode::EmptyFolderPath,
            Self::FolderNotFound { .. } => ErrorCode::FolderNotFound,
            Self::AmbiguousFolder { .. } => ErrorCode::AmbiguousFolder,
            Self::Extractor(_) => ErrorCode::ExtractorError,
            Self::Database(_) => ErrorCode::DatabaseError,
            Self::NoteStoreMissing { .. } | Self::Config(_) => ErrorCode::ConfigError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Recovery hint for the user.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::Usage(_) => Some("Run with --help to see the available options.".to_string()),

            Self::EmptyFolderPath => {
                Some("Pass a folder name, a path like \"Parent/Child\", or a long_id.".to_string())
            }

            Self::FolderNotFound {
                lookup, available, ..
            } => {
                let mut hint = match lookup {
                    FolderLookup::Name => String::from(
                        "Use the folder name, path, or long_id.\nAvailable folder names:",
                    ),
                    FolderLookup::Path => String::from("Available folder paths:"),
                };
                if available.is_empty() {
                    hint.push_str("\n  (none)");
                }
                for entry in available {
                    hint.push_str("\n  ");
                    hint.push_str(entry);
                }
                Some(hint)
            }

            Self::AmbiguousFolder { candidates, .. } => {
                let mut hint = String::from("Use --folder with the long_id.");
                for candidate in candidates {
                    hint.push_str(&format!("\n  {candidate}"));
                }
                Some(hint)
            }

            Self::NoteStoreMissing { .. } => Some(
                "Pass --notestore with the path to NoteStore.sqlite, or omit it to list folders via osascript."
                    .to_string(),
            ),

            Self::Extractor(_)
            | Self::Database(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::Config(_)
            | Self::Other(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    ///
    /// Includes error code, message, retryability, exit code, optional
    /// recovery hint, and the folder listings for resolution errors.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        match self {
            Self::FolderNotFound { available, .. } => {
                obj["error"]["available"] = serde_json::json!(available);
            }
            Self::AmbiguousFolder { candidates, .. } => {
                obj["error"]["candidates"] = serde_json::json!(candidates);
            }
            _ => {}
        }

        obj
    }
}
