//! Export and sync of notes into the output database.
//!
//! - **Full export**: upsert every in-scope note
//! - **Sync** (`--sync`): skip notes whose `updated` value is unchanged and
//!   keep a watermark so the next run only asks for newer notes
//! - **Delete missing** (`--sync-delete-missing`): full scan, then delete
//!   stored notes that were not seen, limited to the folder filter's subtree
//! - **Dump** (`--dump`): stream notes as JSON lines instead of writing
//!
//! # Example
//!
//! ```ignore
//! use notes_to_sqlite::sync::{export, ExportOptions, Progress, SyncMode};
//!
//! let options = ExportOptions {
//!     mode: SyncMode::ChangesOnly,
//!     folder_filter: Some("Work/Projects".to_string()),
//!     stop_after: None,
//! };
//! let report = export(&mut db, &source, options, Progress::hidden())?;
//! ```

mod dump;
mod engine;
mod folder_keys;
mod progress;
mod reconcile;
mod types;

pub use dump::dump_notes;
pub use engine::{export, ExportOutcome, Exporter};
pub use folder_keys::FolderKeys;
pub use progress::Progress;
pub use reconcile::{Decision, Reconciler};
pub use types::{ExportOptions, ExportReport, SyncMode, SyncState};
