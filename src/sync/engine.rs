//! The export run.
//!
//! One run lists folders, resolves the folder filter, writes folder rows
//! parent-first, then streams notes through the [`Reconciler`] and applies
//! each decision to the database as it goes. Nothing is written before the
//! folder filter has resolved.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::folders::FolderScope;
use crate::source::NoteSource;
use crate::storage::NotesDb;
use crate::sync::folder_keys::FolderKeys;
use crate::sync::progress::Progress;
use crate::sync::reconcile::{Decision, Reconciler};
use crate::sync::types::{ExportOptions, ExportReport, SyncState};

/// Result of [`Exporter::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOutcome {
    pub report: ExportReport,
    /// State to carry into the next run
    pub state: SyncState,
}

/// Exports notes from a source into a [`NotesDb`].
pub struct Exporter<'a, S: NoteSource + ?Sized> {
    db: &'a mut NotesDb,
    source: &'a S,
    options: ExportOptions,
    progress: Progress,
}

impl<'a, S: NoteSource + ?Sized> Exporter<'a, S> {
    #[must_use]
    pub fn new(db: &'a mut NotesDb, source: &'a S, options: ExportOptions) -> Self {
        Self {
            db,
            source,
            options,
            progress: Progress::hidden(),
        }
    }

    #[must_use]
    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = progress;
        self
    }

    /// Run one export.
    ///
    /// `state` carries the watermark from the previous sync. In
    /// delete-missing mode it is ignored so every note is scanned.
    ///
    /// # Errors
    ///
    /// Returns a usage error for invalid options, a resolution error for a
    /// bad `--folder`, and any extractor or database failure. Rows written
    /// before a failure stay written.
    pub fn run(&mut self, state: &SyncState) -> Result<ExportOutcome> {
        self.options.validate()?;
        let mode = self.options.mode;
        let mut report = ExportReport {
            mode,
            ..ExportReport::default()
        };

        let snapshot: HashMap<String, Option<String>> = if mode.is_sync() {
            self.db.note_snapshot()?
        } else {
            HashMap::new()
        };
        let since = if mode.is_sync() && !mode.deletes_missing() {
            state.last_sync.clone()
        } else {
            None
        };

        self.progress.stage("Fetching folders from Notes…");
        let folders = self.source.list_folders()?;
        let scope = self
            .options
            .folder_filter
            .as_deref()
            .map(|reference| FolderScope::resolve(reference, &folders))
            .transpose()?;
        report.folder = scope.as_ref().map(|s| s.target.clone());

        if mode.is_sync() {
            self.db.ensure_sync_state()?;
        }
        let keys = FolderKeys::persist(self.db, &folders, scope.as_ref())?;
        report.folders = keys.len();

        let (target_ids, target_pks) = scope
            .as_ref()
            .map(|s| s.source_targets(&folders))
            .unwrap_or_default();
        let extract_scope = (!target_ids.is_empty()).then_some(target_ids.as_slice());

        report.expected = self.expected_count(&target_pks)?;
        info!(
            %mode,
            folders = folders.len(),
            persisted = report.folders,
            expected = ?report.expected,
            since = ?since,
            "Exporting notes"
        );

        let mut reconciler = Reconciler::new(
            mode,
            scope.as_ref().map(|s| s.note_folders.clone()),
            snapshot,
        );
        self.progress.stage("Exporting notes…");
        self.stream_notes(extract_scope, since.as_deref(), &keys, &mut reconciler, &mut report)?;
        self.progress.finish();

        if mode.deletes_missing() {
            report.deleted = self.delete_missing(scope.as_ref(), &keys, &reconciler)?;
        }

        let mut next = state.clone();
        if mode.is_sync() && self.options.stop_after.is_none() {
            if let Some(watermark) = reconciler.watermark() {
                self.db.set_last_sync(watermark)?;
                debug!(watermark, "Stored sync watermark");
                report.watermark = Some(watermark.to_string());
                next.last_sync = Some(watermark.to_string());
            }
        }

        info!(
            written = report.written,
            skipped = report.skipped,
            filtered = report.filtered,
            deleted = report.deleted,
            "Export finished"
        );
        Ok(ExportOutcome {
            report,
            state: next,
        })
    }

    /// Progress estimate: the record cap, else a fast scoped count, else
    /// the source's total.
    fn expected_count(&self, target_pks: &[i64]) -> Result<Option<usize>> {
        if let Some(cap) = self.options.stop_after {
            return Ok(Some(cap));
        }
        if !target_pks.is_empty() {
            if let Some(count) = self.source.count_notes_in_folders(target_pks)? {
                return Ok(Some(count));
            }
        }
        self.progress.stage("Counting notes…");
        Ok(Some(self.source.count_notes()?))
    }

    fn stream_notes(
        &mut self,
        scope: Option<&[String]>,
        since: Option<&str>,
        keys: &FolderKeys,
        reconciler: &mut Reconciler,
        report: &mut ExportReport,
    ) -> Result<()> {
        let source = self.source;
        let stop_after = self.options.stop_after;
        let mut processed = 0usize;

        for note in source.list_notes(scope, since)? {
            let note = note?;
            match reconciler.decide(&note) {
                Decision::Filtered => {
                    report.filtered += 1;
                    continue;
                }
                Decision::Skip => report.skipped += 1,
                Decision::Upsert => {
                    self.db.upsert_note(&note, keys.note_folder(&note))?;
                    report.written += 1;
                }
            }

            processed += 1;
            self.progress.tick(processed, report.expected);
            if stop_after.is_some_and(|cap| processed >= cap) {
                debug!(processed, "Reached --stop-after");
                break;
            }
        }

        report.seen = processed;
        Ok(())
    }

    fn delete_missing(
        &mut self,
        scope: Option<&FolderScope>,
        keys: &FolderKeys,
        reconciler: &Reconciler,
    ) -> Result<usize> {
        let seen = reconciler.seen();
        let deleted = match scope {
            Some(scope) => {
                let mut folder_ids: Vec<i64> = scope
                    .note_folders
                    .iter()
                    .filter_map(|id| keys.get(id))
                    .collect();
                if folder_ids.is_empty() {
                    warn!(folder = %scope.target, "No stored folders in scope, nothing deleted");
                    return Ok(0);
                }
                folder_ids.sort_unstable();
                self.db.delete_notes_not_in(seen, Some(&folder_ids))?
            }
            None => self.db.delete_notes_not_in(seen, None)?,
        };

        info!(deleted, seen = seen.len(), "Deleted missing notes");
        Ok(deleted)
    }
}

/// Run an export using the watermark stored in `db`.
///
/// # Errors
///
/// See [`Exporter::run`].
pub fn export<S: NoteSource + ?Sized>(
    db: &mut NotesDb,
    source: &S,
    options: ExportOptions,
    progress: Progress,
) -> Result<ExportReport> {
    let state = SyncState {
        last_sync: db.last_sync()?,
    };
    let outcome = Exporter::new(db, source, options)
        .with_progress(progress)
        .run(&state)?;
    Ok(outcome.report)
}
