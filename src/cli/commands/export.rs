//! Export command implementation.
//!
//! Validates flag combinations before touching Notes, then runs one of
//! `--schema`, `--dump`, or a database export.

use std::path::Path;

use colored::Colorize;

use crate::cli::Cli;
use crate::error::{Error, Result};
use crate::source::AppleNotes;
use crate::storage::NotesDb;
use crate::sync::{dump_notes, export, ExportOptions, ExportReport, Progress, SyncMode};

/// Execute the export command.
///
/// # Errors
///
/// Returns usage errors for invalid flag combinations, and any error from
/// folder resolution, extraction, or the database.
pub fn execute(args: &Cli, json: bool) -> Result<()> {
    if args.db_path.is_none() && !args.dump {
        return Err(Error::Usage(
            "Please specify a path to a database file, or use --dump to see the output"
                .to_string(),
        ));
    }
    let options = ExportOptions {
        mode: SyncMode::from_flags(args.sync, args.sync_delete_missing)?,
        folder_filter: args.folder.clone(),
        stop_after: args.stop_after,
    };
    options.validate()?;

    // JSON consumers parse stderr on failure
    let progress = Progress::stderr(args.quiet || json);

    if args.dump {
        let source = AppleNotes::from_env(args.notestore.as_deref())?;
        let mut out = std::io::stdout().lock();
        dump_notes(
            &source,
            options.folder_filter.as_deref(),
            options.stop_after,
            &mut out,
            &progress,
        )?;
        return Ok(());
    }

    let Some(db_path) = args.db_path.as_deref() else {
        return Err(Error::Other("database path missing".to_string()));
    };
    let mut db = NotesDb::open(db_path)?;

    if args.schema {
        return print_schema(db_path, json, args.quiet);
    }

    let source = AppleNotes::from_env(args.notestore.as_deref())?;
    let report = export(&mut db, &source, options, progress)?;
    print_report(db_path, &report, json, args.quiet)
}

fn print_schema(db_path: &Path, json: bool, quiet: bool) -> Result<()> {
    if json {
        let output = serde_json::json!({
            "success": true,
            "database": db_path.display().to_string(),
            "schema": true,
        });
        println!("{}", serde_json::to_string(&output)?);
    } else if !quiet {
        println!("{} Schema ready in {}", "✓".green(), db_path.display());
    }
    Ok(())
}

fn print_report(db_path: &Path, report: &ExportReport, json: bool, quiet: bool) -> Result<()> {
    if json {
        let output = serde_json::json!({
            "success": true,
            "database": db_path.display().to_string(),
            "report": report,
        });
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }
    if quiet {
        return Ok(());
    }

    println!(
        "{} Exported notes to {} {}",
        "✓".green(),
        db_path.display(),
        format!("({})", report.mode).dimmed()
    );
    if let Some(folder) = &report.folder {
        println!("  Folder:   {folder}");
    }
    println!("  Folders:  {}", report.folders);
    println!("  Written:  {}", report.written);
    if report.mode.is_sync() {
        println!("  Skipped:  {}", report.skipped);
    }
    if report.mode.deletes_missing() {
        println!("  Deleted:  {}", report.deleted);
    }
    if let Some(watermark) = &report.watermark {
        println!("  Synced up to {}", watermark.cyan());
    }
    Ok(())
}
