//! CLI definitions using clap.

use clap::Parser;
use std::path::PathBuf;

pub mod commands;

/// Export Apple Notes to SQLite
///
/// Populates DB_PATH with 'notes' and 'folders' tables containing your
/// notes, for example `apple-notes-to-sqlite notes.db`.
#[derive(Parser, Debug)]
#[command(name = "apple-notes-to-sqlite", author, version, about)]
pub struct Cli {
    /// SQLite database file to write (not needed with --dump)
    pub db_path: Option<PathBuf>,

    /// Stop after this many notes
    #[arg(long, value_name = "N", value_parser = parse_stop_after)]
    pub stop_after: Option<usize>,

    /// Output notes to standard output as JSON lines
    #[arg(long)]
    pub dump: bool,

    /// Create database schema and exit
    #[arg(long)]
    pub schema: bool,

    /// Only update notes whose 'updated' timestamp has changed
    #[arg(long)]
    pub sync: bool,

    /// With --sync, delete notes missing from this run (scoped by --folder)
    #[arg(long)]
    pub sync_delete_missing: bool,

    /// Only export notes from this folder (by path, name, or long_id)
    #[arg(long = "folder", value_name = "REF")]
    pub folder: Option<String>,

    /// NoteStore.sqlite to read folders from
    #[arg(long, value_name = "PATH", env = "APPLE_NOTES_TO_SQLITE_NOTESTORE")]
    pub notestore: Option<PathBuf>,

    /// Output the summary and errors as JSON
    #[arg(long)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

fn parse_stop_after(value: &str) -> std::result::Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from([
            "apple-notes-to-sqlite",
            "notes.db",
            "--sync",
            "--folder",
            "Work/Projects",
            "--stop-after",
            "5",
        ])
        .unwrap();
        assert_eq!(cli.db_path, Some(PathBuf::from("notes.db")));
        assert!(cli.sync);
        assert_eq!(cli.folder.as_deref(), Some("Work/Projects"));
        assert_eq!(cli.stop_after, Some(5));
    }

    #[test]
    fn test_stop_after_must_be_positive() {
        assert!(Cli::try_parse_from(["apple-notes-to-sqlite", "--dump", "--stop-after", "0"]).is_err());
        assert!(Cli::try_parse_from(["apple-notes-to-sqlite", "--dump", "--stop-after", "x"]).is_err());
    }
}
