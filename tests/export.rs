//! Export engine tests against an in-memory note source.

use std::cell::RefCell;

use notes_to_sqlite::error::{Error, Result};
use notes_to_sqlite::model::{Folder, Note};
use notes_to_sqlite::source::{NoteSource, NoteStream};
use notes_to_sqlite::storage::{FolderRow, NotesDb};
use notes_to_sqlite::sync::{
    export, ExportOptions, ExportReport, Exporter, Progress, SyncMode, SyncState,
};

/// Arguments of one `list_notes` call.
type NotesCall = (Option<Vec<String>>, Option<String>);

#[derive(Default)]
struct FakeNotes {
    folders: Vec<Folder>,
    notes: Vec<Note>,
    fast_count: Option<usize>,
    calls: RefCell<Vec<NotesCall>>,
}

impl FakeNotes {
    fn new(folders: Vec<Folder>, notes: Vec<Note>) -> Self {
        Self {
            folders,
            notes,
            ..Self::default()
        }
    }

    fn last_since(&self) -> Option<String> {
        self.calls.borrow().last().and_then(|(_, since)| since.clone())
    }
}

impl NoteSource for FakeNotes {
    fn count_notes(&self) -> Result<usize> {
        Ok(self.notes.len())
    }

    fn count_notes_in_folders(&self, _folder_keys: &[i64]) -> Result<Option<usize>> {
        Ok(self.fast_count)
    }

    fn list_folders(&self) -> Result<Vec<Folder>> {
        Ok(self.folders.clone())
    }

    fn list_notes(&self, scope: Option<&[String]>, since: Option<&str>) -> Result<NoteStream<'_>> {
        self.calls
            .borrow_mut()
            .push((scope.map(<[String]>::to_vec), since.map(String::from)));

        let scope = scope.map(<[String]>::to_vec);
        let since = since.map(String::from);
        Ok(Box::new(
            self.notes
                .iter()
                .filter(move |n| {
                    scope
                        .as_ref()
                        .is_none_or(|ids| n.folder.as_ref().is_some_and(|f| ids.contains(f)))
                })
                .filter(move |n| since.as_deref().is_none_or(|s| n.updated.as_str() > s))
                .cloned()
                .map(Ok),
        ))
    }
}

fn note(id: &str, folder: &str, updated: &str) -> Note {
    Note {
        id: id.to_string(),
        created: "2023-03-08T16:36:41".to_string(),
        updated: updated.to_string(),
        folder: Some(folder.to_string()),
        title: format!("Title {id}"),
        body: format!("This is the content of {id}"),
    }
}

/// The two-folder, two-note fixture.
fn fixture() -> FakeNotes {
    FakeNotes::new(
        vec![
            Folder::new("folder-1", Some("Folder 1"), None),
            Folder::new("folder-2", Some("Folder 2"), Some("folder-1")),
        ],
        vec![
            note("note-1", "folder-1", "2023-03-08T15:36:41"),
            note("note-2", "folder-2", "2023-03-08T15:36:41"),
        ],
    )
}

/// Root with `work` (holding `projects`) and `home` subtrees.
fn tree() -> Vec<Folder> {
    vec![
        Folder::new("root", Some("iCloud"), None),
        Folder::new("work", Some("Work"), Some("root")),
        Folder::new("projects", Some("Projects"), Some("work")),
        Folder::new("home", Some("Home"), Some("root")),
    ]
}

fn options(mode: SyncMode, folder: Option<&str>, stop_after: Option<usize>) -> ExportOptions {
    ExportOptions {
        mode,
        folder_filter: folder.map(String::from),
        stop_after,
    }
}

fn run(db: &mut NotesDb, source: &FakeNotes, options: ExportOptions) -> ExportReport {
    export(db, source, options, Progress::hidden()).unwrap()
}

fn note_ids(db: &NotesDb) -> Vec<String> {
    db.note_rows().unwrap().into_iter().map(|n| n.id).collect()
}

#[test]
fn test_end_to_end_fixture() {
    let mut db = NotesDb::open_memory().unwrap();
    let source = fixture();

    let report = run(&mut db, &source, options(SyncMode::ChangesOnly, None, None));

    assert_eq!(
        db.folder_rows().unwrap(),
        vec![
            FolderRow {
                id: 1,
                long_id: "folder-1".to_string(),
                name: Some("Folder 1".to_string()),
                parent: None,
            },
            FolderRow {
                id: 2,
                long_id: "folder-2".to_string(),
                name: Some("Folder 2".to_string()),
                parent: Some(1),
            },
        ]
    );

    let notes = db.note_rows().unwrap();
    assert_eq!(notes.len(), 2);
    assert_eq!(notes[0].folder, Some(1));
    assert_eq!(notes[1].folder, Some(2));
    assert_eq!(notes[0].body.as_deref(), Some("This is the content of note-1"));

    assert_eq!(report.written, 2);
    assert_eq!(report.expected, Some(2));
    assert_eq!(report.watermark.as_deref(), Some("2023-03-08T15:36:41"));
    assert_eq!(db.last_sync().unwrap().as_deref(), Some("2023-03-08T15:36:41"));
}

#[test]
fn test_full_replace_leaves_no_sync_state() {
    let mut db = NotesDb::open_memory().unwrap();
    let report = run(&mut db, &fixture(), ExportOptions::default());

    assert_eq!(report.written, 2);
    assert_eq!(report.watermark, None);
    assert_eq!(db.table_names().unwrap(), vec!["folders", "notes"]);
}

#[test]
fn test_reruns_are_idempotent() {
    let mut db = NotesDb::open_memory().unwrap();
    let source = fixture();

    run(&mut db, &source, ExportOptions::default());
    let folders = db.folder_rows().unwrap();
    let notes = db.note_rows().unwrap();

    run(&mut db, &source, ExportOptions::default());
    assert_eq!(db.folder_rows().unwrap(), folders);
    assert_eq!(db.note_rows().unwrap(), notes);

    // Nothing changed, so nothing is written and no watermark is stored
    for _ in 0..2 {
        let report = run(&mut db, &source, options(SyncMode::ChangesOnly, None, None));
        assert_eq!((report.written, report.skipped), (0, 2));
        assert_eq!(report.watermark, None);
    }
    assert_eq!(db.note_rows().unwrap(), notes);
}

#[test]
fn test_sync_passes_watermark_as_hint() {
    let mut db = NotesDb::open_memory().unwrap();
    let mut source = fixture();

    run(&mut db, &source, options(SyncMode::ChangesOnly, None, None));
    assert_eq!(source.last_since(), None);

    source.notes.push(note("note-3", "folder-1", "2023-04-01T09:00:00"));
    let report = run(&mut db, &source, options(SyncMode::ChangesOnly, None, None));

    assert_eq!(source.last_since().as_deref(), Some("2023-03-08T15:36:41"));
    assert_eq!(report.written, 1);
    assert_eq!(db.last_sync().unwrap().as_deref(), Some("2023-04-01T09:00:00"));

    // Delete-aware runs always scan everything
    run(
        &mut db,
        &source,
        options(SyncMode::ChangesDeleteMissing, None, None),
    );
    assert_eq!(source.last_since(), None);
}

#[test]
fn test_run_threads_sync_state() {
    let mut db = NotesDb::open_memory().unwrap();
    let source = fixture();

    let outcome = Exporter::new(&mut db, &source, options(SyncMode::ChangesOnly, None, None))
        .run(&SyncState {
            last_sync: Some("2023-01-01T00:00:00".to_string()),
        })
        .unwrap();

    assert_eq!(source.last_since().as_deref(), Some("2023-01-01T00:00:00"));
    assert_eq!(
        outcome.state.last_sync.as_deref(),
        Some("2023-03-08T15:36:41")
    );
}

#[test]
fn test_changed_note_is_rewritten() {
    let mut db = NotesDb::open_memory().unwrap();
    let mut source = fixture();
    run(&mut db, &source, options(SyncMode::ChangesOnly, None, None));

    source.notes[1].updated = "2023-05-01T12:00:00".to_string();
    source.notes[1].body = "edited".to_string();
    let report = run(&mut db, &source, options(SyncMode::ChangesOnly, None, None));

    assert_eq!(report.written, 1);
    let notes = db.note_rows().unwrap();
    assert_eq!(notes[1].body.as_deref(), Some("edited"));
}

#[test]
fn test_delete_missing_is_scoped_to_subtree() {
    let mut db = NotesDb::open_memory().unwrap();
    let mut source = FakeNotes::new(
        tree(),
        vec![
            note("w1", "work", "t1"),
            note("p1", "projects", "t1"),
            note("h1", "home", "t1"),
            note("r1", "root", "t1"),
        ],
    );
    run(&mut db, &source, ExportOptions::default());
    assert_eq!(note_ids(&db).len(), 4);

    // p1 and h1 vanish from Notes
    source.notes.retain(|n| n.id == "w1" || n.id == "r1");
    let report = run(
        &mut db,
        &source,
        options(SyncMode::ChangesDeleteMissing, Some("Work"), None),
    );

    assert_eq!(report.deleted, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.filtered, 1);
    assert_eq!(note_ids(&db), vec!["h1", "r1", "w1"]);
}

#[test]
fn test_delete_missing_unscoped_is_global() {
    let mut db = NotesDb::open_memory().unwrap();
    let mut source = fixture();
    run(&mut db, &source, ExportOptions::default());

    source.notes.truncate(1);
    let report = run(
        &mut db,
        &source,
        options(SyncMode::ChangesDeleteMissing, None, None),
    );

    assert_eq!(report.deleted, 1);
    assert_eq!(note_ids(&db), vec!["note-1"]);
}

#[test]
fn test_folder_filter_limits_rows() {
    let mut db = NotesDb::open_memory().unwrap();
    let source = FakeNotes::new(
        tree(),
        vec![
            note("w1", "work", "t1"),
            note("p1", "projects", "t1"),
            note("h1", "home", "t1"),
        ],
    );

    let report = run(
        &mut db,
        &source,
        options(SyncMode::FullReplace, Some("iCloud/Work"), None),
    );

    let folders: Vec<String> = db
        .folder_rows()
        .unwrap()
        .into_iter()
        .map(|f| f.long_id)
        .collect();
    assert_eq!(folders, vec!["root", "work", "projects"]);
    assert_eq!(note_ids(&db), vec!["p1", "w1"]);
    assert_eq!(report.folder.as_deref(), Some("work"));
    assert_eq!(report.filtered, 1);
    // No NoteStore keys: extraction is unscoped
    assert_eq!(source.calls.borrow()[0].0, None);
}

#[test]
fn test_scoped_extraction_uses_source_keys() {
    let mut db = NotesDb::open_memory().unwrap();
    let folders: Vec<Folder> = tree()
        .into_iter()
        .enumerate()
        .map(|(i, f)| f.with_source_pk(i64::try_from(i).unwrap() + 1))
        .collect();
    let mut source = FakeNotes::new(
        folders,
        vec![note("w1", "work", "t1"), note("h1", "home", "t1")],
    );
    source.fast_count = Some(7);

    let report = run(
        &mut db,
        &source,
        options(SyncMode::FullReplace, Some("Work"), None),
    );

    let calls = source.calls.borrow();
    assert_eq!(
        calls[0].0,
        Some(vec!["work".to_string(), "projects".to_string()])
    );
    assert_eq!(report.expected, Some(7));
    assert_eq!(note_ids(&db), vec!["w1"]);
}

#[test]
fn test_stop_after_caps_and_skips_watermark() {
    let mut db = NotesDb::open_memory().unwrap();
    let report = run(
        &mut db,
        &fixture(),
        options(SyncMode::ChangesOnly, None, Some(1)),
    );

    assert_eq!(report.written, 1);
    assert_eq!(report.expected, Some(1));
    assert_eq!(report.watermark, None);
    assert_eq!(db.last_sync().unwrap(), None);
    assert_eq!(note_ids(&db), vec!["note-1"]);
}

#[test]
fn test_unresolved_folder_writes_nothing() {
    let mut db = NotesDb::open_memory().unwrap();
    let err = export(
        &mut db,
        &fixture(),
        options(SyncMode::ChangesOnly, Some("Missing"), None),
        Progress::hidden(),
    )
    .unwrap_err();

    assert!(matches!(err, Error::FolderNotFound { .. }));
    assert_eq!(err.exit_code(), 3);
    assert!(db.folder_rows().unwrap().is_empty());
    assert_eq!(db.table_names().unwrap(), vec!["folders", "notes"]);
}

#[test]
fn test_ambiguous_folder_name() {
    let mut db = NotesDb::open_memory().unwrap();
    let mut folders = tree();
    folders.push(Folder::new("home-projects", Some("Projects"), Some("home")));
    let source = FakeNotes::new(folders, Vec::new());

    let err = export(
        &mut db,
        &source,
        options(SyncMode::FullReplace, Some("Projects"), None),
        Progress::hidden(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::AmbiguousFolder { .. }));

    let report = run(
        &mut db,
        &source,
        options(SyncMode::FullReplace, Some("Home/Projects"), None),
    );
    assert_eq!(report.folder.as_deref(), Some("home-projects"));
}
