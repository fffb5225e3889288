use bindery_core::db::open_db_in_memory;
use bindery_core::{NotebookRepository, NoteRepository, RepoError, SqliteNoteRepository, SqliteNotebookRepository};
use rusqlite::params;
use uuid::Uuid;

#[test]
fn create_and_get_roundtrip() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteNotebookRepository::new(&mut conn);

    let created = repo.create_notebook("Groceries").unwrap();
    assert!(created.created_at > 0);

    let loaded = repo.get_notebook(created.uuid).unwrap().unwrap();
    assert_eq!(loaded, created);
}

#[test]
fn get_missing_notebook_returns_none() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteNotebookRepository::new(&mut conn);
    assert!(repo.get_notebook(Uuid::new_v4()).unwrap().is_none());
}

#[test]
fn list_is_newest_first_with_insertion_order_tiebreak() {
    let mut conn = open_db_in_memory().unwrap();

    let (first, second, third) = {
        let mut repo = SqliteNotebookRepository::new(&mut conn);
        let first = repo.create_notebook("first").unwrap();
        let second = repo.create_notebook("second").unwrap();
        let third = repo.create_notebook("third").unwrap();
        (first, second, third)
    };

    // Force distinct creation times regardless of clock resolution.
    for (notebook, created_at) in [(&first, 1000_i64), (&second, 2000), (&third, 1500)] {
        conn.execute(
            "UPDATE notebooks SET created_at = ?2 WHERE uuid = ?1;",
            params![notebook.uuid.to_string(), created_at],
        )
        .unwrap();
    }

    let mut repo = SqliteNotebookRepository::new(&mut conn);
    let listed = repo.list_notebooks().unwrap();
    let ids: Vec<_> = listed.iter().map(|notebook| notebook.uuid).collect();
    assert_eq!(ids, vec![second.uuid, third.uuid, first.uuid]);
}

#[test]
fn rename_replaces_display_name() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteNotebookRepository::new(&mut conn);

    let created = repo.create_notebook("drafts").unwrap();
    repo.rename_notebook(created.uuid, "Drafts 2026").unwrap();

    let loaded = repo.get_notebook(created.uuid).unwrap().unwrap();
    assert_eq!(loaded.name, "Drafts 2026");
}

#[test]
fn rename_missing_notebook_is_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteNotebookRepository::new(&mut conn);
    let missing = Uuid::new_v4();

    match repo.rename_notebook(missing, "anything") {
        Err(RepoError::NotFound(id)) => assert_eq!(id, missing),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[test]
fn delete_cascades_to_notes_and_reports_them() {
    let mut conn = open_db_in_memory().unwrap();

    let notebook = SqliteNotebookRepository::new(&mut conn)
        .create_notebook("Trips")
        .unwrap();
    let (note_a, note_b) = {
        let repo = SqliteNoteRepository::new(&conn);
        let a = repo.create_note(notebook.uuid, "pack bags").unwrap();
        let b = repo.create_note(notebook.uuid, "book hotel").unwrap();
        (a, b)
    };

    let cascaded = SqliteNotebookRepository::new(&mut conn)
        .delete_notebook(notebook.uuid)
        .unwrap();
    assert_eq!(cascaded, vec![note_a.uuid, note_b.uuid]);

    let remaining: i64 = conn
        .query_row("SELECT COUNT(*) FROM notes;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(remaining, 0);
}

#[test]
fn delete_missing_notebook_is_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteNotebookRepository::new(&mut conn);

    match repo.delete_notebook(Uuid::new_v4()) {
        Err(RepoError::NotFound(_)) => {}
        other => panic!("expected NotFound, got {other:?}"),
    }
}
