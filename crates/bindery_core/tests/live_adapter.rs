use bindery_core::{
    AllNotebooks, ChangeOp, CommitEvent, EntityKind, Gateway, ListAdapter, ListObserver, Notebook,
    NotebookRepository, NoteRepository, NotesOfNotebook, RowChange, RowIndex, SectionChange,
    SqliteNoteRepository, SqliteNotebookRepository,
};
use rusqlite::params;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
enum ViewOp {
    BatchBegin,
    Section(SectionChange),
    Row(RowChange),
    BatchEnd,
}

/// Records every callback so tests can assert exact batch contents.
#[derive(Clone, Default)]
struct RecordingObserver {
    ops: Arc<Mutex<Vec<ViewOp>>>,
}

impl RecordingObserver {
    fn take(&self) -> Vec<ViewOp> {
        std::mem::take(&mut *self.ops.lock().unwrap())
    }
}

impl ListObserver for RecordingObserver {
    fn on_batch_begin(&mut self) {
        self.ops.lock().unwrap().push(ViewOp::BatchBegin);
    }

    fn on_section_change(&mut self, change: SectionChange) {
        self.ops.lock().unwrap().push(ViewOp::Section(change));
    }

    fn on_row_change(&mut self, change: RowChange) {
        self.ops.lock().unwrap().push(ViewOp::Row(change));
    }

    fn on_batch_end(&mut self) {
        self.ops.lock().unwrap().push(ViewOp::BatchEnd);
    }
}

fn open_gateway(prefix: &str) -> Gateway {
    Gateway::open_in_memory(&format!("{prefix}_{}", Uuid::new_v4().simple()), || {})
}

fn seed_notebook(gateway: &Gateway, name: &'static str) -> Notebook {
    gateway
        .read_context()
        .call(move |conn| SqliteNotebookRepository::new(conn).create_notebook(name))
        .unwrap()
}

type NotesAdapter = ListAdapter<NotesOfNotebook, Vec<String>>;

fn bind_notes(
    gateway: &Gateway,
    notebook: &Notebook,
    cache_name: &str,
    observer: &RecordingObserver,
) -> NotesAdapter {
    ListAdapter::bind(
        gateway,
        NotesOfNotebook {
            notebook: notebook.uuid,
        },
        cache_name,
        Box::new(observer.clone()),
        Box::new(|lines, note| lines.push(note.body.clone())),
    )
}

fn bodies(adapter: &NotesAdapter) -> Vec<String> {
    (0..adapter.row_count(0))
        .map(|row| adapter.row_at(RowIndex::new(0, row)).unwrap().body)
        .collect()
}

#[test]
fn bind_on_empty_notebook_presents_one_empty_section() {
    let gateway = open_gateway("empty_bind");
    let notebook = seed_notebook(&gateway, "Groceries");
    let observer = RecordingObserver::default();
    let adapter = bind_notes(&gateway, &notebook, "groceries notes", &observer);

    assert!(adapter.is_observing());
    assert_eq!(adapter.section_count(), 1);
    assert_eq!(adapter.row_count(0), 0);
    assert_eq!(adapter.section_info(0).unwrap().row_count, 0);
    assert!(observer.take().is_empty());
}

#[test]
fn awaited_add_is_visible_when_the_call_returns() {
    let gateway = open_gateway("awaited_add");
    let notebook = seed_notebook(&gateway, "Groceries");
    let observer = RecordingObserver::default();
    let adapter = bind_notes(&gateway, &notebook, "groceries notes", &observer);

    adapter.add("milk".to_string()).unwrap();

    // No flush: add waits for both commit and change batch.
    assert_eq!(adapter.row_count(0), 1);
    assert_eq!(
        observer.take(),
        vec![
            ViewOp::BatchBegin,
            ViewOp::Row(RowChange::Insert {
                new: RowIndex::new(0, 0),
            }),
            ViewOp::BatchEnd,
        ]
    );
}

#[test]
fn groceries_scenario_newest_first_then_single_delete() {
    let gateway = open_gateway("groceries");
    let notebook = seed_notebook(&gateway, "Groceries");
    let observer = RecordingObserver::default();
    let adapter = bind_notes(&gateway, &notebook, "groceries notes", &observer);

    adapter.add("milk".to_string()).unwrap();
    adapter.add("eggs".to_string()).unwrap();
    adapter.add("bread".to_string()).unwrap();

    assert_eq!(bodies(&adapter), vec!["bread", "eggs", "milk"]);

    observer.take();
    adapter.delete(RowIndex::new(0, 0));
    gateway.read_context().flush();

    assert_eq!(bodies(&adapter), vec!["eggs", "milk"]);
    assert_eq!(
        observer.take(),
        vec![
            ViewOp::BatchBegin,
            ViewOp::Row(RowChange::Delete {
                old: RowIndex::new(0, 0),
            }),
            ViewOp::BatchEnd,
        ]
    );
}

#[test]
fn sort_order_change_is_exactly_one_move() {
    let gateway = open_gateway("move");
    let notebook = seed_notebook(&gateway, "Groceries");
    let observer = RecordingObserver::default();
    let adapter = bind_notes(&gateway, &notebook, "groceries notes", &observer);

    adapter.add("oldest".to_string()).unwrap();
    adapter.add("middle".to_string()).unwrap();
    adapter.add("newest".to_string()).unwrap();

    let bottom_id = adapter.row_at(RowIndex::new(0, 2)).unwrap().uuid;
    gateway
        .read_context()
        .call(move |conn| {
            conn.execute(
                "UPDATE notes SET created_at = created_at + 1000000 WHERE uuid = ?1;",
                params![bottom_id.to_string()],
            )
        })
        .unwrap();

    observer.take();
    gateway.hub().publish(CommitEvent::single(
        EntityKind::Note,
        bottom_id,
        ChangeOp::Updated,
    ));
    gateway.read_context().flush();

    assert_eq!(
        observer.take(),
        vec![
            ViewOp::BatchBegin,
            ViewOp::Row(RowChange::Move {
                old: RowIndex::new(0, 2),
                new: RowIndex::new(0, 0),
            }),
            ViewOp::BatchEnd,
        ]
    );
    assert_eq!(bodies(&adapter), vec!["oldest", "newest", "middle"]);
}

#[test]
fn deleting_the_only_note_keeps_the_section() {
    let gateway = open_gateway("last_note");
    let notebook = seed_notebook(&gateway, "Groceries");
    let observer = RecordingObserver::default();
    let adapter = bind_notes(&gateway, &notebook, "groceries notes", &observer);

    adapter.add("only".to_string()).unwrap();
    adapter.delete(RowIndex::new(0, 0));
    gateway.read_context().flush();

    assert_eq!(adapter.section_count(), 1);
    assert_eq!(adapter.row_count(0), 0);
    assert_eq!(adapter.section_info(0).unwrap().row_count, 0);
}

#[test]
fn rebind_after_release_reproduces_the_result_set() {
    let gateway = open_gateway("rebind");
    let notebook = seed_notebook(&gateway, "Groceries");
    let observer = RecordingObserver::default();
    let adapter = bind_notes(&gateway, &notebook, "groceries notes", &observer);

    adapter.add("milk".to_string()).unwrap();
    adapter.add("eggs".to_string()).unwrap();
    let before = bodies(&adapter);

    adapter.release();
    assert!(!adapter.is_observing());
    assert_eq!(adapter.section_count(), 0);
    assert_eq!(adapter.row_count(0), 0);
    assert_eq!(adapter.row_at(RowIndex::new(0, 0)), None);

    adapter.rebind();
    assert!(adapter.is_observing());
    assert_eq!(bodies(&adapter), before);
}

#[test]
fn released_adapter_ignores_store_commits() {
    let gateway = open_gateway("released");
    let notebook = seed_notebook(&gateway, "Groceries");
    let observer = RecordingObserver::default();
    let adapter = bind_notes(&gateway, &notebook, "groceries notes", &observer);

    adapter.add("kept".to_string()).unwrap();
    adapter.release();
    observer.take();

    let notebook_id = notebook.uuid;
    let late = gateway
        .read_context()
        .call(move |conn| SqliteNoteRepository::new(conn).create_note(notebook_id, "late"))
        .unwrap();
    gateway.hub().publish(CommitEvent::single(
        EntityKind::Note,
        late.uuid,
        ChangeOp::Inserted,
    ));
    gateway.read_context().flush();

    assert_eq!(adapter.row_count(0), 0);
    assert!(observer.take().is_empty());

    adapter.rebind();
    assert_eq!(adapter.row_count(0), 2);
}

#[test]
fn notebook_delete_cascades_into_the_observed_note_list() {
    let gateway = open_gateway("cascade");
    let notebooks_observer = RecordingObserver::default();
    let notebooks: ListAdapter<AllNotebooks, Vec<String>> = ListAdapter::bind(
        &gateway,
        AllNotebooks,
        "all notebooks",
        Box::new(notebooks_observer.clone()),
        Box::new(|lines, notebook| lines.push(notebook.name.clone())),
    );

    notebooks.add("Trips".to_string()).unwrap();
    let notebook = notebooks.row_at(RowIndex::new(0, 0)).unwrap();

    let notes_observer = RecordingObserver::default();
    let notes = bind_notes(&gateway, &notebook, "trip notes", &notes_observer);
    notes.add("pack bags".to_string()).unwrap();
    notes.add("book hotel".to_string()).unwrap();
    notes_observer.take();

    notebooks.delete(RowIndex::new(0, 0));
    gateway.read_context().flush();

    assert_eq!(notebooks.row_count(0), 0);
    assert_eq!(notes.row_count(0), 0);
    assert_eq!(
        notes_observer.take(),
        vec![
            ViewOp::BatchBegin,
            ViewOp::Row(RowChange::Delete {
                old: RowIndex::new(0, 0),
            }),
            ViewOp::Row(RowChange::Delete {
                old: RowIndex::new(0, 1),
            }),
            ViewOp::BatchEnd,
        ]
    );
}

#[test]
fn binding_under_a_live_cache_name_replaces_the_prior_subscription() {
    let gateway = open_gateway("replace");
    let notebook = seed_notebook(&gateway, "Groceries");

    let first_observer = RecordingObserver::default();
    let first = bind_notes(&gateway, &notebook, "shared name", &first_observer);
    let second_observer = RecordingObserver::default();
    let second = bind_notes(&gateway, &notebook, "shared name", &second_observer);

    second.add("seen by second".to_string()).unwrap();

    assert_eq!(second.row_count(0), 1);
    assert!(!second_observer.take().is_empty());
    // The first adapter's subscription was cancelled; its result set is
    // frozen at bind time.
    assert_eq!(first.row_count(0), 0);
    assert!(first_observer.take().is_empty());
}

#[test]
fn render_into_applies_the_callback_for_resolvable_rows() {
    let gateway = open_gateway("render");
    let notebook = seed_notebook(&gateway, "Groceries");
    let observer = RecordingObserver::default();
    let adapter = bind_notes(&gateway, &notebook, "groceries notes", &observer);

    adapter.add("milk".to_string()).unwrap();

    let mut cell = Vec::new();
    assert!(adapter.render_into(RowIndex::new(0, 0), &mut cell));
    assert_eq!(cell, vec!["milk".to_string()]);
    assert!(!adapter.render_into(RowIndex::new(0, 7), &mut cell));
    assert_eq!(cell.len(), 1);
}
