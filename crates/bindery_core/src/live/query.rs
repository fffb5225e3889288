//! Live query descriptors.
//!
//! # Responsibility
//! - Describe what a live list shows: entity kind, filter, fixed sort order.
//! - Route the list's mutations to the repository layer and describe each
//!   commit for the notification hub.
//!
//! # Invariants
//! - A descriptor is immutable once bound to an adapter.
//! - `fetch` ordering is always creation-time descending.

use crate::gateway::hub::{ChangeOp, CommitEvent};
use crate::model::note::Note;
use crate::model::notebook::{Notebook, NotebookId};
use crate::model::EntityKind;
use crate::repo::note_repo::{NoteRepository, SqliteNoteRepository};
use crate::repo::notebook_repo::{NotebookRepository, SqliteNotebookRepository};
use crate::repo::RepoResult;
use rusqlite::Connection;
use uuid::Uuid;

/// A row a live query can present.
pub trait LiveRow: Clone + PartialEq + Send + Sync + 'static {
    /// Stable identity used to pair rows across result-set generations.
    fn row_id(&self) -> Uuid;
}

impl LiveRow for Note {
    fn row_id(&self) -> Uuid {
        self.uuid
    }
}

impl LiveRow for Notebook {
    fn row_id(&self) -> Uuid {
        self.uuid
    }
}

/// One live query over the store: filter, sort order, mutation routing.
pub trait LiveQuery: Send + Sync + 'static {
    /// Row type the query produces.
    type Row: LiveRow;
    /// Payload accepted by `insert` and `update`.
    type Payload: Send + 'static;

    /// Entity kind whose commits can affect this query's result set.
    fn entity(&self) -> EntityKind;

    /// Executes the query, newest rows first.
    fn fetch(&self, conn: &mut Connection) -> RepoResult<Vec<Self::Row>>;

    /// Re-resolves one row by identity, honoring the query's filter.
    ///
    /// Used when an identifier is handed across an affinity boundary; the
    /// live object never crosses, only its id.
    fn resolve(&self, conn: &mut Connection, id: Uuid) -> RepoResult<Option<Self::Row>>;

    /// Creates a matching entity and describes the commit.
    fn insert(&self, conn: &mut Connection, payload: &Self::Payload) -> RepoResult<CommitEvent>;

    /// Replaces one entity's payload and describes the commit.
    fn update(
        &self,
        conn: &mut Connection,
        id: Uuid,
        payload: &Self::Payload,
    ) -> RepoResult<CommitEvent>;

    /// Deletes one entity and describes the commit, cascades included.
    fn delete(&self, conn: &mut Connection, id: Uuid) -> RepoResult<CommitEvent>;

    /// Section grouping key for a row; `None` keeps the whole result set in
    /// one unnamed section.
    fn section_key(&self, _row: &Self::Row) -> Option<String> {
        None
    }
}

/// The notes of one notebook, newest first.
#[derive(Debug, Clone, Copy)]
pub struct NotesOfNotebook {
    pub notebook: NotebookId,
}

impl LiveQuery for NotesOfNotebook {
    type Row = Note;
    type Payload = String;

    fn entity(&self) -> EntityKind {
        EntityKind::Note
    }

    fn fetch(&self, conn: &mut Connection) -> RepoResult<Vec<Note>> {
        SqliteNoteRepository::new(conn).list_notes(self.notebook)
    }

    fn resolve(&self, conn: &mut Connection, id: Uuid) -> RepoResult<Option<Note>> {
        let note = SqliteNoteRepository::new(conn).get_note(id)?;
        Ok(note.filter(|note| note.notebook_uuid == self.notebook))
    }

    fn insert(&self, conn: &mut Connection, payload: &String) -> RepoResult<CommitEvent> {
        let note = SqliteNoteRepository::new(conn).create_note(self.notebook, payload)?;
        Ok(CommitEvent::single(
            EntityKind::Note,
            note.uuid,
            ChangeOp::Inserted,
        ))
    }

    fn update(&self, conn: &mut Connection, id: Uuid, payload: &String) -> RepoResult<CommitEvent> {
        SqliteNoteRepository::new(conn).update_note_body(id, payload)?;
        Ok(CommitEvent::single(EntityKind::Note, id, ChangeOp::Updated))
    }

    fn delete(&self, conn: &mut Connection, id: Uuid) -> RepoResult<CommitEvent> {
        SqliteNoteRepository::new(conn).delete_note(id)?;
        Ok(CommitEvent::single(EntityKind::Note, id, ChangeOp::Deleted))
    }
}

/// Every notebook in the store, newest first.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllNotebooks;

impl LiveQuery for AllNotebooks {
    type Row = Notebook;
    type Payload = String;

    fn entity(&self) -> EntityKind {
        EntityKind::Notebook
    }

    fn fetch(&self, conn: &mut Connection) -> RepoResult<Vec<Notebook>> {
        SqliteNotebookRepository::new(conn).list_notebooks()
    }

    fn resolve(&self, conn: &mut Connection, id: Uuid) -> RepoResult<Option<Notebook>> {
        SqliteNotebookRepository::new(conn).get_notebook(id)
    }

    fn insert(&self, conn: &mut Connection, payload: &String) -> RepoResult<CommitEvent> {
        let notebook = SqliteNotebookRepository::new(conn).create_notebook(payload)?;
        Ok(CommitEvent::single(
            EntityKind::Notebook,
            notebook.uuid,
            ChangeOp::Inserted,
        ))
    }

    fn update(&self, conn: &mut Connection, id: Uuid, payload: &String) -> RepoResult<CommitEvent> {
        SqliteNotebookRepository::new(conn).rename_notebook(id, payload)?;
        Ok(CommitEvent::single(
            EntityKind::Notebook,
            id,
            ChangeOp::Updated,
        ))
    }

    fn delete(&self, conn: &mut Connection, id: Uuid) -> RepoResult<CommitEvent> {
        let cascaded = SqliteNotebookRepository::new(conn).delete_notebook(id)?;
        let mut event = CommitEvent::single(EntityKind::Notebook, id, ChangeOp::Deleted);
        for note_id in cascaded {
            event.push(EntityKind::Note, note_id, ChangeOp::Deleted);
        }
        Ok(event)
    }
}
