//! Core domain logic for Bindery.
//! This crate is the single source of truth for business invariants.

pub mod db;
pub mod gateway;
pub mod live;
pub mod logging;
pub mod model;
pub mod repo;

pub use gateway::{ChangeHub, ChangeOp, CommitEvent, EntityChange, ExecContext, Gateway};
pub use live::{
    AllNotebooks, BatchDiff, ListAdapter, ListObserver, LiveQuery, LiveRow, NotesOfNotebook,
    RenderFn, RowChange, RowIndex, Section, SectionChange, SectionInfo, Snapshot,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::note::{Note, NoteId};
pub use model::notebook::{Notebook, NotebookId};
pub use model::EntityKind;
pub use repo::note_repo::{NoteRepository, SqliteNoteRepository};
pub use repo::notebook_repo::{NotebookRepository, SqliteNotebookRepository};
pub use repo::{RepoError, RepoResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
