//! Note domain model.
//!
//! # Invariants
//! - Every note belongs to exactly one notebook; the note never owns the
//!   notebook.
//! - `preview_text` is a derived projection of `body`, recomputed on every
//!   body change and never edited directly.

use crate::model::notebook::NotebookId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a note.
pub type NoteId = Uuid;

/// A single text note owned by one notebook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Stable global ID.
    pub uuid: NoteId,
    /// Owning notebook back-reference.
    pub notebook_uuid: NotebookId,
    /// Raw markdown body text.
    pub body: String,
    /// Derived plain-text excerpt for list rendering (nullable).
    pub preview_text: Option<String>,
    /// Creation time in Unix epoch milliseconds, stamped at insert.
    pub created_at: i64,
}
