//! Notebook domain model.
//!
//! # Invariants
//! - `uuid` is stable and never reused for another notebook.
//! - Deleting a notebook deletes every note it owns.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a notebook.
pub type NotebookId = Uuid;

/// A named container of notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notebook {
    /// Stable global ID used for note back-references.
    pub uuid: NotebookId,
    /// Display name shown in notebook lists.
    pub name: String,
    /// Creation time in Unix epoch milliseconds, stamped at insert.
    pub created_at: i64,
}
