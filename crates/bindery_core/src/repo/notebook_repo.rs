//! Notebook repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable CRUD APIs over `notebooks` storage.
//! - Own the cascade contract: deleting a notebook reports the notes that
//!   went with it, so change observers can react to both entity kinds.
//!
//! # Invariants
//! - `created_at` is stamped at insert time, never caller-supplied.
//! - Notebook listing is deterministic: `created_at DESC, rowid DESC`.

use crate::model::note::NoteId;
use crate::model::notebook::{Notebook, NotebookId};
use crate::model::now_epoch_ms;
use crate::repo::{parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row, TransactionBehavior};
use uuid::Uuid;

const NOTEBOOK_SELECT_SQL: &str = "SELECT uuid, name, created_at FROM notebooks";

/// Repository interface for notebook CRUD operations.
pub trait NotebookRepository {
    /// Creates one notebook and returns the persisted record.
    fn create_notebook(&mut self, name: &str) -> RepoResult<Notebook>;
    /// Gets one notebook by id.
    fn get_notebook(&mut self, id: NotebookId) -> RepoResult<Option<Notebook>>;
    /// Lists all notebooks, newest first.
    fn list_notebooks(&mut self) -> RepoResult<Vec<Notebook>>;
    /// Replaces a notebook's display name.
    fn rename_notebook(&mut self, id: NotebookId, name: &str) -> RepoResult<()>;
    /// Deletes a notebook and returns the ids of the notes that cascaded.
    fn delete_notebook(&mut self, id: NotebookId) -> RepoResult<Vec<NoteId>>;
}

/// SQLite-backed notebook repository.
pub struct SqliteNotebookRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteNotebookRepository<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }
}

impl NotebookRepository for SqliteNotebookRepository<'_> {
    fn create_notebook(&mut self, name: &str) -> RepoResult<Notebook> {
        let notebook = Notebook {
            uuid: Uuid::new_v4(),
            name: name.to_string(),
            created_at: now_epoch_ms(),
        };

        self.conn.execute(
            "INSERT INTO notebooks (uuid, name, created_at) VALUES (?1, ?2, ?3);",
            params![
                notebook.uuid.to_string(),
                notebook.name.as_str(),
                notebook.created_at
            ],
        )?;

        Ok(notebook)
    }

    fn get_notebook(&mut self, id: NotebookId) -> RepoResult<Option<Notebook>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTEBOOK_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(notebook_from_row(row)?)),
            None => Ok(None),
        }
    }

    fn list_notebooks(&mut self) -> RepoResult<Vec<Notebook>> {
        let mut stmt = self.conn.prepare(&format!(
            "{NOTEBOOK_SELECT_SQL} ORDER BY created_at DESC, rowid DESC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut notebooks = Vec::new();
        while let Some(row) = rows.next()? {
            notebooks.push(notebook_from_row(row)?);
        }
        Ok(notebooks)
    }

    fn rename_notebook(&mut self, id: NotebookId, name: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE notebooks SET name = ?2 WHERE uuid = ?1;",
            params![id.to_string(), name],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn delete_notebook(&mut self, id: NotebookId) -> RepoResult<Vec<NoteId>> {
        let id_text = id.to_string();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let cascaded = {
            let mut stmt =
                tx.prepare("SELECT uuid FROM notes WHERE notebook_uuid = ?1 ORDER BY rowid ASC;")?;
            let mut rows = stmt.query([id_text.as_str()])?;
            let mut note_ids = Vec::new();
            while let Some(row) = rows.next()? {
                let value: String = row.get(0)?;
                note_ids.push(parse_uuid(&value, "notes.uuid")?);
            }
            note_ids
        };

        let changed = tx.execute("DELETE FROM notebooks WHERE uuid = ?1;", [id_text.as_str()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        tx.commit()?;
        Ok(cascaded)
    }
}

fn notebook_from_row(row: &Row<'_>) -> RepoResult<Notebook> {
    let uuid_text: String = row.get("uuid")?;
    Ok(Notebook {
        uuid: parse_uuid(&uuid_text, "notebooks.uuid")?,
        name: row.get("name")?,
        created_at: row.get("created_at")?,
    })
}
