//! Note repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide note persistence APIs scoped to an owning notebook.
//! - Derive the plain-text preview projection on every body write.
//!
//! # Invariants
//! - Every note row references an existing notebook; the foreign key rejects
//!   orphans.
//! - `created_at` is stamped at insert time, never caller-supplied.
//! - Note listing is deterministic: `created_at DESC, rowid DESC`.

use crate::model::note::{Note, NoteId};
use crate::model::notebook::NotebookId;
use crate::model::now_epoch_ms;
use crate::repo::{parse_uuid, RepoError, RepoResult};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const NOTE_SELECT_SQL: &str =
    "SELECT uuid, notebook_uuid, body, preview_text, created_at FROM notes";

const PREVIEW_MAX_CHARS: usize = 120;

static MARKDOWN_IMAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[[^\]]*]\(([^)]+)\)").expect("valid image regex"));
static MARKDOWN_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("valid link regex"));
static MARKDOWN_SYMBOL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[\*_`#>~\-\[\]\(\)!]+"#).expect("valid markdown symbol regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Repository interface for note CRUD operations.
pub trait NoteRepository {
    /// Creates one note inside `notebook` and returns the persisted record.
    fn create_note(&self, notebook: NotebookId, body: &str) -> RepoResult<Note>;
    /// Gets one note by id.
    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>>;
    /// Lists the notes of one notebook, newest first.
    fn list_notes(&self, notebook: NotebookId) -> RepoResult<Vec<Note>>;
    /// Replaces note body and recomputes the preview projection.
    fn update_note_body(&self, id: NoteId, body: &str) -> RepoResult<()>;
    /// Deletes one note.
    fn delete_note(&self, id: NoteId) -> RepoResult<()>;
}

/// SQLite-backed note repository.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn create_note(&self, notebook: NotebookId, body: &str) -> RepoResult<Note> {
        let note = Note {
            uuid: Uuid::new_v4(),
            notebook_uuid: notebook,
            body: body.to_string(),
            preview_text: derive_preview_text(body),
            created_at: now_epoch_ms(),
        };

        self.conn.execute(
            "INSERT INTO notes (uuid, notebook_uuid, body, preview_text, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                note.uuid.to_string(),
                note.notebook_uuid.to_string(),
                note.body.as_str(),
                note.preview_text.as_deref(),
                note.created_at
            ],
        )?;

        Ok(note)
    }

    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(note_from_row(row)?)),
            None => Ok(None),
        }
    }

    fn list_notes(&self, notebook: NotebookId) -> RepoResult<Vec<Note>> {
        let mut stmt = self.conn.prepare(&format!(
            "{NOTE_SELECT_SQL} WHERE notebook_uuid = ?1 ORDER BY created_at DESC, rowid DESC;"
        ))?;
        let mut rows = stmt.query([notebook.to_string()])?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(note_from_row(row)?);
        }
        Ok(notes)
    }

    fn update_note_body(&self, id: NoteId, body: &str) -> RepoResult<()> {
        let preview = derive_preview_text(body);
        let changed = self.conn.execute(
            "UPDATE notes SET body = ?2, preview_text = ?3 WHERE uuid = ?1;",
            params![id.to_string(), body, preview.as_deref()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn delete_note(&self, id: NoteId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM notes WHERE uuid = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }
}

/// Derives the plain-text preview excerpt from a markdown body.
///
/// Images are dropped, links collapse to their label, markdown punctuation is
/// stripped, and whitespace runs collapse to single spaces. Returns `None`
/// when nothing printable remains.
pub fn derive_preview_text(body: &str) -> Option<String> {
    let without_images = MARKDOWN_IMAGE_RE.replace_all(body, "");
    let with_link_labels = MARKDOWN_LINK_RE.replace_all(&without_images, "$1");
    let without_symbols = MARKDOWN_SYMBOL_RE.replace_all(&with_link_labels, " ");
    let collapsed = WHITESPACE_RE.replace_all(&without_symbols, " ");
    let trimmed = collapsed.trim();

    if trimmed.is_empty() {
        return None;
    }

    Some(trimmed.chars().take(PREVIEW_MAX_CHARS).collect())
}

fn note_from_row(row: &Row<'_>) -> RepoResult<Note> {
    let uuid_text: String = row.get("uuid")?;
    let notebook_text: String = row.get("notebook_uuid")?;
    Ok(Note {
        uuid: parse_uuid(&uuid_text, "notes.uuid")?,
        notebook_uuid: parse_uuid(&notebook_text, "notes.notebook_uuid")?,
        body: row.get("body")?,
        preview_text: row.get("preview_text")?,
        created_at: row.get("created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::derive_preview_text;

    #[test]
    fn preview_strips_markdown_noise() {
        let body =
            "# Title\n\n![cover](images/cover.png)\nSee [the docs](https://example.com) for **details**";
        let preview = derive_preview_text(body).unwrap();
        assert_eq!(preview, "Title See the docs for details");
    }

    #[test]
    fn preview_is_none_for_markup_only_body() {
        assert_eq!(derive_preview_text("![](img.png)\n\n---\n"), None);
    }

    #[test]
    fn preview_is_capped() {
        let body = "x".repeat(500);
        let preview = derive_preview_text(&body).unwrap();
        assert_eq!(preview.chars().count(), 120);
    }
}
