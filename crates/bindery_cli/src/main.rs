//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `bindery_core` wiring end to
//!   end: gateway open, adapter bind, one notebook, one note.
//! - Keep output deterministic for quick local sanity checks.

use bindery_core::{
    AllNotebooks, Gateway, ListAdapter, ListObserver, NotesOfNotebook, RowChange, RowIndex,
    SectionChange,
};

struct QuietObserver;

impl ListObserver for QuietObserver {
    fn on_batch_begin(&mut self) {}
    fn on_section_change(&mut self, _change: SectionChange) {}
    fn on_row_change(&mut self, _change: RowChange) {}
    fn on_batch_end(&mut self) {}
}

fn main() {
    println!("bindery_core ping={}", bindery_core::ping());
    println!("bindery_core version={}", bindery_core::core_version());

    let gateway = Gateway::open_in_memory("bindery_cli_smoke", || {});

    let notebooks: ListAdapter<AllNotebooks, String> = ListAdapter::bind(
        &gateway,
        AllNotebooks,
        "cli notebooks",
        Box::new(QuietObserver),
        Box::new(|line, notebook| line.push_str(&notebook.name)),
    );
    if let Err(err) = notebooks.add("Scratch".to_string()) {
        eprintln!("notebook create failed: {err}");
        return;
    }

    let notebook = match notebooks.row_at(RowIndex::new(0, 0)) {
        Some(notebook) => notebook,
        None => {
            eprintln!("notebook row missing after awaited add");
            return;
        }
    };

    let notes: ListAdapter<NotesOfNotebook, String> = ListAdapter::bind(
        &gateway,
        NotesOfNotebook {
            notebook: notebook.uuid,
        },
        "cli notes",
        Box::new(QuietObserver),
        Box::new(|line, note| {
            line.push_str(note.preview_text.as_deref().unwrap_or("<empty>"))
        }),
    );
    if let Err(err) = notes.add("First note".to_string()) {
        eprintln!("note create failed: {err}");
        return;
    }

    let mut first_note = String::new();
    notes.render_into(RowIndex::new(0, 0), &mut first_note);
    println!(
        "bindery_core notebooks={} notes={} first_note={first_note}",
        notebooks.row_count(0),
        notes.row_count(0)
    );
}
