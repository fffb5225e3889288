//! Live query observation.
//!
//! # Responsibility
//! - Keep a view-layer row/section model synchronized with a live query's
//!   result set as the store changes.
//! - Route mutations through the execution context appropriate to their
//!   latency profile.
//!
//! # Invariants
//! - The observed result set is mutated only by the reaction path, never by
//!   callers.
//! - Every batch of view operations is bracketed by `on_batch_begin` /
//!   `on_batch_end` and must be applied atomically by the view.

pub mod adapter;
pub mod diff;
pub mod query;
pub mod snapshot;

pub use adapter::{ListAdapter, ListObserver, RenderFn};
pub use diff::{diff_snapshots, BatchDiff, RowChange, SectionChange};
pub use query::{AllNotebooks, LiveQuery, LiveRow, NotesOfNotebook};
pub use snapshot::{RowIndex, Section, SectionInfo, Snapshot};
