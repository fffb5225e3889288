//! Domain model for notebooks and their notes.
//!
//! # Responsibility
//! - Define the canonical records persisted by the repository layer.
//! - Name the entity kinds used to route change notifications.
//!
//! # Invariants
//! - Every domain object is identified by a stable `Uuid`.
//! - Creation timestamps are stamped by the repository at insert time, never
//!   supplied by callers.

use std::time::{SystemTime, UNIX_EPOCH};

pub mod note;
pub mod notebook;

/// Entity kinds a store commit can touch.
///
/// Change notifications carry these so observers can ignore commits that
/// cannot affect their query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Notebook,
    Note,
}

/// Current wall-clock time in Unix epoch milliseconds.
pub(crate) fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}
