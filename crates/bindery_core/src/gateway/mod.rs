//! Persistence gateway: store handle plus its two execution contexts.
//!
//! # Responsibility
//! - Own the read context (queries, view binding) and the write context
//!   (background payload mutations), each a worker thread with its own
//!   connection to the same store.
//! - Own the change-notification hub that bridges commits back to the read
//!   affinity.
//!
//! # Invariants
//! - Migrations are applied by the read context before the write context
//!   opens.
//! - `on_ready` is invoked exactly once, on the read affinity, only after
//!   both contexts are usable.
//! - Store initialization failure aborts the process; there is no retry and
//!   no partially-open gateway.

use crate::db::{open_db, open_db_shared_memory};
use log::info;
use std::path::PathBuf;
use std::sync::Arc;

pub mod context;
pub mod hub;

pub use context::ExecContext;
pub use hub::{ChangeHub, ChangeOp, CommitEvent, EntityChange};

/// Owner of the persistent store handle and its affinitized contexts.
///
/// Cheap to clone; all clones address the same store and contexts.
#[derive(Clone)]
pub struct Gateway {
    read: ExecContext,
    write: ExecContext,
    hub: Arc<ChangeHub>,
}

impl Gateway {
    /// Opens a file-backed store and spins up both contexts.
    ///
    /// `on_ready` runs exactly once on the read affinity once the store is
    /// initialized.
    pub fn open(path: impl Into<PathBuf>, on_ready: impl FnOnce() + Send + 'static) -> Self {
        let path = path.into();
        let read_path = path.clone();
        let read = ExecContext::spawn("bindery-read", move || open_db(read_path));
        let write = ExecContext::spawn("bindery-write", move || open_db(path));
        Self::finish_open(read, write, on_ready)
    }

    /// Opens a named shared-memory store (primarily for tests and demos).
    pub fn open_in_memory(store_name: &str, on_ready: impl FnOnce() + Send + 'static) -> Self {
        let read_store = store_name.to_string();
        let write_store = store_name.to_string();
        let read = ExecContext::spawn("bindery-read", move || {
            open_db_shared_memory(&read_store)
        });
        let write = ExecContext::spawn("bindery-write", move || {
            open_db_shared_memory(&write_store)
        });
        Self::finish_open(read, write, on_ready)
    }

    fn finish_open(
        read: ExecContext,
        write: ExecContext,
        on_ready: impl FnOnce() + Send + 'static,
    ) -> Self {
        let hub = Arc::new(ChangeHub::new(read.clone()));
        let gateway = Self { read, write, hub };

        info!("event=gateway_open module=gateway status=ok");
        gateway.read.submit(move |_conn| on_ready());
        gateway
    }

    /// The long-lived context for queries and view binding.
    pub fn read_context(&self) -> &ExecContext {
        &self.read
    }

    /// The context for payload-processing mutations off the read path.
    pub fn write_context(&self) -> &ExecContext {
        &self.write
    }

    /// The keyed change-notification hub.
    pub fn hub(&self) -> &Arc<ChangeHub> {
        &self.hub
    }
}
