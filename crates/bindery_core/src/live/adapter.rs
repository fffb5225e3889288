//! Observed list adapter.
//!
//! # Responsibility
//! - Bind a live query to its current result set and keep that result set
//!   patched as store commits land.
//! - Serve position-based reads to the view without blocking or I/O.
//! - Route mutations: awaited ones on the read context, expensive payload
//!   work on the write context, deletes fire-and-forget.
//!
//! # Invariants
//! - Bind-time query failure is fatal; it signals a corrupt store or a
//!   malformed descriptor, not a recoverable condition.
//! - Reaction runs only on the read affinity; the snapshot swap happens
//!   before observer emission, so the view pulls post-batch state.
//! - The hub registration key is the adapter's cache name; binding a second
//!   adapter under the same name replaces the first one's subscription.

use crate::gateway::hub::CommitEvent;
use crate::gateway::Gateway;
use crate::live::diff::{diff_snapshots, RowChange, SectionChange};
use crate::live::query::{LiveQuery, LiveRow};
use crate::live::snapshot::{RowIndex, SectionInfo, Snapshot};
use crate::repo::RepoResult;
use log::{debug, error, info, warn};
use parking_lot::{Mutex, RwLock};
use rusqlite::Connection;
use std::sync::Arc;
use uuid::Uuid;

/// View-side receiver of change batches.
///
/// Callbacks arrive on the read affinity and must be applied atomically
/// between `on_batch_begin` and `on_batch_end`. Callbacks must not invoke
/// the adapter's blocking mutations; those wait on the very affinity the
/// callback is running on.
pub trait ListObserver: Send {
    fn on_batch_begin(&mut self);
    fn on_section_change(&mut self, change: SectionChange);
    fn on_row_change(&mut self, change: RowChange);
    fn on_batch_end(&mut self);
}

/// Renders one result row into a view-owned container.
pub type RenderFn<C, R> = Box<dyn Fn(&mut C, &R)>;

struct AdapterShared<Q: LiveQuery> {
    gateway: Gateway,
    query: Q,
    cache_name: String,
    /// `None` while released.
    snapshot: RwLock<Option<Snapshot<Q::Row>>>,
    observer: Mutex<Box<dyn ListObserver>>,
}

/// Synchronizes one live query's result set with a row/section view model.
pub struct ListAdapter<Q: LiveQuery, C> {
    shared: Arc<AdapterShared<Q>>,
    render: RenderFn<C, Q::Row>,
}

impl<Q: LiveQuery, C> ListAdapter<Q, C> {
    /// Executes the query synchronously and starts observing the store.
    ///
    /// # Panics
    /// When the query cannot be executed against the store.
    pub fn bind(
        gateway: &Gateway,
        query: Q,
        cache_name: impl Into<String>,
        observer: Box<dyn ListObserver>,
        render: RenderFn<C, Q::Row>,
    ) -> Self {
        let shared = Arc::new(AdapterShared {
            gateway: gateway.clone(),
            query,
            cache_name: cache_name.into(),
            snapshot: RwLock::new(None),
            observer: Mutex::new(observer),
        });
        AdapterShared::install(&shared);
        Self { shared, render }
    }

    /// Tears down the live query and stops observing the store.
    ///
    /// Reads return empty afterwards; `rebind` resumes observation.
    pub fn release(&self) {
        self.shared
            .gateway
            .hub()
            .unsubscribe(&self.shared.cache_name);
        *self.shared.snapshot.write() = None;
        info!(
            "event=adapter_release module=live status=ok query={}",
            self.shared.cache_name
        );
    }

    /// Re-executes the query and resumes observation after a release.
    ///
    /// # Panics
    /// When the query cannot be executed against the store.
    pub fn rebind(&self) {
        AdapterShared::install(&self.shared);
    }

    /// Whether the adapter currently observes the store.
    pub fn is_observing(&self) -> bool {
        self.shared.snapshot.read().is_some()
    }

    /// Number of sections in the current result set.
    pub fn section_count(&self) -> usize {
        self.shared
            .snapshot
            .read()
            .as_ref()
            .map_or(0, Snapshot::section_count)
    }

    /// Number of rows in one section.
    pub fn row_count(&self, section: usize) -> usize {
        self.shared
            .snapshot
            .read()
            .as_ref()
            .map_or(0, |snapshot| snapshot.row_count(section))
    }

    /// Section metadata, or `None` when out of range or released.
    pub fn section_info(&self, section: usize) -> Option<SectionInfo> {
        self.shared.snapshot.read().as_ref()?.section_info(section)
    }

    /// The row at a position, or `None` when out of range or released.
    pub fn row_at(&self, at: RowIndex) -> Option<Q::Row> {
        self.shared.snapshot.read().as_ref()?.row(at).cloned()
    }

    /// Applies the render callback for the row at `at`.
    ///
    /// Returns `false` when the position does not resolve to a row.
    pub fn render_into(&self, at: RowIndex, container: &mut C) -> bool {
        match self.row_at(at) {
            Some(row) => {
                (self.render)(container, &row);
                true
            }
            None => false,
        }
    }

    /// Creates a new matching entity and waits for both the commit and the
    /// resulting change batch.
    ///
    /// The new row reaches the view through the notification path, not the
    /// return value.
    pub fn add(&self, payload: Q::Payload) -> RepoResult<()> {
        let shared = Arc::clone(&self.shared);
        self.shared.gateway.read_context().call(move |conn| {
            match shared.query.insert(conn, &payload) {
                Ok(event) => {
                    shared.gateway.hub().deliver(conn, &event);
                    Ok(())
                }
                Err(err) => {
                    error!(
                        "event=commit module=live status=error op=add query={} error={err}",
                        shared.cache_name
                    );
                    Err(err)
                }
            }
        })
    }

    /// Replaces one entity's payload on the read context and waits for the
    /// commit. For small, synchronous edits.
    pub fn update_immediate(&self, id: Uuid, payload: Q::Payload) -> RepoResult<()> {
        let shared = Arc::clone(&self.shared);
        self.shared.gateway.read_context().call(move |conn| {
            match shared.query.update(conn, id, &payload) {
                Ok(event) => {
                    shared.gateway.hub().deliver(conn, &event);
                    Ok(())
                }
                Err(err) => {
                    error!(
                        "event=commit module=live status=error op=update_immediate query={} id={id} error={err}",
                        shared.cache_name
                    );
                    Err(err)
                }
            }
        })
    }

    /// Recomputes one entity's payload off the read path and commits on the
    /// write context.
    ///
    /// Only the identifier crosses the affinity boundary; the entity is
    /// re-resolved on the write context before `producer` runs. Commits
    /// reach observers through the hub's explicit hop back to the read
    /// affinity. There is no cancellation: a started producer always runs
    /// to completion and commits, so a newer edit can lose to an older
    /// in-flight one (last commit wins).
    pub fn update_async(&self, id: Uuid, producer: impl FnOnce() -> Q::Payload + Send + 'static) {
        let shared = Arc::clone(&self.shared);
        self.shared.gateway.write_context().submit(move |conn| {
            match shared.query.resolve(conn, id) {
                Ok(Some(_)) => {}
                Ok(None) => {
                    warn!(
                        "event=update_async module=live status=skip query={} id={id} reason=entity_gone",
                        shared.cache_name
                    );
                    return;
                }
                Err(err) => {
                    error!(
                        "event=update_async module=live status=error query={} id={id} error={err}",
                        shared.cache_name
                    );
                    return;
                }
            }

            let payload = producer();
            match shared.query.update(conn, id, &payload) {
                Ok(event) => shared.gateway.hub().publish(event),
                Err(err) => error!(
                    "event=commit module=live status=error op=update_async query={} id={id} error={err}",
                    shared.cache_name
                ),
            }
        });
    }

    /// Deletes the row at a position in the current result set.
    ///
    /// The commit is fire-and-forget: the call returns before the store
    /// confirms, trading a vanishingly small inconsistency window for
    /// responsiveness. Commit failures are logged, not returned.
    ///
    /// # Panics
    /// When the adapter is released or `at` does not resolve to a row; a
    /// position from a stale snapshot is a caller bug.
    pub fn delete(&self, at: RowIndex) {
        let id = {
            let guard = self.shared.snapshot.read();
            let snapshot = match guard.as_ref() {
                Some(snapshot) => snapshot,
                None => panic!(
                    "delete on released adapter `{}`",
                    self.shared.cache_name
                ),
            };
            match snapshot.row(at) {
                Some(row) => row.row_id(),
                None => panic!(
                    "delete: no row at section {} row {} in `{}`",
                    at.section, at.row, self.shared.cache_name
                ),
            }
        };

        let shared = Arc::clone(&self.shared);
        self.shared.gateway.read_context().submit(move |conn| {
            match shared.query.delete(conn, id) {
                Ok(event) => shared.gateway.hub().deliver(conn, &event),
                Err(err) => error!(
                    "event=commit module=live status=error op=delete query={} id={id} error={err}",
                    shared.cache_name
                ),
            }
        });
    }
}

impl<Q: LiveQuery> AdapterShared<Q> {
    /// Initial (or renewed) fetch plus hub registration.
    ///
    /// Runs as one read-context job so no commit can slip between the fetch
    /// and the subscription.
    fn install(shared: &Arc<Self>) {
        let job_shared = Arc::clone(shared);
        let result: RepoResult<usize> = shared.gateway.read_context().call(move |conn| {
            let rows = job_shared.query.fetch(conn)?;
            let snapshot = Snapshot::build(rows, |row| job_shared.query.section_key(row));
            let total = snapshot.total_rows();
            *job_shared.snapshot.write() = Some(snapshot);

            let react_shared = Arc::downgrade(&job_shared);
            job_shared
                .gateway
                .hub()
                .subscribe(&job_shared.cache_name, move |conn, event| {
                    if let Some(shared) = react_shared.upgrade() {
                        shared.react(conn, event);
                    }
                });
            Ok(total)
        });

        match result {
            Ok(total) => info!(
                "event=adapter_bind module=live status=ok query={} rows={}",
                shared.cache_name, total
            ),
            Err(err) => panic!(
                "live query `{}` could not be executed: {err}",
                shared.cache_name
            ),
        }
    }

    /// Reaction path: runs on the read affinity for every delivered commit.
    fn react(&self, conn: &mut Connection, event: &CommitEvent) {
        if !event.touches(self.query.entity()) {
            return;
        }
        if self.snapshot.read().is_none() {
            return;
        }

        let rows = match self.query.fetch(conn) {
            Ok(rows) => rows,
            Err(err) => panic!("live query `{}` re-fetch failed: {err}", self.cache_name),
        };
        let new_snapshot = Snapshot::build(rows, |row| self.query.section_key(row));

        let batch = {
            let mut guard = self.snapshot.write();
            let old = match guard.take() {
                // Released between the observing check and here.
                None => return,
                Some(old) => old,
            };
            let batch = diff_snapshots(&old, &new_snapshot);
            *guard = Some(new_snapshot);
            batch
        };

        if batch.is_empty() {
            return;
        }

        debug!(
            "event=adapter_react module=live status=ok query={} section_ops={} row_ops={}",
            self.cache_name,
            batch.sections.len(),
            batch.rows.len()
        );

        let mut observer = self.observer.lock();
        observer.on_batch_begin();
        for change in &batch.sections {
            observer.on_section_change(*change);
        }
        for change in &batch.rows {
            observer.on_row_change(*change);
        }
        observer.on_batch_end();
    }
}
