//! Keyed change-notification hub.
//!
//! # Responsibility
//! - Fan store commit notifications out to registered observers.
//! - Deliver every notification on the read affinity.
//!
//! # Invariants
//! - Registration is keyed; re-registering under a live key cancels the
//!   prior subscription and installs the new one.
//! - `deliver` runs only on the read affinity; `publish` is the explicit
//!   hop onto it from anywhere else.

use crate::gateway::context::ExecContext;
use crate::model::EntityKind;
use log::debug;
use parking_lot::Mutex;
use rusqlite::Connection;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

/// What a commit did to one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOp {
    Inserted,
    Updated,
    Deleted,
}

/// One entity touched by a commit.
#[derive(Debug, Clone)]
pub struct EntityChange {
    pub kind: EntityKind,
    pub id: Uuid,
    pub op: ChangeOp,
}

/// A completed store commit, described entity by entity.
///
/// A single commit can touch both kinds at once: deleting a notebook also
/// deletes its cascaded notes.
#[derive(Debug, Clone, Default)]
pub struct CommitEvent {
    pub changes: Vec<EntityChange>,
}

impl CommitEvent {
    /// Event describing a single-entity commit.
    pub fn single(kind: EntityKind, id: Uuid, op: ChangeOp) -> Self {
        Self {
            changes: vec![EntityChange { kind, id, op }],
        }
    }

    /// Appends one entity change.
    pub fn push(&mut self, kind: EntityKind, id: Uuid, op: ChangeOp) {
        self.changes.push(EntityChange { kind, id, op });
    }

    /// Whether any change in this commit touches `kind`.
    pub fn touches(&self, kind: EntityKind) -> bool {
        self.changes.iter().any(|change| change.kind == kind)
    }
}

type Subscriber = Arc<dyn Fn(&mut Connection, &CommitEvent) + Send + Sync + 'static>;

/// Keyed observer registry for commit notifications.
pub struct ChangeHub {
    read: ExecContext,
    subscribers: Mutex<BTreeMap<String, Subscriber>>,
}

impl ChangeHub {
    pub(crate) fn new(read: ExecContext) -> Self {
        Self {
            read,
            subscribers: Mutex::new(BTreeMap::new()),
        }
    }

    /// Installs a subscriber under `key`.
    ///
    /// A subscriber already registered under the same key is cancelled
    /// first; registration is idempotent per key.
    pub fn subscribe(
        &self,
        key: &str,
        subscriber: impl Fn(&mut Connection, &CommitEvent) + Send + Sync + 'static,
    ) {
        let replaced = self
            .subscribers
            .lock()
            .insert(key.to_string(), Arc::new(subscriber))
            .is_some();
        debug!("event=hub_subscribe module=gateway status=ok key={key} replaced={replaced}");
    }

    /// Removes the subscriber under `key`, if any.
    pub fn unsubscribe(&self, key: &str) -> bool {
        let removed = self.subscribers.lock().remove(key).is_some();
        debug!("event=hub_unsubscribe module=gateway status=ok key={key} removed={removed}");
        removed
    }

    /// Synchronous delivery on the read affinity.
    ///
    /// Used by mutations already running there, so a caller that awaited the
    /// commit also observes the resulting view updates before its call
    /// returns.
    pub fn deliver(&self, conn: &mut Connection, event: &CommitEvent) {
        debug_assert!(
            self.read.is_current(),
            "deliver() must run on the read affinity"
        );

        // Snapshot the targets so a subscriber may re-register or cancel
        // during delivery without deadlocking the registry lock.
        let targets: Vec<Subscriber> = self.subscribers.lock().values().cloned().collect();
        for target in targets {
            target(conn, event);
        }
    }

    /// Schedules delivery of `event` onto the read affinity.
    ///
    /// This is the only way a commit made on another affinity reaches
    /// observers; the hop is explicit, never assumed.
    pub fn publish(self: &Arc<Self>, event: CommitEvent) {
        let hub = Arc::clone(self);
        self.read.submit(move |conn| hub.deliver(conn, &event));
    }
}
