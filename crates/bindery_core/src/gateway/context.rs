//! Execution contexts: worker threads owning one SQLite connection each.
//!
//! # Responsibility
//! - Confine every connection to exactly one thread (its affinity).
//! - Run submitted jobs in order, fire-and-forget or blocking.
//!
//! # Invariants
//! - The owned `Connection` never leaves the worker thread.
//! - Store open failure is fatal: the process aborts, no partial-open state
//!   is ever observable.
//! - Jobs run strictly in submission order.

use crate::db::DbResult;
use crossbeam_channel::{bounded, unbounded, Sender};
use log::{error, info};
use rusqlite::Connection;
use std::thread::{self, ThreadId};

pub(crate) type Job = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

/// Handle to one execution affinity.
///
/// Cloning yields another handle to the same worker; the worker exits when
/// every handle is dropped.
#[derive(Clone)]
pub struct ExecContext {
    name: &'static str,
    jobs: Sender<Job>,
    thread: ThreadId,
}

impl ExecContext {
    /// Spawns the worker, opens its connection, and blocks until the store
    /// is usable. Open failure aborts the process.
    pub(crate) fn spawn(
        name: &'static str,
        opener: impl FnOnce() -> DbResult<Connection> + Send + 'static,
    ) -> Self {
        let (job_tx, job_rx) = unbounded::<Job>();
        let (ready_tx, ready_rx) = bounded::<ThreadId>(1);

        let spawned = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let mut conn = match opener() {
                    Ok(conn) => conn,
                    Err(err) => {
                        error!(
                            "event=context_open module=gateway status=fatal name={name} error={err}"
                        );
                        std::process::abort();
                    }
                };

                if ready_tx.send(thread::current().id()).is_err() {
                    return;
                }

                for job in job_rx {
                    job(&mut conn);
                }
            });

        if let Err(err) = spawned {
            error!("event=context_spawn module=gateway status=fatal name={name} error={err}");
            std::process::abort();
        }

        let thread = match ready_rx.recv() {
            Ok(id) => id,
            // The worker only drops ready_tx after abort is already underway.
            Err(_) => std::process::abort(),
        };

        info!("event=context_spawn module=gateway status=ok name={name}");
        Self {
            name,
            jobs: job_tx,
            thread,
        }
    }

    /// Context name, for diagnostics.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether the calling thread is this context's affinity.
    pub fn is_current(&self) -> bool {
        thread::current().id() == self.thread
    }

    /// Enqueues a job without waiting for it.
    pub fn submit(&self, job: impl FnOnce(&mut Connection) + Send + 'static) {
        if self.jobs.send(Box::new(job)).is_err() {
            error!(
                "event=context_submit module=gateway status=fatal name={} error=context_thread_gone",
                self.name
            );
            std::process::abort();
        }
    }

    /// Runs a job on the context and blocks until its result is available.
    ///
    /// Must not be called from the context's own affinity; that would wait
    /// on a job queued behind the caller.
    pub fn call<T: Send + 'static>(
        &self,
        f: impl FnOnce(&mut Connection) -> T + Send + 'static,
    ) -> T {
        debug_assert!(
            !self.is_current(),
            "call() on context `{}` from its own affinity would deadlock",
            self.name
        );

        let (result_tx, result_rx) = bounded::<T>(1);
        self.submit(move |conn| {
            let _ = result_tx.send(f(conn));
        });

        match result_rx.recv() {
            Ok(value) => value,
            Err(_) => {
                error!(
                    "event=context_call module=gateway status=fatal name={} error=context_thread_gone",
                    self.name
                );
                std::process::abort();
            }
        }
    }

    /// Blocks until every job submitted before this call has run.
    pub fn flush(&self) {
        self.call(|_conn| ());
    }
}
