#![forbid(unsafe_code)]

//! The engine: the live row collection, its commit lock, and the worker
//! threads that mutate it.
//!
//! # Design
//!
//! All writes, whether from the autonomous workers or from
//! [`Engine::apply`], go through one mutex around the live `Vec<String>`.
//! While that lock is held, a commit does three things in order: mutate the
//! rows, capture a [`Snapshot`], and enqueue the `(snapshot, change)` pair
//! on the bridge's FIFO queue. Because capture and enqueue happen under the
//! lock, queue order is identical to commit order by construction; the
//! bridge never has to reorder anything downstream.
//!
//! # Backpressure
//!
//! The queue is bounded. When it is full, the committing worker blocks in
//! `send` while still holding the commit lock, which stalls other
//! committers until the delivery thread catches up. Producers are paced in
//! the hundreds of milliseconds while delivery is a handful of virtual
//! calls, so in practice the queue stays shallow.
//!
//! # Worker workload
//!
//! Each worker sleeps a jittered interval, then rolls a d10: 0-1 inserts a
//! new `worker-{id}` row at the end, 2 removes a random row, anything else
//! appends `-{id}` to a random row. Removal and modification are skipped
//! while the collection is empty. Workers stop when their shutdown channel
//! disconnects, checked via `recv_timeout` so teardown never waits longer
//! than one interval.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use arc_swap::ArcSwap;
use rand::{Rng, RngExt};
use rowsync_core::{Notification, RowChange, Snapshot};
use tracing::{debug, trace};

use crate::config::BridgeConfig;

/// An explicit, already-decided mutation for [`Engine::apply`].
///
/// The engine's own workers generate their mutations internally; this type
/// exists for callers that drive the collection directly. Both paths are
/// linearized through the same commit lock.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mutation {
    /// Insert `value` so that it ends up at `index` (`index` may equal the
    /// current length to append).
    Insert {
        /// Target position of the new row.
        index: usize,
        /// The row text.
        value: String,
    },
    /// Remove the row at `index`.
    Remove {
        /// Position of the row to remove.
        index: usize,
    },
    /// Replace the row at `index` with `value`.
    Modify {
        /// Position of the row to change.
        index: usize,
        /// The replacement text.
        value: String,
    },
}

/// State shared between the engine handle and its worker threads.
struct EngineShared {
    /// The live, mutable collection. The mutex is the commit lock.
    rows: Mutex<Vec<String>>,
    /// Latest committed snapshot, readable without the commit lock.
    latest: ArcSwap<Snapshot>,
    /// FIFO handoff to the delivery thread.
    queue: SyncSender<Notification>,
}

impl EngineShared {
    /// Publish one committed mutation. Caller holds the commit lock; `rows`
    /// is the post-mutation state.
    fn commit(&self, rows: &[String], change: RowChange) {
        let snapshot = Snapshot::from_rows(rows);
        self.latest.store(Arc::new(snapshot.clone()));
        if self.queue.send(Notification { snapshot, change }).is_err() {
            // Delivery side is gone (bridge tearing down). The commit
            // stands; the notification is dropped.
            trace!(?change, "notification dropped: delivery queue disconnected");
        }
    }
}

/// One autonomous mutation worker.
struct Worker {
    id: usize,
    shared: Arc<EngineShared>,
    interval: Duration,
    shutdown: Receiver<()>,
}

impl Worker {
    fn run(self) {
        let mut rng = rand::rng();
        debug!(worker = self.id, "mutation worker started");
        loop {
            let jitter = self.interval.mul_f64(rng.random_range(0.0..3.0));
            match self.shutdown.recv_timeout(self.interval + jitter) {
                Err(RecvTimeoutError::Timeout) => {}
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
            self.mutate_once(&mut rng);
        }
        debug!(worker = self.id, "mutation worker exiting");
    }

    /// Roll for and commit one mutation: 20% insert, 10% remove, 70%
    /// modify (the latter two only when rows exist).
    fn mutate_once(&self, rng: &mut (impl Rng + RngExt)) {
        let mut rows = self.shared.rows.lock().expect("commit lock poisoned");
        match rng.random_range(0..10u32) {
            0 | 1 => {
                rows.push(format!("worker-{}", self.id));
                let index = rows.len() - 1;
                self.shared.commit(&rows, RowChange::Inserted { index });
            }
            2 => {
                if !rows.is_empty() {
                    let index = rng.random_range(0..rows.len());
                    rows.remove(index);
                    self.shared.commit(&rows, RowChange::Removed { index });
                }
            }
            _ => {
                if !rows.is_empty() {
                    let index = rng.random_range(0..rows.len());
                    rows[index].push_str(&format!("-{}", self.id));
                    self.shared.commit(&rows, RowChange::Modified { index });
                }
            }
        }
    }
}

/// The live collection plus its worker threads.
///
/// Owned 1:1 by the bridge and destroyed with it. The query surface
/// (`len`, `value_at`, `snapshot`) reads the latest committed snapshot and
/// never contends with the commit lock.
pub struct Engine {
    shared: Arc<EngineShared>,
    workers: Vec<JoinHandle<()>>,
    stoppers: Vec<mpsc::Sender<()>>,
}

impl Engine {
    /// Start the engine with an empty collection and `config.worker_threads`
    /// workers feeding `queue`.
    pub(crate) fn start(config: &BridgeConfig, queue: SyncSender<Notification>) -> Self {
        let shared = Arc::new(EngineShared {
            rows: Mutex::new(Vec::new()),
            latest: ArcSwap::from_pointee(Snapshot::empty()),
            queue,
        });

        let mut workers = Vec::with_capacity(config.worker_threads);
        let mut stoppers = Vec::with_capacity(config.worker_threads);
        for id in 0..config.worker_threads {
            let (stop_tx, stop_rx) = mpsc::channel();
            stoppers.push(stop_tx);
            let worker = Worker {
                id,
                shared: Arc::clone(&shared),
                interval: config.mutation_interval,
                shutdown: stop_rx,
            };
            let handle = thread::Builder::new()
                .name(format!("rowsync-worker-{id}"))
                .spawn(move || worker.run())
                .expect("failed to spawn mutation worker");
            workers.push(handle);
        }

        Self {
            shared,
            workers,
            stoppers,
        }
    }

    /// Latest committed snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.shared.latest.load().as_ref().clone()
    }

    /// Row count of the latest committed snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.latest.load().len()
    }

    /// True when the latest committed snapshot holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shared.latest.load().is_empty()
    }

    /// The row at `index` in the latest committed snapshot.
    #[must_use]
    pub fn value_at(&self, index: usize) -> Option<String> {
        self.shared.latest.load().row(index).map(str::to_string)
    }

    /// Commit one explicit mutation, linearized with the workers' commits.
    ///
    /// Returns the resulting [`RowChange`], or `None` when the mutation's
    /// index is out of range for the current collection (no commit happens
    /// and no notification is produced).
    pub fn apply(&self, mutation: Mutation) -> Option<RowChange> {
        let mut rows = self.shared.rows.lock().expect("commit lock poisoned");
        let change = match mutation {
            Mutation::Insert { index, value } => {
                if index > rows.len() {
                    return None;
                }
                rows.insert(index, value);
                RowChange::Inserted { index }
            }
            Mutation::Remove { index } => {
                if index >= rows.len() {
                    return None;
                }
                rows.remove(index);
                RowChange::Removed { index }
            }
            Mutation::Modify { index, value } => {
                if index >= rows.len() {
                    return None;
                }
                rows[index] = value;
                RowChange::Modified { index }
            }
        };
        self.shared.commit(&rows, change);
        Some(change)
    }

    /// Stop and join the mutation workers. Idempotent. The collection stays
    /// queryable and `apply` keeps working; only autonomous mutation ends.
    pub(crate) fn halt(&mut self) {
        if self.workers.is_empty() {
            return;
        }
        debug!(workers = self.workers.len(), "halting mutation workers");
        // Dropping the senders disconnects every worker's shutdown channel.
        self.stoppers.clear();
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.halt();
    }
}
