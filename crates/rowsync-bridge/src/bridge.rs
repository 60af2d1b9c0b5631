#![forbid(unsafe_code)]

//! The synchronization bridge: commit-ordered fan-in from the engine's
//! worker threads to a single delivery thread.
//!
//! # Design
//!
//! [`SyncBridge::create`] spawns one dedicated, named delivery thread (the
//! delivery context) that drains a bounded FIFO of [`Notification`]s. The
//! engine enqueues each pair under its commit lock, the delivery thread
//! processes them one at a time in receipt order, and the observer is
//! resolved through the weak [`ObserverSlot`] immediately before each
//! callback. That gives the full end-to-end guarantee: the observer sees
//! exactly the committed mutations, in commit order, never concurrently,
//! never on a producing thread.
//!
//! # Teardown
//!
//! [`SyncBridge::destroy`] consumes the bridge: it revokes the observer,
//! flips the delivery-side alive flag (queued pairs drain as no-ops), halts
//! and joins the workers, then joins the delivery thread once the queue
//! disconnects. `Drop` runs the same sequence for bridges that simply go
//! out of scope, so destruction with notifications in flight is always
//! safe.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use rowsync_bridge::{BridgeConfig, RowObserver, SyncBridge};
//! use rowsync_core::Snapshot;
//!
//! struct Printer;
//!
//! impl RowObserver for Printer {
//!     fn on_inserted(&self, snapshot: Snapshot, index: usize) {
//!         println!("+ {:?}", snapshot.row(index));
//!     }
//!     fn on_removed(&self, _snapshot: Snapshot, index: usize) {
//!         println!("- row {index}");
//!     }
//!     fn on_modified(&self, snapshot: Snapshot, index: usize) {
//!         println!("~ {:?}", snapshot.row(index));
//!     }
//! }
//!
//! let (bridge, initial) = SyncBridge::create(BridgeConfig::new(4))?;
//! assert!(initial.is_empty());
//!
//! let observer = Arc::new(Printer);
//! bridge.attach_observer(&observer);
//! // ... later ...
//! bridge.destroy();
//! # Ok::<(), rowsync_bridge::BridgeError>(())
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};

use rowsync_core::{Notification, RowChange, Snapshot};
use tracing::{debug, trace};

use crate::config::BridgeConfig;
use crate::engine::Engine;
use crate::error::Result;
use crate::observer::{ObserverSlot, RowObserver};

/// Bridge between the engine's concurrently-committing workers and one
/// serially-updated observer.
///
/// Owns the engine 1:1; both are destroyed together. Holds at most one
/// observer attachment at a time.
pub struct SyncBridge {
    engine: Option<Engine>,
    slot: Arc<ObserverSlot>,
    alive: Arc<AtomicBool>,
    delivery: Option<JoinHandle<()>>,
}

impl SyncBridge {
    /// Construct the engine and delivery context, start the workers, and
    /// return the bridge together with a snapshot of the initial state.
    ///
    /// Fails with [`BridgeError::InvalidConfiguration`](crate::BridgeError)
    /// when `config.worker_threads` or `config.queue_capacity` is zero; no
    /// threads are spawned in that case.
    pub fn create(config: BridgeConfig) -> Result<(Self, Snapshot)> {
        config.validate()?;

        let (tx, rx) = mpsc::sync_channel::<Notification>(config.queue_capacity);
        let slot = Arc::new(ObserverSlot::new());
        let alive = Arc::new(AtomicBool::new(true));

        let delivery = {
            let slot = Arc::clone(&slot);
            let alive = Arc::clone(&alive);
            thread::Builder::new()
                .name("rowsync-delivery".into())
                .spawn(move || delivery_loop(rx, &slot, &alive))
                .expect("failed to spawn delivery thread")
        };

        let engine = Engine::start(&config, tx);
        let initial = engine.snapshot();
        debug!(
            workers = config.worker_threads,
            queue = config.queue_capacity,
            "bridge created"
        );

        Ok((
            Self {
                engine: Some(engine),
                slot,
                alive,
                delivery: Some(delivery),
            },
            initial,
        ))
    }

    /// Attach `observer`, replacing any previous attachment.
    ///
    /// No backlog is replayed; a late-attaching observer seeds its view
    /// from [`current_snapshot`](Self::current_snapshot) instead. Only a
    /// weak reference is kept; the caller's `Arc` stays the owning
    /// reference.
    pub fn attach_observer<O: RowObserver>(&self, observer: &Arc<O>) {
        self.slot.attach(observer);
        debug!("observer attached");
    }

    /// Revoke the current observer attachment, if any. Idempotent.
    ///
    /// Notifications already queued become no-ops; the attachment check
    /// happens at delivery time, not at enqueue time.
    pub fn detach_observer(&self) {
        self.slot.revoke();
        debug!("observer detached");
    }

    /// The latest *committed* snapshot, independent of how far delivery has
    /// progressed. Usable at any time, e.g. right after attaching.
    #[must_use]
    pub fn current_snapshot(&self) -> Snapshot {
        self.engine().snapshot()
    }

    /// The engine owned by this bridge.
    #[must_use]
    pub fn engine(&self) -> &Engine {
        self.engine
            .as_ref()
            .expect("engine present until destroy consumes the bridge")
    }

    /// Stop the autonomous mutation workers without tearing the bridge
    /// down. The engine stays queryable, explicit commits keep flowing, and
    /// already-queued notifications still deliver.
    pub fn halt_workers(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            engine.halt();
        }
    }

    /// Tear the bridge down: no further deliveries reach the observer even
    /// if notifications were already queued, the workers are stopped and
    /// joined, and the delivery thread exits once the queue disconnects.
    pub fn destroy(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        // Order matters: silence delivery first so queued pairs drain as
        // no-ops, then stop producers, then let the queue disconnect.
        self.alive.store(false, Ordering::Release);
        self.slot.revoke();
        if let Some(mut engine) = self.engine.take() {
            engine.halt();
            drop(engine);
        }
        if let Some(handle) = self.delivery.take() {
            let _ = handle.join();
        }
        debug!("bridge destroyed");
    }
}

impl Drop for SyncBridge {
    fn drop(&mut self) {
        // Best-effort teardown when the caller did not call destroy().
        self.teardown();
    }
}

/// The delivery context's main loop: drain strictly FIFO, re-check
/// liveness and resolve the observer per pair, dispatch one at a time.
fn delivery_loop(rx: Receiver<Notification>, slot: &ObserverSlot, alive: &AtomicBool) {
    debug!("delivery thread started");
    while let Ok(note) = rx.recv() {
        if !alive.load(Ordering::Acquire) {
            trace!("dropping notification: bridge destroyed");
            continue;
        }
        let Some(observer) = slot.resolve() else {
            trace!("dropping notification: no live observer");
            continue;
        };
        let Notification { snapshot, change } = note;
        match change {
            RowChange::Inserted { index } => observer.on_inserted(snapshot, index),
            RowChange::Removed { index } => observer.on_removed(snapshot, index),
            RowChange::Modified { index } => observer.on_modified(snapshot, index),
        }
    }
    debug!("delivery thread exiting");
}
