#![forbid(unsafe_code)]

//! rowsync-bridge: a synchronization bridge between a concurrently-mutated
//! row collection and a single, serially-updated observer.
//!
//! Worker threads owned by the [`Engine`] mutate a shared list of text
//! rows. Every committed mutation captures an immutable
//! [`Snapshot`](rowsync_core::Snapshot) paired with the
//! [`RowChange`](rowsync_core::RowChange) that produced it, and the
//! [`SyncBridge`] forwards those pairs, strictly in commit order and one at a
//! time, to whatever [`RowObserver`] is currently attached, on one
//! dedicated delivery thread.
//!
//! # Guarantees
//!
//! 1. One notification per commit, no reordering, no coalescing.
//! 2. Deliveries are serialized on a single thread; the observer never
//!    needs internal synchronization against the bridge.
//! 3. The observer is held weakly and resolved immediately before each
//!    delivery: dropping or detaching it at any moment is safe and turns
//!    pending deliveries into no-ops.
//! 4. Destroying the bridge with notifications in flight is safe; nothing
//!    is delivered after teardown begins.

mod bridge;
mod config;
mod engine;
mod error;
mod observer;

pub use bridge::SyncBridge;
pub use config::{BridgeConfig, DEFAULT_MUTATION_INTERVAL, DEFAULT_QUEUE_CAPACITY};
pub use engine::{Engine, Mutation};
pub use error::{BridgeError, Result};
pub use observer::{ObserverSlot, RowObserver};

// Re-export the data model so consumers need only one crate.
pub use rowsync_core::{Notification, RowChange, Snapshot};
