#![forbid(unsafe_code)]

//! Data model for the rowsync synchronization bridge.
//!
//! This crate holds the value types shared by the engine side (which commits
//! mutations) and the observer side (which consumes them):
//!
//! - [`Snapshot`]: an immutable copy of the whole row collection at one
//!   instant.
//! - [`RowChange`]: a tagged description of a single insert/remove/modify.
//! - [`Notification`]: the atomic `(Snapshot, RowChange)` delivery unit.
//!
//! Nothing here does I/O or touches threads; the bridge crate supplies the
//! concurrency around these types.

mod event;
mod snapshot;

pub use event::{Notification, RowChange};
pub use snapshot::Snapshot;
