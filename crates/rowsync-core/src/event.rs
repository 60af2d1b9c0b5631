#![forbid(unsafe_code)]

//! Change events and the notification pair.

use crate::Snapshot;

/// A tagged description of one committed mutation.
///
/// The index is interpreted against the [`Snapshot`] delivered with the
/// change:
///
/// - `Inserted`: the new row now lives at `index` in that snapshot.
/// - `Removed`: the row lived at `index` in the previously delivered
///   snapshot and is absent from this one.
/// - `Modified`: the row at `index` differs in value from the previously
///   delivered snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowChange {
    /// A row was inserted at `index`.
    Inserted {
        /// Position of the new row in the accompanying snapshot.
        index: usize,
    },
    /// The row at `index` was removed.
    Removed {
        /// Position the row occupied before removal.
        index: usize,
    },
    /// The row at `index` was modified in place.
    Modified {
        /// Position of the changed row in the accompanying snapshot.
        index: usize,
    },
}

impl RowChange {
    /// The index the change refers to, regardless of kind.
    #[must_use]
    pub fn index(&self) -> usize {
        match self {
            Self::Inserted { index } | Self::Removed { index } | Self::Modified { index } => *index,
        }
    }
}

/// The atomic unit of delivery: a snapshot paired with the change that
/// produced it.
///
/// The pair is never split. An observer never sees a [`RowChange`] without
/// the snapshot it belongs to, or vice versa.
#[derive(Clone, Debug)]
pub struct Notification {
    /// The collection state immediately after the mutation committed.
    pub snapshot: Snapshot,
    /// What changed relative to the previous commit.
    pub change: RowChange,
}
