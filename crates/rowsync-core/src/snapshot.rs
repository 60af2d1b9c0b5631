#![forbid(unsafe_code)]

//! Immutable point-in-time copies of the row collection.
//!
//! # Design
//!
//! A [`Snapshot`] is captured once, under the engine's commit lock, and never
//! mutated afterwards. The rows live behind an `Arc<[String]>`, so cloning a
//! snapshot (which happens once per delivered notification plus once for the
//! latest-committed cache) is a reference-count bump, not a deep copy.
//!
//! # Invariants
//!
//! 1. Indices are 0-based and match row positions at capture time.
//! 2. Two snapshots are unrelated values: no diff is ever derived from a
//!    pair of them. The [`RowChange`](crate::RowChange) travelling with a
//!    snapshot is the sole description of what changed.

use std::sync::Arc;

/// An immutable, fully self-contained copy of the row collection at one
/// instant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    rows: Arc<[String]>,
}

impl Snapshot {
    /// An empty snapshot (the state of a freshly created engine).
    #[must_use]
    pub fn empty() -> Self {
        Self {
            rows: Vec::new().into(),
        }
    }

    /// Capture the given rows. The slice is copied; later mutation of the
    /// source cannot be observed through the snapshot.
    #[must_use]
    pub fn from_rows(rows: &[String]) -> Self {
        Self {
            rows: Arc::from(rows),
        }
    }

    /// Number of rows at capture time.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the snapshot holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The row at `index`, or `None` past the end.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<&str> {
        self.rows.get(index).map(String::as_str)
    }

    /// Iterate over the rows in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(String::as_str)
    }

    /// The rows as a plain slice.
    #[must_use]
    pub fn rows(&self) -> &[String] {
        &self.rows
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Vec<String>> for Snapshot {
    fn from(rows: Vec<String>) -> Self {
        Self { rows: rows.into() }
    }
}
