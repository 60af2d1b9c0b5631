#![forbid(unsafe_code)]

//! The observer trait and the weak, revocable slot the bridge resolves at
//! delivery time.
//!
//! # Design
//!
//! The bridge must never extend the observer's lifetime: the observer's
//! owner remains free to drop it at any moment. [`ObserverSlot`] therefore
//! stores a `Weak<dyn RowObserver>` behind an [`ArcSwapOption`], giving
//! lock-free, last-writer-wins attach/revoke against concurrent resolution.
//! Upgrading the weak reference happens immediately before each delivery,
//! never at enqueue time.
//!
//! # Failure Modes
//!
//! - **Observer dropped by its owner**: `resolve` returns `None`; the
//!   pending notification is silently skipped. Not an error.
//! - **Revoke racing a resolve**: the resolve either sees the old observer
//!   (delivery was already in progress) or `None`. Never a partial or
//!   dangling reference.

use std::sync::{Arc, Weak};

use arc_swap::ArcSwapOption;
use rowsync_core::Snapshot;

/// Consumer of ordered change notifications.
///
/// All three callbacks are invoked only on the bridge's delivery thread,
/// only while the observer is attached, strictly in commit order, and each
/// carries the snapshot valid at that instant.
pub trait RowObserver: Send + Sync + 'static {
    /// A row appeared at `index` in `snapshot`.
    fn on_inserted(&self, snapshot: Snapshot, index: usize);
    /// The row previously at `index` is gone from `snapshot`.
    fn on_removed(&self, snapshot: Snapshot, index: usize);
    /// The row at `index` in `snapshot` changed value.
    fn on_modified(&self, snapshot: Snapshot, index: usize);
}

/// A weak, revocable association from the bridge to at most one observer.
#[derive(Default)]
pub struct ObserverSlot {
    slot: ArcSwapOption<Weak<dyn RowObserver>>,
}

impl ObserverSlot {
    /// An empty slot (no observer attached).
    #[must_use]
    pub fn new() -> Self {
        Self {
            slot: ArcSwapOption::from(None),
        }
    }

    /// Attach `observer`, replacing any previous attachment. The previous
    /// observer is not notified further.
    pub fn attach<O: RowObserver>(&self, observer: &Arc<O>) {
        let weak = Arc::downgrade(observer);
        let weak: Weak<dyn RowObserver> = weak;
        self.slot.store(Some(Arc::new(weak)));
    }

    /// Clear the slot. Idempotent; safe to race with `resolve`.
    pub fn revoke(&self) {
        self.slot.store(None);
    }

    /// Upgrade the current attachment, if any and still alive.
    #[must_use]
    pub fn resolve(&self) -> Option<Arc<dyn RowObserver>> {
        self.slot.load_full().and_then(|weak| weak.upgrade())
    }

    /// True when a (possibly already dead) observer is attached.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.slot.load().is_some()
    }
}

impl std::fmt::Debug for ObserverSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverSlot")
            .field("attached", &self.is_attached())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Barrier;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    use super::*;

    struct CountingObserver {
        seen: AtomicUsize,
    }

    impl CountingObserver {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                seen: AtomicUsize::new(0),
            })
        }
    }

    impl RowObserver for CountingObserver {
        fn on_inserted(&self, _snapshot: Snapshot, _index: usize) {
            self.seen.fetch_add(1, Ordering::Relaxed);
        }
        fn on_removed(&self, _snapshot: Snapshot, _index: usize) {
            self.seen.fetch_add(1, Ordering::Relaxed);
        }
        fn on_modified(&self, _snapshot: Snapshot, _index: usize) {
            self.seen.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn empty_slot_resolves_to_none() {
        let slot = ObserverSlot::new();
        assert!(slot.resolve().is_none());
        assert!(!slot.is_attached());
    }

    #[test]
    fn attach_then_resolve_yields_the_observer() {
        let slot = ObserverSlot::new();
        let observer = CountingObserver::new();
        slot.attach(&observer);

        let resolved = slot.resolve().expect("attached observer should resolve");
        resolved.on_inserted(Snapshot::empty(), 0);
        assert_eq!(observer.seen.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn revoke_is_idempotent() {
        let slot = ObserverSlot::new();
        let observer = CountingObserver::new();
        slot.attach(&observer);

        slot.revoke();
        slot.revoke();
        assert!(slot.resolve().is_none());
        assert!(!slot.is_attached());
    }

    #[test]
    fn dropped_observer_resolves_to_none() {
        let slot = ObserverSlot::new();
        let observer = CountingObserver::new();
        slot.attach(&observer);
        drop(observer);

        // Still attached (the weak is present) but no longer resolvable.
        assert!(slot.is_attached());
        assert!(slot.resolve().is_none());
    }

    #[test]
    fn second_attach_supersedes_first() {
        let slot = ObserverSlot::new();
        let first = CountingObserver::new();
        let second = CountingObserver::new();
        slot.attach(&first);
        slot.attach(&second);

        let resolved = slot.resolve().expect("second observer should resolve");
        resolved.on_modified(Snapshot::empty(), 0);
        assert_eq!(first.seen.load(Ordering::Relaxed), 0);
        assert_eq!(second.seen.load(Ordering::Relaxed), 1);
    }

    /// Concurrently resolving and revoking must never yield a
    /// partially-initialized or dangling reference.
    #[test]
    fn concurrent_attach_revoke_resolve_stress() {
        let slot = Arc::new(ObserverSlot::new());
        let observer = CountingObserver::new();
        let iterations = 10_000;
        let barrier = Arc::new(Barrier::new(3));

        let flipper = {
            let slot = Arc::clone(&slot);
            let observer = Arc::clone(&observer);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..iterations {
                    if i % 2 == 0 {
                        slot.attach(&observer);
                    } else {
                        slot.revoke();
                    }
                }
            })
        };

        let revoker = {
            let slot = Arc::clone(&slot);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..iterations {
                    slot.revoke();
                }
            })
        };

        let mut resolved_live = 0u64;
        barrier.wait();
        for _ in 0..iterations {
            if let Some(observer) = slot.resolve() {
                // Calling through the reference must always be safe.
                observer.on_inserted(Snapshot::empty(), 0);
                resolved_live += 1;
            }
        }

        flipper.join().expect("flipper panicked");
        revoker.join().expect("revoker panicked");
        eprintln!("[slot_stress] {resolved_live}/{iterations} resolves saw a live observer");
    }
}
