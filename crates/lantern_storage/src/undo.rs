//! Bounded undo history.
//!
//! A ring of state snapshots. The newest snapshot is the current state, so
//! undoing needs at least two entries: the newest is dropped and the one
//! before it becomes current.

use std::collections::VecDeque;

use crate::state::RuntimeState;

/// Ring buffer of state snapshots for `undo`.
#[derive(Clone, Debug)]
pub struct UndoRing {
    /// Snapshots in chronological order.
    snapshots: VecDeque<RuntimeState>,
    /// Maximum number of snapshots to retain.
    capacity: usize,
}

impl UndoRing {
    /// Creates an empty ring with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            snapshots: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    /// Returns the capacity of the ring.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of snapshots held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Returns true if no snapshot is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Pushes a snapshot, evicting the oldest if at capacity.
    pub fn push(&mut self, snapshot: RuntimeState) {
        if self.capacity == 0 {
            return;
        }
        if self.snapshots.len() >= self.capacity {
            self.snapshots.pop_front();
        }
        self.snapshots.push_back(snapshot);
    }

    /// Returns the newest snapshot.
    #[must_use]
    pub fn latest(&self) -> Option<&RuntimeState> {
        self.snapshots.back()
    }

    /// Drops the newest snapshot and returns a copy of the one before it.
    ///
    /// Returns `None`, leaving the ring unchanged, if fewer than two
    /// snapshots are held.
    pub fn undo(&mut self) -> Option<RuntimeState> {
        if self.snapshots.len() < 2 {
            return None;
        }
        self.snapshots.pop_back();
        self.snapshots.back().cloned()
    }

    /// Drops every snapshot.
    pub fn clear(&mut self) {
        self.snapshots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(room: &str) -> RuntimeState {
        let mut state = RuntimeState::new();
        state.set_location(room);
        state
    }

    #[test]
    fn undo_needs_two_snapshots() {
        let mut ring = UndoRing::new(5);
        assert!(ring.undo().is_none());
        ring.push(at("a"));
        assert!(ring.undo().is_none());
        assert_eq!(ring.len(), 1);
    }

    #[test]
    fn undo_returns_previous_snapshot() {
        let mut ring = UndoRing::new(5);
        ring.push(at("a"));
        ring.push(at("b"));
        ring.push(at("c"));
        assert_eq!(ring.undo().map(|s| s.location().to_string()), Some("b".into()));
        assert_eq!(ring.undo().map(|s| s.location().to_string()), Some("a".into()));
        assert!(ring.undo().is_none());
    }

    #[test]
    fn oldest_is_evicted_at_capacity() {
        let mut ring = UndoRing::new(2);
        ring.push(at("a"));
        ring.push(at("b"));
        ring.push(at("c"));
        assert_eq!(ring.len(), 2);
        assert_eq!(ring.undo().map(|s| s.location().to_string()), Some("b".into()));
        assert!(ring.undo().is_none());
    }

    mod properties {
        use proptest::prelude::*;

        use super::super::UndoRing;
        use super::at;

        proptest! {
            #[test]
            fn never_exceeds_capacity(capacity in 0usize..8, pushes in 0usize..32) {
                let mut ring = UndoRing::new(capacity);
                for i in 0..pushes {
                    ring.push(at(&i.to_string()));
                }
                prop_assert!(ring.len() <= capacity);
            }
        }
    }
}
