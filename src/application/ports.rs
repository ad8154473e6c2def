//! Ports (interfaces) for the application layer.
//!
//! In hexagonal architecture, ports define the interfaces that the application
//! layer needs. Infrastructure adapters implement these ports.

use crate::domain::key::GroupKey;
use crate::domain::state::GroupState;
use std::fmt::Debug;
use std::time::Instant;

/// Port for obtaining current time.
///
/// This abstraction allows the application layer to work with time
/// without depending on system clock implementation details.
/// Infrastructure provides concrete implementations (SystemClock, MockClock).
pub trait Clock: Send + Sync + Debug {
    /// Get the current instant.
    fn now(&self) -> Instant;
}

/// Port for emitting named counter increments.
///
/// The filter never reaches for a process-wide metrics registry; a sink
/// handle is injected at construction time instead. Labels travel with
/// each increment because counters are keyed by `(name, labels)` — the
/// sink (or the recorder behind it) is responsible for caching the
/// counter for a given name and label set.
pub trait CounterSink: Send + Sync + Debug {
    /// Increment the counter identified by `name` and `labels` by `by`.
    fn increment(&self, name: &str, labels: &[(String, String)], by: u64);
}

/// Port for the access-ordered group-state store.
///
/// The store owns every [`GroupState`] exclusively; callers get a mutable
/// borrow for the duration of one record's processing and never retain a
/// reference across calls. Access order must reflect touch order
/// (insertion order for new keys, move-to-end on touch of existing keys)
/// so that [`GroupStore::oldest`] is O(1).
pub trait GroupStore: Debug {
    /// Return the state for `key`, creating it with `init` if absent.
    /// In both cases the key becomes the most recently used entry.
    fn touch(&mut self, key: &GroupKey, init: impl FnOnce() -> GroupState) -> &mut GroupState;

    /// Look up `key` without disturbing the access order.
    fn get_mut(&mut self, key: &GroupKey) -> Option<&mut GroupState>;

    /// The least recently touched entry, if any. Non-destructive.
    fn oldest(&self) -> Option<(&GroupKey, &GroupState)>;

    /// Remove an entry, returning its state if it was present.
    fn evict(&mut self, key: &GroupKey) -> Option<GroupState>;

    /// Number of groups currently tracked.
    fn len(&self) -> usize;

    /// Whether the store tracks no groups.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
