//! Access-ordered group table.
//!
//! A hash map from group key to slot index, paired with an intrusive
//! doubly-linked order over a slab of slots. New keys attach at the
//! most-recently-used end; touching an existing key moves it there.
//! `oldest()` reads the head of the list, so touch, oldest-lookup and
//! eviction are all O(1).
//!
//! Evicted slots go on a free list and are reused before the slab grows,
//! so a steady population of groups settles into a fixed allocation.

use crate::application::ports::GroupStore;
use crate::domain::key::GroupKey;
use crate::domain::state::GroupState;
use std::collections::HashMap;

/// Sentinel index for "no slot".
const NIL: usize = usize::MAX;

#[derive(Debug)]
struct Slot {
    entry: Option<(GroupKey, GroupState)>,
    prev: usize,
    next: usize,
}

/// The in-memory [`GroupStore`] implementation.
#[derive(Debug)]
pub struct GroupTable {
    index: HashMap<GroupKey, usize, ahash::RandomState>,
    slots: Vec<Slot>,
    /// Least recently touched slot.
    head: usize,
    /// Most recently touched slot.
    tail: usize,
    free: Vec<usize>,
}

impl GroupTable {
    /// Create an empty table.
    pub fn new() -> Self {
        GroupTable {
            index: HashMap::with_hasher(ahash::RandomState::new()),
            slots: Vec::new(),
            head: NIL,
            tail: NIL,
            free: Vec::new(),
        }
    }

    /// Unlink a slot from the order without touching its entry.
    fn detach(&mut self, idx: usize) {
        let (prev, next) = (self.slots[idx].prev, self.slots[idx].next);
        match prev {
            NIL => self.head = next,
            p => self.slots[p].next = next,
        }
        match next {
            NIL => self.tail = prev,
            n => self.slots[n].prev = prev,
        }
        self.slots[idx].prev = NIL;
        self.slots[idx].next = NIL;
    }

    /// Attach a detached slot at the most-recently-used end.
    fn attach_tail(&mut self, idx: usize) {
        self.slots[idx].prev = self.tail;
        self.slots[idx].next = NIL;
        match self.tail {
            NIL => self.head = idx,
            t => self.slots[t].next = idx,
        }
        self.tail = idx;
    }

    /// Whether the table tracks `key`.
    pub fn contains(&self, key: &GroupKey) -> bool {
        self.index.contains_key(key)
    }

    fn allocate(&mut self, key: GroupKey, state: GroupState) -> usize {
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx].entry = Some((key, state));
                idx
            }
            None => {
                self.slots.push(Slot {
                    entry: Some((key, state)),
                    prev: NIL,
                    next: NIL,
                });
                self.slots.len() - 1
            }
        }
    }
}

impl Default for GroupTable {
    fn default() -> Self {
        Self::new()
    }
}

impl GroupStore for GroupTable {
    fn touch(&mut self, key: &GroupKey, init: impl FnOnce() -> GroupState) -> &mut GroupState {
        let idx = match self.index.get(key) {
            Some(&idx) => {
                self.detach(idx);
                self.attach_tail(idx);
                idx
            }
            None => {
                let idx = self.allocate(key.clone(), init());
                self.attach_tail(idx);
                self.index.insert(key.clone(), idx);
                idx
            }
        };
        match self.slots[idx].entry.as_mut() {
            Some((_, state)) => state,
            // Indexed slots always hold an entry; the free list and the
            // index are disjoint.
            None => unreachable!("indexed slot without an entry"),
        }
    }

    fn get_mut(&mut self, key: &GroupKey) -> Option<&mut GroupState> {
        let idx = *self.index.get(key)?;
        self.slots[idx].entry.as_mut().map(|(_, state)| state)
    }

    fn oldest(&self) -> Option<(&GroupKey, &GroupState)> {
        if self.head == NIL {
            return None;
        }
        self.slots[self.head]
            .entry
            .as_ref()
            .map(|(key, state)| (key, state))
    }

    fn evict(&mut self, key: &GroupKey) -> Option<GroupState> {
        let idx = self.index.remove(key)?;
        self.detach(idx);
        self.free.push(idx);
        self.slots[idx].entry.take().map(|(_, state)| state)
    }

    fn len(&self) -> usize {
        self.index.len()
    }
}
