//! Insertion Order Module
//!
//! Tracks the enumeration order of pool keys.

use std::collections::{BTreeMap, HashMap};

use crate::cache::Key;

// == Order Tracker ==
/// Tracks keys in insertion order.
///
/// Every newly tracked key receives the next sequence number, so iterating
/// `by_seq` yields keys oldest first. Re-tracking a present key keeps its
/// position.
#[derive(Debug, Default, Clone)]
pub struct OrderTracker {
    /// Next sequence number to hand out
    next_seq: u64,
    /// Sequence number -> key, in enumeration order
    by_seq: BTreeMap<u64, Key>,
    /// Key -> sequence number
    by_key: HashMap<Key, u64>,
}

impl OrderTracker {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Track ==
    /// Appends a key to the order unless it is already tracked.
    pub fn track(&mut self, key: &Key) {
        if self.by_key.contains_key(key) {
            return;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.by_seq.insert(seq, key.clone());
        self.by_key.insert(key.clone(), seq);
    }

    // == Remove ==
    /// Removes a key from the order. Unknown keys are ignored.
    pub fn remove(&mut self, key: &Key) {
        if let Some(seq) = self.by_key.remove(key) {
            self.by_seq.remove(&seq);
        }
    }

    // == Clear ==
    pub fn clear(&mut self) {
        self.by_seq.clear();
        self.by_key.clear();
    }

    // == Iteration ==
    /// Iterates keys oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Key> + '_ {
        self.by_seq.values()
    }

    // == Positional Access ==
    /// Returns the oldest tracked key.
    pub fn first(&self) -> Option<&Key> {
        self.by_seq.values().next()
    }

    /// Returns the newest tracked key.
    pub fn last(&self) -> Option<&Key> {
        self.by_seq.values().next_back()
    }

    // == Length ==
    pub fn len(&self) -> usize {
        self.by_seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_seq.is_empty()
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.by_key.contains_key(key)
    }
}
