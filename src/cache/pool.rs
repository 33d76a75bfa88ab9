//! Pool Module
//!
//! The key-value store at the center of the cache. All reads and writes of
//! the mapping go through `Pool`; enumeration follows insertion order.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::cache::{Key, OrderTracker, PoolStats, TRACE_ENTRY_LIMIT};
use crate::diagnostics::{Diagnostics, Severity};

/// A pool shared between the cache facade and its sweeper.
pub type SharedPool<V> = Arc<RwLock<Pool<V>>>;

// == Pool ==
/// In-memory key-value mapping with insertion-ordered enumeration.
pub struct Pool<V> {
    /// Key-value storage
    entries: HashMap<Key, V>,
    /// Enumeration order
    order: OrderTracker,
    /// Activity counters
    stats: PoolStats,
    /// Event reporting
    diagnostics: Diagnostics,
    /// Size above which a warning is emitted; never enforced
    advisory_max: Option<usize>,
}

impl<V> Pool<V> {
    // == Constructor ==
    /// Creates an empty pool that emits no diagnostics.
    pub fn new() -> Self {
        Self::with_diagnostics(Diagnostics::disabled())
    }

    /// Creates an empty pool reporting through `diagnostics`.
    pub fn with_diagnostics(diagnostics: Diagnostics) -> Self {
        Self {
            entries: HashMap::new(),
            order: OrderTracker::new(),
            stats: PoolStats::new(),
            diagnostics,
            advisory_max: None,
        }
    }

    /// Sets the advisory size limit.
    pub fn with_advisory_max(mut self, max: Option<usize>) -> Self {
        self.advisory_max = max;
        self
    }

    /// Wraps the pool in a shared handle.
    pub fn into_shared(self) -> SharedPool<V> {
        Arc::new(RwLock::new(self))
    }

    // == Length ==
    /// Returns the current number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // == Has ==
    pub fn has(&self, key: impl Into<Key>) -> bool {
        self.entries.contains_key(&key.into())
    }

    // == Iteration ==
    /// Iterates entries in enumeration order.
    pub fn iter(&self) -> impl Iterator<Item = (&Key, &V)> + '_ {
        self.order
            .iter()
            .filter_map(move |key| self.entries.get_key_value(key))
    }

    /// Applies `visitor` to every (value, key) pair in enumeration order.
    pub fn for_each<F>(&self, mut visitor: F)
    where
        F: FnMut(&V, &Key),
    {
        for (key, value) in self.iter() {
            visitor(value, key);
        }
        self.diagnostics
            .emit(Severity::Debug, "Pool.for_each", "pool iterated");
    }

    // == Aggregates ==
    /// Produces one element per entry, in enumeration order.
    pub fn map<T, F>(&self, mut transform: F) -> Vec<T>
    where
        F: FnMut(&V, &Key) -> T,
    {
        self.iter().map(|(key, value)| transform(value, key)).collect()
    }

    /// Returns true if any entry matches. Stops at the first match.
    pub fn some<F>(&self, mut predicate: F) -> bool
    where
        F: FnMut(&V, &Key) -> bool,
    {
        self.iter().any(|(key, value)| predicate(value, key))
    }

    /// Returns true if every entry matches. True for an empty pool.
    pub fn every<F>(&self, mut predicate: F) -> bool
    where
        F: FnMut(&V, &Key) -> bool,
    {
        self.iter().all(|(key, value)| predicate(value, key))
    }

    /// Left-folds the entries in enumeration order.
    pub fn reduce<A, F>(&self, mut combine: F, seed: A) -> A
    where
        F: FnMut(A, &V, &Key) -> A,
    {
        self.iter()
            .fold(seed, |acc, (key, value)| combine(acc, value, key))
    }

    /// Returns the first value matching `predicate`.
    pub fn find<F>(&self, mut predicate: F) -> Option<&V>
    where
        F: FnMut(&V, &Key) -> bool,
    {
        self.find_entry(|value, key| predicate(value, key))
            .map(|(_, value)| value)
    }

    /// Returns the first entry matching `predicate`.
    pub fn find_entry<F>(&self, mut predicate: F) -> Option<(&Key, &V)>
    where
        F: FnMut(&V, &Key) -> bool,
    {
        let found = self.iter().find(|(key, value)| predicate(value, key));
        if found.is_none() {
            self.diagnostics
                .emit(Severity::Debug, "Pool.find", "no entry matched");
        }
        found
    }

    // == Positional Access ==
    pub fn first(&self) -> Option<(&Key, &V)> {
        self.order
            .first()
            .and_then(|key| self.entries.get_key_value(key))
    }

    /// Entry at position `len() - 1`; None on an empty pool.
    pub fn last(&self) -> Option<(&Key, &V)> {
        self.order
            .last()
            .and_then(|key| self.entries.get_key_value(key))
    }

    // == Snapshots ==
    /// Returns the keys in enumeration order.
    pub fn keys(&self) -> Vec<Key> {
        self.order.iter().cloned().collect()
    }

    // == Stats ==
    /// Returns current pool statistics.
    pub fn stats(&self) -> PoolStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }
}

impl<V: fmt::Debug> Pool<V> {
    // == Set ==
    /// Inserts or overwrites an entry and returns the stored value.
    ///
    /// Overwriting keeps the key's enumeration position.
    pub fn set(&mut self, key: impl Into<Key>, value: V) -> &V {
        let key = key.into();
        self.diagnostics.emit_with(Severity::Info, "Pool.set", || {
            format!("key={} value={:?}", key, value)
        });

        self.order.track(&key);
        self.stats.record_set();

        if let Some(max) = self.advisory_max {
            let size = self.entries.len() + usize::from(!self.entries.contains_key(&key));
            if size > max {
                self.diagnostics.emit_with(Severity::Warn, "Pool.set", || {
                    format!("pool size {} exceeds advisory maximum {}", size, max)
                });
            }
        }

        match self.entries.entry(key) {
            Entry::Occupied(mut slot) => {
                slot.insert(value);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(value),
        }
    }

    // == Get ==
    /// Looks up a value. A missing key yields None and a miss diagnostic.
    pub fn get(&mut self, key: impl Into<Key>) -> Option<&V> {
        let key = key.into();
        match self.entries.get(&key) {
            Some(value) => {
                self.stats.record_hit();
                self.diagnostics.emit_with(Severity::Debug, "Pool.get", || {
                    format!("key={} value={:?}", key, value)
                });
                Some(value)
            }
            None => {
                self.stats.record_miss();
                self.diagnostics.emit_with(Severity::Warn, "Pool.get", || {
                    format!("key={} not found", key)
                });
                None
            }
        }
    }

    // == Delete ==
    /// Removes an entry. Returns false if the key was absent.
    pub fn delete(&mut self, key: impl Into<Key>) -> bool {
        let key = key.into();
        let removed = self.remove_entry(&key).is_some();
        if removed {
            self.stats.record_delete();
        }
        self.diagnostics.emit_with(Severity::Info, "Pool.delete", || {
            format!("key={} removed={}", key, removed)
        });
        removed
    }

    // == Clear ==
    /// Removes every entry.
    pub fn clear(&mut self) {
        let count = self.entries.len();
        self.entries.clear();
        self.order.clear();
        self.diagnostics.emit_with(Severity::Info, "Pool.clear", || {
            format!("pool cleared ({} entries)", count)
        });
    }

    // == Trace Entries ==
    /// Emits one diagnostics event per entry.
    ///
    /// Pools above the trace limit are skipped with a single warning.
    pub fn trace_entries(&self) {
        if !self.diagnostics.is_enabled() {
            return;
        }
        if self.entries.len() > TRACE_ENTRY_LIMIT {
            self.diagnostics.emit_with(Severity::Warn, "Pool.for_each", || {
                format!(
                    "pool holds {} entries (limit {}); default trace skipped",
                    self.entries.len(),
                    TRACE_ENTRY_LIMIT
                )
            });
            return;
        }
        for (key, value) in self.iter() {
            self.diagnostics.emit_with(Severity::Info, "Pool.for_each", || {
                format!("key={} value={:?}", key, value)
            });
        }
    }

    // == Sweep ==
    /// Runs one eviction pass and returns the number of evicted entries.
    ///
    /// Eligible keys are collected from a snapshot before anything is
    /// removed. A predicate that panics keeps its entry.
    pub fn sweep<F>(&mut self, predicate: F) -> usize
    where
        F: Fn(&V, &Key) -> bool,
    {
        let eligible: Vec<Key> = self
            .iter()
            .filter_map(|(key, value)| {
                match catch_unwind(AssertUnwindSafe(|| predicate(value, key))) {
                    Ok(true) => Some(key.clone()),
                    Ok(false) => None,
                    Err(_) => {
                        self.diagnostics.emit_with(Severity::Error, "Sweeper.tick", || {
                            format!("predicate panicked for key={}; entry kept", key)
                        });
                        None
                    }
                }
            })
            .collect();

        let mut evicted = 0;
        for key in eligible {
            if self.remove_entry(&key).is_some() {
                evicted += 1;
                self.diagnostics.emit_with(Severity::Debug, "Sweeper.evict", || {
                    format!("key={} evicted", key)
                });
            }
        }

        self.stats.record_sweep(evicted);
        evicted
    }

    fn remove_entry(&mut self, key: &Key) -> Option<V> {
        let removed = self.entries.remove(key);
        if removed.is_some() {
            self.order.remove(key);
        }
        removed
    }
}

impl<V: Clone + fmt::Debug> Pool<V> {
    // == Filter ==
    /// Builds a new pool holding the matching entries. The source is untouched.
    pub fn filter<F>(&self, mut predicate: F) -> Pool<V>
    where
        F: FnMut(&V, &Key) -> bool,
    {
        let mut subset = Pool::with_diagnostics(self.diagnostics.clone());
        for (key, value) in self.iter() {
            if predicate(value, key) {
                subset.entries.insert(key.clone(), value.clone());
                subset.order.track(key);
            }
        }
        subset
    }

    /// Returns the values in enumeration order.
    pub fn values(&self) -> Vec<V> {
        self.iter().map(|(_, value)| value.clone()).collect()
    }

    /// Returns the (key, value) pairs in enumeration order.
    pub fn entries(&self) -> Vec<(Key, V)> {
        self.iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

impl<V> Default for Pool<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: fmt::Debug> fmt::Debug for Pool<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
