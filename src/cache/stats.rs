//! Pool Statistics Module
//!
//! Tracks lookup hits and misses, writes, and sweeper activity.

use serde::Serialize;

// == Pool Stats ==
/// Counters describing pool activity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Number of successful lookups
    pub hits: u64,
    /// Number of lookups for absent keys
    pub misses: u64,
    /// Number of set calls (inserts and overwrites)
    pub sets: u64,
    /// Number of caller deletes that removed an entry
    pub deletes: u64,
    /// Number of entries removed by the sweeper
    pub evictions: u64,
    /// Number of completed sweeper ticks
    pub sweeps: u64,
    /// Current number of entries in the pool
    pub total_entries: usize,
}

impl PoolStats {
    // == Constructor ==
    /// Creates a new PoolStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the lookup hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_set(&mut self) {
        self.sets += 1;
    }

    pub fn record_delete(&mut self) {
        self.deletes += 1;
    }

    /// Records one finished sweep and the number of entries it evicted.
    pub fn record_sweep(&mut self, evicted: usize) {
        self.sweeps += 1;
        self.evictions += evicted as u64;
    }

    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
