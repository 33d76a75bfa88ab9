//! Cache Facade
//!
//! The single entry point binding a configuration, a pool and an optional
//! sweeper.

mod builder;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::cache::{Key, Pool, PoolStats, SharedPool};
use crate::config::Config;
use crate::diagnostics::{Diagnostics, Severity};
use crate::error::Result;
use crate::tasks::{Sweeper, SweeperConfig, SweeperHandle};

pub use builder::CacheBuilder;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Release maturity of the library.
pub const LIB_STATE: &str = "alpha";

// == Cache ==
/// A key-value cache with optional predicate-driven eviction.
///
/// Every `Cache` owns its pool unless one is passed to
/// [`CacheBuilder::pool`]. Callbacks given to enumeration methods run while
/// the pool lock is held and must not call back into the same cache.
pub struct Cache<V> {
    config: Config,
    pool: SharedPool<V>,
    sweeper: Mutex<Sweeper<V>>,
    diagnostics: Diagnostics,
}

impl<V> Cache<V>
where
    V: Clone + fmt::Debug + Send + Sync + 'static,
{
    // == Constructors ==
    pub fn builder() -> CacheBuilder<V> {
        CacheBuilder::new()
    }

    /// Builds a cache reporting to `tracing`. `None` selects the defaults.
    pub fn new(config: Option<Config>) -> Result<Self> {
        let builder = Self::builder();
        match config {
            Some(config) => builder.config(config).build(),
            None => builder.build(),
        }
    }

    // == Pool Operations ==
    /// Inserts or overwrites an entry and returns the stored value.
    pub fn create(&self, key: impl Into<Key>, value: V) -> V {
        self.pool.write().set(key, value).clone()
    }

    pub fn exists(&self, key: impl Into<Key>) -> bool {
        self.pool.read().has(key)
    }

    /// Looks up a value; None when the key is absent.
    pub fn find(&self, key: impl Into<Key>) -> Option<V> {
        self.pool.write().get(key).cloned()
    }

    /// Removes an entry; false when the key was absent.
    pub fn delete(&self, key: impl Into<Key>) -> bool {
        self.pool.write().delete(key)
    }

    pub fn clear(&self) {
        self.pool.write().clear();
    }

    pub fn size(&self) -> usize {
        self.pool.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.read().is_empty()
    }

    // == Enumeration ==
    pub fn for_each<F>(&self, visitor: F)
    where
        F: FnMut(&V, &Key),
    {
        self.pool.read().for_each(visitor);
    }

    /// Emits every entry to the diagnostics sink, unless the pool is too large.
    pub fn trace_entries(&self) {
        self.pool.read().trace_entries();
    }

    pub fn filter<F>(&self, predicate: F) -> Pool<V>
    where
        F: FnMut(&V, &Key) -> bool,
    {
        self.pool.read().filter(predicate)
    }

    pub fn map<T, F>(&self, transform: F) -> Vec<T>
    where
        F: FnMut(&V, &Key) -> T,
    {
        self.pool.read().map(transform)
    }

    pub fn some<F>(&self, predicate: F) -> bool
    where
        F: FnMut(&V, &Key) -> bool,
    {
        self.pool.read().some(predicate)
    }

    pub fn every<F>(&self, predicate: F) -> bool
    where
        F: FnMut(&V, &Key) -> bool,
    {
        self.pool.read().every(predicate)
    }

    pub fn reduce<A, F>(&self, combine: F, seed: A) -> A
    where
        F: FnMut(A, &V, &Key) -> A,
    {
        self.pool.read().reduce(combine, seed)
    }

    /// First value matching `predicate`, in enumeration order.
    pub fn find_by<F>(&self, predicate: F) -> Option<V>
    where
        F: FnMut(&V, &Key) -> bool,
    {
        self.pool.read().find(predicate).cloned()
    }

    pub fn keys(&self) -> Vec<Key> {
        self.pool.read().keys()
    }

    pub fn values(&self) -> Vec<V> {
        self.pool.read().values()
    }

    pub fn entries(&self) -> Vec<(Key, V)> {
        self.pool.read().entries()
    }

    pub fn first(&self) -> Option<(Key, V)> {
        self.pool
            .read()
            .first()
            .map(|(key, value)| (key.clone(), value.clone()))
    }

    pub fn last(&self) -> Option<(Key, V)> {
        self.pool
            .read()
            .last()
            .map(|(key, value)| (key.clone(), value.clone()))
    }

    pub fn stats(&self) -> PoolStats {
        self.pool.read().stats()
    }

    // == Sweeper Control ==
    /// Starts (or restarts) the sweeper. `Ok(None)` when sweeping is disabled.
    pub fn start_sweeper(&self, config: SweeperConfig<V>) -> Result<Option<SweeperHandle>> {
        self.sweeper.lock().start(config)
    }

    /// Changes the sweeper interval, keeping its predicate.
    pub fn reconfigure_sweeper(&self, interval: Duration) -> Result<Option<SweeperHandle>> {
        self.sweeper.lock().reconfigure(interval)
    }

    /// Stops the sweeper. Safe to call when none is running.
    pub fn destroy_sweeper(&self) -> bool {
        self.sweeper.lock().stop()
    }

    pub fn sweeper_active(&self) -> bool {
        self.sweeper.lock().is_active()
    }

    /// Runs the installed sweeper predicate once, right now.
    ///
    /// Returns the number of evicted entries; 0 when no predicate is installed.
    pub fn sweep_now(&self) -> usize {
        let Some(config) = self.sweeper.lock().config().cloned() else {
            self.diagnostics
                .emit(Severity::Warn, "Cache.sweep_now", "no sweeper predicate installed");
            return 0;
        };
        self.pool
            .write()
            .sweep(|value, key| config.evaluate(value, key))
    }

    // == Accessors ==
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shared handle to the underlying pool.
    pub fn pool(&self) -> SharedPool<V> {
        Arc::clone(&self.pool)
    }

    pub fn version(&self) -> &'static str {
        VERSION
    }

    pub fn lib_state(&self) -> &'static str {
        LIB_STATE
    }
}

impl<V> fmt::Debug for Cache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("config", &self.config)
            .field("size", &self.pool.read().len())
            .field("sweeper", &*self.sweeper.lock())
            .finish()
    }
}
