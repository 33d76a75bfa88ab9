//! Sweeper Task
//!
//! Background task that periodically evicts pool entries matching a predicate.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::cache::{Key, SharedPool};
use crate::diagnostics::{Diagnostics, Severity};
use crate::error::{CacheError, Result};

/// Eviction predicate: returns true when the entry should be evicted.
pub type Predicate<V> = Arc<dyn Fn(&V, &Key) -> bool + Send + Sync>;

// == Sweeper Config ==
/// Predicate and tick interval for a sweeper.
pub struct SweeperConfig<V> {
    predicate: Predicate<V>,
    interval: Duration,
}

impl<V> SweeperConfig<V> {
    /// Creates a config evicting entries for which `predicate` returns true.
    ///
    /// The predicate runs while the pool write lock is held and must not
    /// call back into the same pool or cache; the lock is not re-entrant.
    pub fn new<F>(predicate: F, interval: Duration) -> Self
    where
        F: Fn(&V, &Key) -> bool + Send + Sync + 'static,
    {
        Self::from_predicate(Arc::new(predicate), interval)
    }

    pub fn from_predicate(predicate: Predicate<V>, interval: Duration) -> Self {
        Self {
            predicate,
            interval,
        }
    }

    /// A config that evicts every entry on every tick.
    pub fn evict_all(interval: Duration) -> Self {
        Self::new(|_, _| true, interval)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn predicate(&self) -> &Predicate<V> {
        &self.predicate
    }

    /// Same predicate, new interval.
    pub fn with_interval(&self, interval: Duration) -> Self {
        Self {
            predicate: Arc::clone(&self.predicate),
            interval,
        }
    }

    /// Whether a timer can be scheduled at this interval: non-zero and not
    /// so large that the first deadline overflows the clock.
    pub fn is_schedulable(&self) -> bool {
        first_tick_at(self.interval).is_ok()
    }

    /// Returns true if the entry is eligible for eviction.
    pub fn evaluate(&self, value: &V, key: &Key) -> bool {
        (self.predicate)(value, key)
    }
}

impl<V> Clone for SweeperConfig<V> {
    fn clone(&self) -> Self {
        self.with_interval(self.interval)
    }
}

impl<V> fmt::Debug for SweeperConfig<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SweeperConfig")
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

// == Sweeper Handle ==
/// Identifies one started sweeper timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SweeperHandle {
    generation: u64,
}

impl SweeperHandle {
    /// Increases by one on every start or reconfigure.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

// == Sweeper ==
/// Periodic eviction bound to one pool.
///
/// At most one timer task exists at a time: starting again retires the
/// previous task first. Dropping the sweeper stops it.
pub struct Sweeper<V> {
    /// Pool the ticks evict from
    pool: SharedPool<V>,
    /// Administrative switch from the cache configuration
    enabled: bool,
    /// Runtime the timer task is spawned on
    runtime: Option<Handle>,
    /// Last installed config, kept across stop for reconfigure
    config: Option<SweeperConfig<V>>,
    /// Running timer task
    task: Option<JoinHandle<()>>,
    /// Generation of the most recent start
    generation: u64,
    diagnostics: Diagnostics,
}

impl<V> Sweeper<V>
where
    V: fmt::Debug + Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates an inactive sweeper for `pool`.
    ///
    /// The current tokio runtime, if any, is captured for later starts.
    pub fn new(pool: SharedPool<V>, enabled: bool, diagnostics: Diagnostics) -> Self {
        Self {
            pool,
            enabled,
            runtime: Handle::try_current().ok(),
            config: None,
            task: None,
            generation: 0,
            diagnostics,
        }
    }

    /// Uses `runtime` to drive the timer instead of the ambient runtime.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    // == Start ==
    /// Installs a timer that sweeps the pool every `config.interval()`.
    ///
    /// Returns `Ok(None)` without side effects when the sweeper is disabled.
    /// A running timer is retired before the new one is spawned.
    pub fn start(&mut self, config: SweeperConfig<V>) -> Result<Option<SweeperHandle>> {
        if !self.enabled {
            self.diagnostics.emit(
                Severity::Warn,
                "Sweeper.start",
                "sweeper is disabled by configuration; start ignored",
            );
            return Ok(None);
        }

        let first_tick = match first_tick_at(config.interval()) {
            Ok(deadline) => deadline,
            Err(reason) => {
                self.diagnostics.emit(Severity::Error, "Sweeper.start", reason);
                return Err(CacheError::InvalidConfig(reason.to_string()));
            }
        };

        let Some(runtime) = self.runtime.clone().or_else(|| Handle::try_current().ok()) else {
            self.diagnostics.emit(
                Severity::Error,
                "Sweeper.start",
                "no tokio runtime available to drive the sweeper",
            );
            return Err(CacheError::RuntimeUnavailable);
        };

        if self.retire() {
            self.diagnostics
                .emit(Severity::Debug, "Sweeper.start", "previous sweeper timer retired");
        }

        self.generation += 1;
        let generation = self.generation;
        let task = runtime.spawn(run_sweeper(
            Arc::clone(&self.pool),
            config.clone(),
            first_tick,
            self.diagnostics.clone(),
            generation,
        ));

        self.diagnostics.emit_with(Severity::Info, "Sweeper.start", || {
            format!(
                "sweeper started (generation {}, interval {:?})",
                generation,
                config.interval()
            )
        });

        self.task = Some(task);
        self.config = Some(config);
        self.runtime = Some(runtime);
        Ok(Some(SweeperHandle { generation }))
    }

    // == Stop ==
    /// Cancels the next tick. Returns false if no timer was running.
    ///
    /// A tick already in progress runs to completion.
    pub fn stop(&mut self) -> bool {
        let stopped = self.retire();
        let message = if stopped {
            "sweeper stopped"
        } else {
            "sweeper was not running"
        };
        self.diagnostics.emit(Severity::Info, "Sweeper.stop", message);
        stopped
    }

    // == Reconfigure ==
    /// Restarts the timer with a new interval and the current predicate.
    ///
    /// Without a previously installed predicate this is a no-op.
    pub fn reconfigure(&mut self, interval: Duration) -> Result<Option<SweeperHandle>> {
        if !self.enabled {
            self.diagnostics.emit(
                Severity::Warn,
                "Sweeper.reconfigure",
                "sweeper is disabled by configuration; reconfigure ignored",
            );
            return Ok(None);
        }

        let Some(config) = self.config.as_ref().map(|c| c.with_interval(interval)) else {
            self.diagnostics.emit(
                Severity::Warn,
                "Sweeper.reconfigure",
                "no predicate installed; reconfigure ignored",
            );
            return Ok(None);
        };

        self.diagnostics.emit_with(Severity::Info, "Sweeper.reconfigure", || {
            format!("sweeper interval set to {:?}", interval)
        });
        self.start(config)
    }
}

impl<V> Sweeper<V> {
    /// Whether a timer task is currently installed.
    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The most recently installed config.
    pub fn config(&self) -> Option<&SweeperConfig<V>> {
        self.config.as_ref()
    }

    fn retire(&mut self) -> bool {
        match self.task.take() {
            Some(task) => {
                task.abort();
                true
            }
            None => false,
        }
    }
}

impl<V> Drop for Sweeper<V> {
    fn drop(&mut self) {
        self.retire();
    }
}

impl<V> fmt::Debug for Sweeper<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sweeper")
            .field("enabled", &self.enabled)
            .field("active", &self.is_active())
            .field("generation", &self.generation)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Deadline of the first tick, one interval from now.
fn first_tick_at(interval: Duration) -> std::result::Result<Instant, &'static str> {
    if interval.is_zero() {
        return Err("sweeper interval must be non-zero");
    }
    Instant::now()
        .checked_add(interval)
        .ok_or("sweeper interval is too large to schedule")
}

/// Timer loop. The first tick fires at `first_tick`, one interval after start.
async fn run_sweeper<V>(
    pool: SharedPool<V>,
    config: SweeperConfig<V>,
    first_tick: Instant,
    diagnostics: Diagnostics,
    generation: u64,
) where
    V: fmt::Debug + Send + Sync + 'static,
{
    let mut ticker = interval_at(first_tick, config.interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        // No await while the write lock is held
        let (evicted, remaining) = {
            let mut guard = pool.write();
            let evicted = guard.sweep(|value, key| config.evaluate(value, key));
            (evicted, guard.len())
        };

        diagnostics.emit_with(Severity::Debug, "Sweeper.tick", || {
            format!(
                "generation {}: evicted {} entries, {} remaining",
                generation, evicted, remaining
            )
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Pool;
    use crate::diagnostics::MemorySink;
    use tokio::time::sleep;

    fn seeded_pool() -> SharedPool<u32> {
        let mut pool = Pool::new();
        pool.set("a", 1);
        pool.set("b", 2);
        pool.set("tmp:c", 3);
        pool.into_shared()
    }

    fn sweeps(pool: &SharedPool<u32>) -> u64 {
        pool.read().stats().sweeps
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_evicts_all_on_tick() {
        let pool = seeded_pool();
        let mut sweeper = Sweeper::new(pool.clone(), true, Diagnostics::disabled());

        sweeper
            .start(SweeperConfig::evict_all(Duration::from_millis(10)))
            .unwrap();

        sleep(Duration::from_millis(15)).await;

        assert!(pool.read().is_empty());
        assert_eq!(sweeps(&pool), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_first_tick_waits_one_interval() {
        let pool = seeded_pool();
        let mut sweeper = Sweeper::new(pool.clone(), true, Diagnostics::disabled());

        sweeper
            .start(SweeperConfig::evict_all(Duration::from_millis(10)))
            .unwrap();

        sleep(Duration::from_millis(5)).await;
        assert_eq!(pool.read().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_keeps_non_matching_entries() {
        let pool = seeded_pool();
        let mut sweeper = Sweeper::new(pool.clone(), true, Diagnostics::disabled());

        sweeper
            .start(SweeperConfig::new(
                |value: &u32, _: &Key| *value >= 2,
                Duration::from_millis(10),
            ))
            .unwrap();

        sleep(Duration::from_millis(15)).await;

        let mut guard = pool.write();
        assert_eq!(guard.len(), 1);
        assert_eq!(guard.get("a"), Some(&1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_double_start_keeps_single_cadence() {
        let pool = seeded_pool();
        let mut sweeper = Sweeper::new(pool.clone(), true, Diagnostics::disabled());

        let first = sweeper
            .start(SweeperConfig::new(|_: &u32, _: &Key| false, Duration::from_millis(10)))
            .unwrap()
            .unwrap();
        let second = sweeper
            .start(SweeperConfig::new(|_: &u32, _: &Key| false, Duration::from_millis(10)))
            .unwrap()
            .unwrap();
        assert_eq!(second.generation(), first.generation() + 1);

        sleep(Duration::from_millis(35)).await;

        assert_eq!(sweeps(&pool), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_stop_cancels_ticks() {
        let pool = seeded_pool();
        let mut sweeper = Sweeper::new(pool.clone(), true, Diagnostics::disabled());

        sweeper
            .start(SweeperConfig::new(|_: &u32, _: &Key| false, Duration::from_millis(10)))
            .unwrap();
        sleep(Duration::from_millis(15)).await;
        assert_eq!(sweeps(&pool), 1);

        assert!(sweeper.stop());
        assert!(!sweeper.is_active());
        sleep(Duration::from_millis(50)).await;
        assert_eq!(sweeps(&pool), 1);

        assert!(!sweeper.stop());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_reconfigure_preserves_predicate() {
        let pool = seeded_pool();
        let mut sweeper = Sweeper::new(pool.clone(), true, Diagnostics::disabled());

        sweeper
            .start(SweeperConfig::new(
                |_: &u32, key: &Key| key.to_string().starts_with("tmp:"),
                Duration::from_secs(3600),
            ))
            .unwrap();

        let handle = sweeper.reconfigure(Duration::from_millis(10)).unwrap();
        assert!(handle.is_some());
        assert_eq!(
            sweeper.config().map(|c| c.interval()),
            Some(Duration::from_millis(10))
        );

        sleep(Duration::from_millis(15)).await;

        let guard = pool.read();
        assert_eq!(guard.keys(), vec![Key::from("a"), Key::from("b")]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_disabled_start_is_noop() {
        let pool = seeded_pool();
        let sink = Arc::new(MemorySink::new());
        let mut sweeper = Sweeper::new(pool.clone(), false, Diagnostics::new(sink.clone(), true));

        let handle = sweeper
            .start(SweeperConfig::evict_all(Duration::from_millis(10)))
            .unwrap();
        assert!(handle.is_none());
        assert!(!sweeper.is_active());

        sleep(Duration::from_millis(50)).await;
        assert_eq!(pool.read().len(), 3);

        let events = sink.events_named("Sweeper.start");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].severity, Severity::Warn);
    }

    #[tokio::test]
    async fn test_sweeper_reconfigure_without_predicate_is_noop() {
        let mut sweeper = Sweeper::new(seeded_pool(), true, Diagnostics::disabled());

        let handle = sweeper.reconfigure(Duration::from_millis(10)).unwrap();

        assert!(handle.is_none());
        assert!(!sweeper.is_active());
    }

    #[tokio::test]
    async fn test_sweeper_rejects_zero_interval() {
        let mut sweeper = Sweeper::new(seeded_pool(), true, Diagnostics::disabled());

        let result = sweeper.start(SweeperConfig::evict_all(Duration::ZERO));

        assert!(matches!(result, Err(CacheError::InvalidConfig(_))));
        assert!(!sweeper.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_rejects_unschedulable_interval() {
        let pool = seeded_pool();
        let sink = Arc::new(MemorySink::new());
        let mut sweeper = Sweeper::new(pool.clone(), true, Diagnostics::new(sink.clone(), true));

        let result = sweeper.start(SweeperConfig::evict_all(Duration::MAX));

        assert!(matches!(result, Err(CacheError::InvalidConfig(_))));
        assert!(!sweeper.is_active());
        assert!(!SweeperConfig::<u32>::evict_all(Duration::MAX).is_schedulable());
        assert!(sink
            .events_named("Sweeper.start")
            .iter()
            .any(|e| e.severity == Severity::Error));

        sleep(Duration::from_millis(50)).await;
        assert_eq!(pool.read().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_disabled_reconfigure_is_noop() {
        let pool = seeded_pool();
        let sink = Arc::new(MemorySink::new());
        let mut sweeper = Sweeper::new(pool.clone(), false, Diagnostics::new(sink.clone(), true));

        let handle = sweeper.reconfigure(Duration::from_millis(10)).unwrap();
        assert!(handle.is_none());
        assert!(!sweeper.is_active());

        sleep(Duration::from_millis(50)).await;
        assert_eq!(pool.read().len(), 3);
        assert_eq!(sweeps(&pool), 0);

        let events = sink.events_named("Sweeper.reconfigure");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].severity, Severity::Warn);
    }

    #[test]
    fn test_sweeper_without_runtime() {
        let mut sweeper = Sweeper::new(seeded_pool(), true, Diagnostics::disabled());

        let result = sweeper.start(SweeperConfig::evict_all(Duration::from_millis(10)));

        assert_eq!(result, Err(CacheError::RuntimeUnavailable));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_drop_releases_pool() {
        let pool = seeded_pool();
        let mut sweeper = Sweeper::new(pool.clone(), true, Diagnostics::disabled());
        sweeper
            .start(SweeperConfig::evict_all(Duration::from_millis(10)))
            .unwrap();
        assert_eq!(Arc::strong_count(&pool), 3);

        drop(sweeper);
        sleep(Duration::from_millis(1)).await;

        assert_eq!(Arc::strong_count(&pool), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_tolerates_foreground_deletes() {
        let pool = seeded_pool();
        let mut sweeper = Sweeper::new(pool.clone(), true, Diagnostics::disabled());
        sweeper
            .start(SweeperConfig::evict_all(Duration::from_millis(10)))
            .unwrap();

        assert!(pool.write().delete("a"));
        sleep(Duration::from_millis(15)).await;

        let stats = pool.read().stats();
        assert_eq!(stats.total_entries, 0);
        assert_eq!(stats.deletes, 1);
        assert_eq!(stats.evictions, 2);
    }
}
