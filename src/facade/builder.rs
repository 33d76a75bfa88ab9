//! Cache Builder
//!
//! Assembles configuration, diagnostics sink, pool and sweeper into a `Cache`.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;

use super::Cache;
use crate::cache::{Key, Pool, SharedPool};
use crate::config::{Config, DEFAULT_SWEEPER_INTERVAL_MS};
use crate::diagnostics::{Diagnostics, DiagnosticsSink, Severity, TracingSink};
use crate::error::{CacheError, Result};
use crate::tasks::{Predicate, Sweeper, SweeperConfig};

type SinkFactory = Box<dyn FnOnce(&Config) -> Result<Arc<dyn DiagnosticsSink>> + Send>;

enum SinkSource {
    Tracing,
    Ready(Arc<dyn DiagnosticsSink>),
    Factory(SinkFactory),
}

enum SweeperSource<V> {
    Config(SweeperConfig<V>),
    /// Interval comes from `Config::sweeper_interval`
    Predicate(Predicate<V>),
}

// == Cache Builder ==
/// Builder for [`Cache`].
pub struct CacheBuilder<V> {
    config: Option<Config>,
    sink: SinkSource,
    pool: Option<SharedPool<V>>,
    sweeper: Option<SweeperSource<V>>,
    runtime: Option<Handle>,
}

impl<V> CacheBuilder<V>
where
    V: Clone + fmt::Debug + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            config: None,
            sink: SinkSource::Tracing,
            pool: None,
            sweeper: None,
            runtime: None,
        }
    }

    /// Sets the configuration. Without one, defaults apply.
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Reports diagnostics to `sink` instead of `tracing`.
    pub fn sink(mut self, sink: Arc<dyn DiagnosticsSink>) -> Self {
        self.sink = SinkSource::Ready(sink);
        self
    }

    /// Builds the sink from the resolved configuration at `build` time.
    ///
    /// A factory error fails the build.
    pub fn sink_factory<F>(mut self, factory: F) -> Self
    where
        F: FnOnce(&Config) -> Result<Arc<dyn DiagnosticsSink>> + Send + 'static,
    {
        self.sink = SinkSource::Factory(Box::new(factory));
        self
    }

    /// Uses an existing shared pool instead of creating a fresh one.
    pub fn pool(mut self, pool: SharedPool<V>) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Sweeper predicate and interval, started at build time when enabled.
    pub fn sweeper(mut self, config: SweeperConfig<V>) -> Self {
        self.sweeper = Some(SweeperSource::Config(config));
        self
    }

    /// Sweeper predicate ticking at the configured `sweeper_interval_ms`.
    pub fn sweep_when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&V, &Key) -> bool + Send + Sync + 'static,
    {
        self.sweeper = Some(SweeperSource::Predicate(Arc::new(predicate)));
        self
    }

    /// Drives the sweeper on `runtime` instead of the ambient one.
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    // == Build ==
    /// Builds the cache.
    ///
    /// # Errors
    /// - `Initialization` when the sink factory fails
    /// - `RuntimeUnavailable` when the sweeper must start outside a tokio runtime
    ///
    /// A sweeper interval that cannot be scheduled (zero, or overflowing the
    /// clock) falls back to `DEFAULT_SWEEPER_INTERVAL_MS` with a warning.
    pub fn build(self) -> Result<Cache<V>> {
        let defaulted = self.config.is_none();
        let config = self.config.unwrap_or_default();

        let sink = match self.sink {
            SinkSource::Tracing => Arc::new(TracingSink::new()) as Arc<dyn DiagnosticsSink>,
            SinkSource::Ready(sink) => sink,
            SinkSource::Factory(factory) => factory(&config).map_err(|e| match e {
                CacheError::Initialization(_) => e,
                other => CacheError::Initialization(format!("diagnostics sink: {}", other)),
            })?,
        };
        let diagnostics = Diagnostics::new(sink, config.debug_mode);

        if defaulted {
            diagnostics.emit(
                Severity::Warn,
                "Cache.new",
                "no configuration provided; using defaults",
            );
        }

        let pool = self.pool.unwrap_or_else(|| {
            Pool::with_diagnostics(diagnostics.clone())
                .with_advisory_max(config.max_cache_size)
                .into_shared()
        });

        let mut sweeper = Sweeper::new(Arc::clone(&pool), config.sweeper_enabled, diagnostics.clone());
        if let Some(runtime) = self.runtime {
            sweeper = sweeper.with_runtime(runtime);
        }

        let sweeper_config = self
            .sweeper
            .map(|source| match source {
                SweeperSource::Config(c) => c,
                SweeperSource::Predicate(p) => {
                    SweeperConfig::from_predicate(p, config.sweeper_interval())
                }
            })
            .map(|c| {
                if c.is_schedulable() {
                    return c;
                }
                diagnostics.emit_with(Severity::Warn, "Cache.new", || {
                    format!(
                        "sweeper interval {:?} cannot be scheduled; using default {}ms",
                        c.interval(),
                        DEFAULT_SWEEPER_INTERVAL_MS
                    )
                });
                c.with_interval(Duration::from_millis(DEFAULT_SWEEPER_INTERVAL_MS))
            });

        match (config.sweeper_enabled, sweeper_config) {
            (true, Some(sweeper_config)) => {
                sweeper.start(sweeper_config)?;
            }
            (true, None) => diagnostics.emit(
                Severity::Warn,
                "Cache.new",
                "sweeper enabled but no predicate supplied; sweeper not started",
            ),
            (false, Some(_)) => diagnostics.emit(
                Severity::Info,
                "Cache.new",
                "sweeper predicate supplied but sweeper is disabled",
            ),
            (false, None) => {}
        }

        diagnostics.emit(Severity::Info, "Cache.new", "cache initialized");

        Ok(Cache {
            config,
            pool,
            sweeper: Mutex::new(sweeper),
            diagnostics,
        })
    }
}

impl<V> Default for CacheBuilder<V>
where
    V: Clone + fmt::Debug + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
