//! Sweeper Cache - an in-process key-value cache
//!
//! Values live in an insertion-ordered pool. An optional background sweeper
//! periodically evicts every entry matching a caller-supplied predicate.
//!
//! ```no_run
//! use std::time::Duration;
//! use sweeper_cache::{Cache, Config, SweeperConfig};
//!
//! # async fn demo() -> sweeper_cache::Result<()> {
//! let config = Config {
//!     sweeper_enabled: true,
//!     ..Config::default()
//! };
//! let cache = Cache::builder()
//!     .config(config)
//!     .sweeper(SweeperConfig::new(
//!         |hits: &u32, _| *hits == 0,
//!         Duration::from_secs(30),
//!     ))
//!     .build()?;
//!
//! cache.create("page:/", 3);
//! assert_eq!(cache.find("page:/"), Some(3));
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod facade;
pub mod tasks;

pub use cache::{Key, Pool, PoolStats, SharedPool};
pub use config::Config;
pub use diagnostics::{Diagnostics, DiagnosticsSink, MemorySink, Severity, TracingSink};
pub use error::{CacheError, Result};
pub use facade::{Cache, CacheBuilder, LIB_STATE, VERSION};
pub use tasks::{Sweeper, SweeperConfig, SweeperHandle};
