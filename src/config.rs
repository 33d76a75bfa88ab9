//! Configuration Module
//!
//! Cache settings, loadable from environment variables or JSON.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

/// Default sweeper interval in milliseconds.
pub const DEFAULT_SWEEPER_INTERVAL_MS: u64 = 10_000;

/// Cache configuration parameters.
///
/// Every field has a default, so a partial JSON document or an empty
/// environment still yields a usable configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Emit diagnostics for pool and sweeper events
    pub debug_mode: bool,
    /// Advisory size limit; exceeding it only produces a warning
    pub max_cache_size: Option<usize>,
    /// Whether the sweeper is allowed to run at all
    pub sweeper_enabled: bool,
    /// Sweeper tick interval in milliseconds
    pub sweeper_interval_ms: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_DEBUG_MODE` - Emit diagnostics (default: false)
    /// - `CACHE_MAX_SIZE` - Advisory maximum entry count (default: unset)
    /// - `CACHE_SWEEPER_ENABLED` - Allow the sweeper to run (default: false)
    /// - `CACHE_SWEEPER_INTERVAL_MS` - Sweeper tick interval (default: 10000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            debug_mode: parse_env("CACHE_DEBUG_MODE").unwrap_or(defaults.debug_mode),
            max_cache_size: parse_env("CACHE_MAX_SIZE").or(defaults.max_cache_size),
            sweeper_enabled: parse_env("CACHE_SWEEPER_ENABLED")
                .unwrap_or(defaults.sweeper_enabled),
            sweeper_interval_ms: parse_env("CACHE_SWEEPER_INTERVAL_MS")
                .unwrap_or(defaults.sweeper_interval_ms),
        }
    }

    /// Parses a configuration from a JSON document.
    ///
    /// Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| CacheError::InvalidConfig(e.to_string()))
    }

    /// Returns the sweeper interval as a Duration.
    pub fn sweeper_interval(&self) -> Duration {
        Duration::from_millis(self.sweeper_interval_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug_mode: false,
            max_cache_size: None,
            sweeper_enabled: false,
            sweeper_interval_ms: DEFAULT_SWEEPER_INTERVAL_MS,
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
