//! Error types for the cache
//!
//! Only construction-time failures surface as errors. Cache misses and
//! disabled-sweeper requests are reported through return values.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// A required dependency (for example the diagnostics sink) could not be built
    #[error("Initialization failed: {0}")]
    Initialization(String),

    /// Configuration source could not be parsed
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The sweeper needs a tokio runtime and none is available
    #[error("No tokio runtime available to drive the sweeper")]
    RuntimeUnavailable,

    /// A diagnostics sink rejected an event
    #[error("Diagnostics sink error: {0}")]
    Sink(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
