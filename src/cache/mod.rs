//! Cache Module
//!
//! Provides the in-memory pool, its keys, ordering and statistics.

mod key;
mod order;
mod pool;
mod stats;


// Re-export public types
pub use key::Key;
pub use order::OrderTracker;
pub use pool::{Pool, SharedPool};
pub use stats::PoolStats;

// == Public Constants ==
/// Pools larger than this skip the default per-entry trace
pub const TRACE_ENTRY_LIMIT: usize = 250;
