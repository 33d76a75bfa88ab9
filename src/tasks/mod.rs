//! Background Tasks Module
//!
//! Contains background tasks that run periodically alongside the cache.
//!
//! # Tasks
//! - Sweeper: evicts entries matching a caller-supplied predicate

mod sweeper;

pub use sweeper::{Predicate, Sweeper, SweeperConfig, SweeperHandle};
