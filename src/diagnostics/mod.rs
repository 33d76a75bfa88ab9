//! Diagnostics Module
//!
//! The sink contract the cache reports events through, plus the built-in sinks.

mod memory;
mod tracing_sink;

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use crate::error::Result;

pub use memory::{Event, MemorySink};
pub use tracing_sink::TracingSink;

// == Severity ==
/// Severity attached to every diagnostics event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        };
        f.write_str(name)
    }
}

// == Sink Trait ==
/// Receives (severity, event, message) triples from the cache.
///
/// Implementations may fail; the cache swallows sink failures so that a
/// broken sink never aborts a cache operation.
pub trait DiagnosticsSink: Send + Sync {
    fn emit(&self, severity: Severity, event: &str, message: &str) -> Result<()>;
}

// == Diagnostics Handle ==
/// Cheap-to-clone handle pairing a sink with the `debug_mode` switch.
#[derive(Clone)]
pub struct Diagnostics {
    sink: Arc<dyn DiagnosticsSink>,
    enabled: bool,
}

impl Diagnostics {
    /// Creates a handle that forwards to `sink` when `enabled` is true.
    pub fn new(sink: Arc<dyn DiagnosticsSink>, enabled: bool) -> Self {
        Self { sink, enabled }
    }

    /// A handle that never emits.
    pub fn disabled() -> Self {
        Self::new(Arc::new(TracingSink::new()), false)
    }

    /// Whether events are forwarded to the sink.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Emits an event with a ready-made message.
    pub fn emit(&self, severity: Severity, event: &str, message: &str) {
        self.emit_with(severity, event, || message.to_string());
    }

    /// Emits an event, building the message only when diagnostics are on.
    pub fn emit_with<F>(&self, severity: Severity, event: &str, message: F)
    where
        F: FnOnce() -> String,
    {
        if !self.enabled {
            return;
        }

        let message = message();
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            self.sink.emit(severity, event, &message)
        }));

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(event, error = %e, "diagnostics sink rejected event");
            }
            Err(_) => {
                tracing::warn!(event, "diagnostics sink panicked while emitting event");
            }
        }
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}
