//! Default sink that forwards events to `tracing`.

use tracing::{debug, error, info, warn};

use super::{DiagnosticsSink, Severity};
use crate::error::Result;

/// Forwards diagnostics to the globally installed tracing subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TracingSink {
    pub fn new() -> Self {
        Self
    }
}

impl DiagnosticsSink for TracingSink {
    fn emit(&self, severity: Severity, event: &str, message: &str) -> Result<()> {
        match severity {
            Severity::Debug => debug!(event, "{}", message),
            Severity::Info => info!(event, "{}", message),
            Severity::Warn => warn!(event, "{}", message),
            Severity::Error => error!(event, "{}", message),
            Severity::Fatal => error!(event, fatal = true, "{}", message),
        }
        Ok(())
    }
}
