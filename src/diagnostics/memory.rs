//! In-memory sink that records events for later inspection.

use parking_lot::Mutex;

use super::{DiagnosticsSink, Severity};
use crate::error::Result;

/// A recorded diagnostics event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub severity: Severity,
    pub event: String,
    pub message: String,
}

/// Sink that keeps every event in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<Event>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all recorded events, oldest first.
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    /// Returns the recorded events whose name matches `event`.
    pub fn events_named(&self, event: &str) -> Vec<Event> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.event == event)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl DiagnosticsSink for MemorySink {
    fn emit(&self, severity: Severity, event: &str, message: &str) -> Result<()> {
        self.events.lock().push(Event {
            severity,
            event: event.to_string(),
            message: message.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_records_in_order() {
        let sink = MemorySink::new();
        sink.emit(Severity::Info, "a", "first").unwrap();
        sink.emit(Severity::Warn, "b", "second").unwrap();
        sink.emit(Severity::Info, "a", "third").unwrap();

        assert_eq!(sink.len(), 3);
        assert_eq!(sink.events()[1].message, "second");

        let named = sink.events_named("a");
        assert_eq!(named.len(), 2);
        assert_eq!(named[1].message, "third");

        sink.clear();
        assert!(sink.is_empty());
    }
}
