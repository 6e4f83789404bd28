//! Ordered event log shared by the engine, observers, and bean release hooks.

use std::sync::Arc;

use parking_lot::Mutex;

use scenic_core::error::BoxError;
use scenic_core::event::LifecycleEvent;
use scenic_core::notifier::ScenarioObserver;

/// Append-only log of `kind:detail` entries.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    entries: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.entries.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.entries.lock().iter().any(|e| e == entry)
    }

    /// Entries starting with `prefix`, in order.
    pub fn with_prefix(&self, prefix: &str) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .filter(|e| e.starts_with(prefix))
            .cloned()
            .collect()
    }

    /// Index of the first matching entry.
    ///
    /// # Panics
    ///
    /// Panics if the entry was never logged.
    pub fn position(&self, entry: &str) -> usize {
        let entries = self.entries.lock();
        entries
            .iter()
            .position(|e| e == entry)
            .unwrap_or_else(|| panic!("'{entry}' not logged; log: {entries:?}"))
    }
}

/// Observer that logs `before:<scenario>` or `after:<scenario>:<outcome>`.
pub fn recording_observer(log: &EventLog) -> impl ScenarioObserver + 'static {
    let log = log.clone();
    move |event: &LifecycleEvent| -> Result<(), BoxError> {
        match event.outcome() {
            Some(outcome) => log.push(format!("after:{}:{}", event.name(), outcome.as_str())),
            None => log.push(format!("before:{}", event.name())),
        }
        Ok(())
    }
}

/// Observer that always fails with `message`.
#[allow(dead_code)]
pub fn failing_observer(message: &'static str) -> impl ScenarioObserver + 'static {
    move |_: &LifecycleEvent| -> Result<(), BoxError> { Err(message.into()) }
}
