//! Mock counter sink for testing.

use crate::application::ports::CounterSink;
use std::sync::{Arc, Mutex};

/// One increment recorded by [`MockCounterSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedIncrement {
    /// Counter name
    pub name: String,
    /// Labels passed with the increment, in emission order
    pub labels: Vec<(String, String)>,
    /// Increment amount
    pub by: u64,
}

/// Mock sink that records every increment for inspection.
///
/// Clones share the same buffer, so tests can keep one handle and pass
/// another into the filter.
#[derive(Debug, Clone, Default)]
pub struct MockCounterSink {
    recorded: Arc<Mutex<Vec<RecordedIncrement>>>,
}

impl MockCounterSink {
    /// Create a new mock sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// All increments recorded so far.
    pub fn increments(&self) -> Vec<RecordedIncrement> {
        self.recorded
            .lock()
            .expect("mock sink lock poisoned")
            .clone()
    }

    /// Sum of all increments for a counter name.
    pub fn total_for(&self, name: &str) -> u64 {
        self.increments()
            .iter()
            .filter(|inc| inc.name == name)
            .map(|inc| inc.by)
            .sum()
    }

    /// Clear all recorded increments.
    pub fn clear(&self) {
        self.recorded
            .lock()
            .expect("mock sink lock poisoned")
            .clear();
    }
}

impl CounterSink for MockCounterSink {
    fn increment(&self, name: &str, labels: &[(String, String)], by: u64) {
        self.recorded
            .lock()
            .expect("mock sink lock poisoned")
            .push(RecordedIncrement {
                name: name.to_string(),
                labels: labels.to_vec(),
                by,
            });
    }
}
