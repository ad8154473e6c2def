//! Counter sink adapter for the `metrics` facade.
//!
//! Emits through whatever recorder the hosting process installed. The
//! recorder owns counter registration and caching by `(name, labels)`;
//! this adapter holds no state of its own, so every filter instance can
//! carry its own handle while all increments land in one process-wide
//! registry.

use crate::application::ports::CounterSink;
use metrics::{counter, Label};

/// [`CounterSink`] implementation backed by the `metrics` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsCounterSink;

impl MetricsCounterSink {
    /// Create a new sink.
    pub fn new() -> Self {
        Self
    }
}

impl CounterSink for MetricsCounterSink {
    fn increment(&self, name: &str, labels: &[(String, String)], by: u64) {
        let labels: Vec<Label> = labels
            .iter()
            .map(|(key, value)| Label::new(key.clone(), value.clone()))
            .collect();
        counter!(name.to_string(), labels).increment(by);
    }
}
