//! Warning throttling and counter emission for rate events.
//!
//! Every "rate exceeded" decision reaches the notifier, but warnings for a
//! group are spaced at least `group_warning_delay_s` apart so a flooding
//! group cannot flood the logs about itself. "Rate back down" notices are
//! informational and always emitted immediately.

use crate::application::ports::CounterSink;
use crate::domain::key::GroupKey;
use crate::domain::state::GroupState;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Name of the suppression counter emitted through the sink.
pub const SUPPRESSED_COUNTER: &str = "records_suppressed_total";

/// Emits throttled warnings and per-group suppression counters.
pub struct Notifier {
    warning_delay: Duration,
    period_s: u64,
    bucket_limit: u64,
    rate_limit: u64,
    reset_rate: i64,
    /// Base labels plus one sanitized label name per key field; both fixed
    /// at build time.
    base_labels: Vec<(String, String)>,
    key_label_names: Vec<String>,
    sink: Option<Arc<dyn CounterSink>>,
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("warning_delay", &self.warning_delay)
            .field("period_s", &self.period_s)
            .field("bucket_limit", &self.bucket_limit)
            .field("rate_limit", &self.rate_limit)
            .field("reset_rate", &self.reset_rate)
            .field("base_labels", &self.base_labels)
            .field("key_label_names", &self.key_label_names)
            .field("sink", &self.sink.is_some())
            .finish()
    }
}

impl Notifier {
    /// Build a notifier.
    ///
    /// `key_label_names` must be the sanitized forms of the configured key
    /// paths, in key order; `sink` is `None` when metrics are disabled.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        warning_delay: Duration,
        period_s: u64,
        bucket_limit: u64,
        rate_limit: u64,
        reset_rate: i64,
        base_labels: Vec<(String, String)>,
        key_label_names: Vec<String>,
        sink: Option<Arc<dyn CounterSink>>,
    ) -> Self {
        Notifier {
            warning_delay,
            period_s,
            bucket_limit,
            rate_limit,
            reset_rate,
            base_labels,
            key_label_names,
            sink,
        }
    }

    /// Handle a "rate exceeded" event for a group.
    ///
    /// Emits at most one warning per `warning_delay` per group, and one
    /// counter increment per event when a sink is present.
    pub fn rate_exceeded(
        &self,
        key: &GroupKey,
        state: &mut GroupState,
        instantaneous: f64,
        now: Instant,
    ) {
        let due = match state.last_warning {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.warning_delay,
        };
        if due {
            // The independent one-second sample serves as a lower bound on
            // the in-period estimate, which reads 0 once the budget count
            // is gone and +inf right after a boundary.
            let rate = (state.approx_rate as f64).max(instantaneous);
            warn!(
                group = %key,
                rate,
                period_s = self.period_s,
                limit = self.bucket_limit,
                rate_limit = self.rate_limit,
                reset_rate = self.reset_rate,
                "rate exceeded, suppressing records for group"
            );
            state.last_warning = Some(now);
        }

        if let Some(sink) = &self.sink {
            // The baseline only advances on exceeded events while the
            // count itself resets every sample, so the delta is an
            // approximation of suppressed volume; negative swings clamp
            // to zero because counters are monotonic.
            let delta = state.rate_count.saturating_sub(state.rate_count_last);
            sink.increment(SUPPRESSED_COUNTER, &self.event_labels(key), delta);
            state.rate_count_last = state.rate_count;
        }
    }

    /// Handle a "rate back down" event. Never delayed.
    pub fn back_down(&self, key: &GroupKey, state: &GroupState) {
        info!(
            group = %key,
            rate = state.approx_rate,
            reset_rate = self.reset_rate,
            "rate back down, resuming records for group"
        );
    }

    fn event_labels(&self, key: &GroupKey) -> Vec<(String, String)> {
        let mut labels = self.base_labels.clone();
        labels.extend(
            self.key_label_names
                .iter()
                .zip(key.parts())
                .map(|(name, part)| (name.clone(), part.to_string())),
        );
        labels
    }
}
