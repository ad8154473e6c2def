//! The record filter stage.
//!
//! `ThrottleFilter` ties the pieces together per record: key extraction,
//! store touch, rate sampling, the idle reaper's single eviction probe,
//! the bucket decision, and notification side effects. Records are
//! processed one at a time (`&mut self`); a hosting pipeline running one
//! filter per worker gets fully independent per-worker state.

use crate::application::config::{ConfigError, ThrottleConfig};
use crate::application::metrics::Metrics;
use crate::application::notifier::Notifier;
use crate::application::ports::{Clock, CounterSink, GroupStore};
use crate::domain::key::KeyExtractor;
use crate::domain::limiter::{BucketLimiter, Decision, RateEvent, Recovery};
use crate::domain::rate::RateEstimator;
use crate::domain::state::GroupState;
use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::labels;
use crate::infrastructure::sink::MetricsCounterSink;
use crate::infrastructure::table::GroupTable;

use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Error returned when building a [`ThrottleFilter`] fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// Configuration validation failed
    Config(ConfigError),
}

impl std::fmt::Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildError::Config(e) => write!(f, "configuration error: {}", e),
        }
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BuildError::Config(e) => Some(e),
        }
    }
}

impl From<ConfigError> for BuildError {
    fn from(e: ConfigError) -> Self {
        BuildError::Config(e)
    }
}

/// Per-key rate limiting filter for structured records.
///
/// Built from a validated [`ThrottleConfig`]; see the crate docs for the
/// full behavior. The store type is pluggable through the
/// [`GroupStore`] port and defaults to the in-memory [`GroupTable`].
pub struct ThrottleFilter<S: GroupStore = GroupTable> {
    extractor: KeyExtractor,
    store: S,
    estimator: RateEstimator,
    limiter: BucketLimiter,
    notifier: Notifier,
    clock: Arc<dyn Clock>,
    drop_logs: bool,
    idle_timeout: Duration,
    metrics: Metrics,
}

impl ThrottleFilter<GroupTable> {
    /// Build a filter from a configuration with the system clock and, when
    /// metrics are enabled, the default `metrics`-facade sink.
    pub fn new(config: ThrottleConfig) -> Result<Self, BuildError> {
        Self::builder().with_config(config).build()
    }

    /// Start building a filter.
    pub fn builder() -> ThrottleFilterBuilder {
        ThrottleFilterBuilder::new()
    }
}

impl<S: GroupStore> ThrottleFilter<S> {
    /// Process one record: return it to pass it downstream, or `None` to
    /// suppress it (only when `group_drop_logs` is set; in observe-only
    /// mode suppressed records are returned unchanged).
    ///
    /// Wall-clock time is read once here and reused for every decision in
    /// the call.
    pub fn process(&mut self, record: Value) -> Option<Value> {
        let now = self.clock.now();
        let key = self.extractor.extract(&record);

        {
            let limit = self.limiter.limit();
            let state = self.store.touch(&key, || GroupState::new(now, limit));
            self.estimator.observe(state, now);
        }

        // One eviction probe per record, after the current group has been
        // touched so it sits at the most-recently-used end.
        self.reap_idle(now);

        let Some(state) = self.store.get_mut(&key) else {
            // The reaper only takes entries idle past two periods; the
            // entry touched above can never qualify.
            return Some(record);
        };

        let outcome = self.limiter.observe(state, now);
        match outcome.event {
            Some(RateEvent::Exceeded { instantaneous }) => {
                self.notifier.rate_exceeded(&key, state, instantaneous, now);
            }
            Some(RateEvent::BackDown) => {
                self.notifier.back_down(&key, state);
            }
            None => {}
        }

        self.metrics.record(outcome.decision);
        match outcome.decision {
            Decision::Pass => Some(record),
            Decision::Suppress => {
                if self.drop_logs {
                    None
                } else {
                    Some(record)
                }
            }
        }
    }

    /// Inspect the single least-recently-touched group and evict it if it
    /// has been idle for more than two periods.
    fn reap_idle(&mut self, now: Instant) {
        let victim = match self.store.oldest() {
            Some((key, state))
                if now.saturating_duration_since(state.rate_last_reset) > self.idle_timeout =>
            {
                key.clone()
            }
            _ => return,
        };
        self.store.evict(&victim);
        self.metrics.record_eviction();
        debug!(group = %victim, "evicted idle group");
    }

    /// Get the filter's metrics handle.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Number of groups currently tracked.
    pub fn group_count(&self) -> usize {
        self.store.len()
    }
}

/// Builder for constructing a [`ThrottleFilter`].
pub struct ThrottleFilterBuilder {
    config: ThrottleConfig,
    clock: Option<Arc<dyn Clock>>,
    sink: Option<Arc<dyn CounterSink>>,
    worker_id: u32,
}

impl ThrottleFilterBuilder {
    fn new() -> Self {
        ThrottleFilterBuilder {
            config: ThrottleConfig::default(),
            clock: None,
            sink: None,
            worker_id: 0,
        }
    }

    /// Use the given configuration.
    pub fn with_config(mut self, config: ThrottleConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a custom clock instead of the system clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Use a custom counter sink instead of the `metrics`-facade default.
    /// Only consulted when `group_emit_metrics` is set.
    pub fn with_counter_sink(mut self, sink: Arc<dyn CounterSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// The hosting pipeline's worker index, used to expand the
    /// `${worker_id}` label placeholder. Defaults to 0.
    pub fn with_worker_id(mut self, worker_id: u32) -> Self {
        self.worker_id = worker_id;
        self
    }

    /// Validate the configuration, resolve labels and build the filter.
    ///
    /// # Errors
    ///
    /// Returns `BuildError` if a numeric range is violated or a label
    /// value uses an unknown placeholder.
    pub fn build(self) -> Result<ThrottleFilter<GroupTable>, BuildError> {
        let config = self.config;
        config.validate()?;

        let base_labels = labels::resolve(&config.labels, self.worker_id)?;
        let key_label_names = config.group_key.iter().map(|p| labels::sanitize(p)).collect();

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let sink: Option<Arc<dyn CounterSink>> = if config.group_emit_metrics {
            Some(self.sink.unwrap_or_else(|| Arc::new(MetricsCounterSink::new())))
        } else {
            None
        };

        let period = Duration::from_secs(config.group_bucket_period_s);
        let recovery = match config.reset_rate() {
            -1 => Recovery::Immediate,
            threshold => Recovery::Below(threshold as u64),
        };

        let notifier = Notifier::new(
            Duration::from_secs(config.group_warning_delay_s),
            config.group_bucket_period_s,
            config.group_bucket_limit,
            config.rate_limit(),
            config.reset_rate(),
            base_labels,
            key_label_names,
            sink,
        );

        let epoch = clock.now();
        Ok(ThrottleFilter {
            extractor: KeyExtractor::new(&config.group_key),
            store: GroupTable::new(),
            estimator: RateEstimator::new(config.group_bucket_limit),
            limiter: BucketLimiter::new(period, config.group_bucket_limit, recovery, epoch),
            notifier,
            clock,
            drop_logs: config.group_drop_logs,
            idle_timeout: 2 * period,
            metrics: Metrics::new(),
        })
    }
}

impl Default for ThrottleFilterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::mocks::MockClock;
    use serde_json::json;

    fn config(period_s: u64, limit: u64) -> ThrottleConfig {
        ThrottleConfig {
            group_key: vec!["name".to_string()],
            group_bucket_period_s: period_s,
            group_bucket_limit: limit,
            ..Default::default()
        }
    }

    fn filter_with_clock(config: ThrottleConfig) -> (ThrottleFilter, MockClock) {
        let clock = MockClock::new(Instant::now());
        let filter = ThrottleFilter::builder()
            .with_config(config)
            .with_clock(Arc::new(clock.clone()))
            .build()
            .unwrap();
        (filter, clock)
    }

    #[test]
    fn test_passes_records_within_budget() {
        let (mut filter, _clock) = filter_with_clock(config(60, 5));

        for i in 0..5 {
            let record = json!({ "name": "api", "seq": i });
            assert!(filter.process(record).is_some(), "record {} should pass", i);
        }
        assert_eq!(filter.metrics().records_passed(), 5);
    }

    #[test]
    fn test_suppresses_past_budget() {
        let (mut filter, _clock) = filter_with_clock(config(60, 3));

        for _ in 0..3 {
            assert!(filter.process(json!({ "name": "api" })).is_some());
        }
        assert!(filter.process(json!({ "name": "api" })).is_none());
        assert!(filter.process(json!({ "name": "api" })).is_none());
        assert_eq!(filter.metrics().records_suppressed(), 2);
    }

    #[test]
    fn test_observe_only_mode_passes_suppressed_records() {
        let cfg = ThrottleConfig {
            group_drop_logs: false,
            ..config(60, 1)
        };
        let (mut filter, _clock) = filter_with_clock(cfg);

        assert!(filter.process(json!({ "name": "api" })).is_some());
        // Over budget, but the record still flows downstream.
        assert!(filter.process(json!({ "name": "api" })).is_some());
        assert_eq!(filter.metrics().records_suppressed(), 1);
    }

    #[test]
    fn test_groups_are_independent() {
        let (mut filter, _clock) = filter_with_clock(config(60, 1));

        assert!(filter.process(json!({ "name": "a" })).is_some());
        assert!(filter.process(json!({ "name": "a" })).is_none());
        assert!(filter.process(json!({ "name": "b" })).is_some());
        assert_eq!(filter.group_count(), 2);
    }

    #[test]
    fn test_budget_replenishes_next_period() {
        let (mut filter, clock) = filter_with_clock(config(60, 1));

        assert!(filter.process(json!({ "name": "api" })).is_some());
        assert!(filter.process(json!({ "name": "api" })).is_none());

        clock.advance(Duration::from_secs(61));
        assert!(filter.process(json!({ "name": "api" })).is_some());
    }

    #[test]
    fn test_invalid_config_refuses_to_build() {
        let result = ThrottleFilter::new(ThrottleConfig {
            group_bucket_limit: 0,
            ..Default::default()
        });
        assert_eq!(
            result.err(),
            Some(BuildError::Config(ConfigError::ZeroBucketLimit))
        );
    }

    #[test]
    fn test_unknown_placeholder_refuses_to_build() {
        let mut cfg = ThrottleConfig::default();
        cfg.labels
            .insert("pod".to_string(), "${pod_name}".to_string());
        let result = ThrottleFilter::new(cfg);
        assert!(matches!(
            result,
            Err(BuildError::Config(ConfigError::UnknownPlaceholder { .. }))
        ));
    }

    #[test]
    fn test_idle_group_is_reaped() {
        let (mut filter, clock) = filter_with_clock(config(2, 100));

        filter.process(json!({ "name": "stale" }));
        clock.advance(Duration::from_secs(5));

        // The next record (any group) gives the reaper its probe.
        filter.process(json!({ "name": "fresh" }));
        filter.process(json!({ "name": "fresh" }));

        assert_eq!(filter.group_count(), 1);
        assert_eq!(filter.metrics().groups_evicted(), 1);
    }

    #[test]
    fn test_missing_key_field_still_throttles() {
        let (mut filter, _clock) = filter_with_clock(config(60, 2));

        // Records without the field all share the absent-key group.
        assert!(filter.process(json!({ "other": 1 })).is_some());
        assert!(filter.process(json!({ "other": 2 })).is_some());
        assert!(filter.process(json!({ "other": 3 })).is_none());
        assert_eq!(filter.group_count(), 1);
    }
}
