//! # record-throttle
//!
//! Per-group rate limiting for structured record pipelines.
//!
//! This crate provides a filter stage that observes a stream of structured
//! records (nested JSON-like maps), groups them by a composite key derived
//! from configured field paths, and decides per group whether each record
//! passes through or is suppressed. Each group gets a fixed budget of
//! records per time period; a group that exhausts its budget is suppressed
//! until a period boundary lets it recover, optionally gated on its
//! observed rate falling below a threshold (hysteresis).
//!
//! ## Quick Start
//!
//! ```rust
//! use record_throttle::{ThrottleConfig, ThrottleFilter};
//! use serde_json::json;
//!
//! // Defaults: group on kubernetes.container_name, 6000 records per
//! // 60-second period, drop suppressed records.
//! let mut filter = ThrottleFilter::new(ThrottleConfig::default()).unwrap();
//!
//! let record = json!({
//!     "kubernetes": { "container_name": "api" },
//!     "message": "request handled",
//! });
//!
//! match filter.process(record) {
//!     Some(record) => { /* forward downstream */ }
//!     None => { /* suppressed */ }
//! }
//! ```
//!
//! Or customize, typically by deserializing the configuration block from
//! the hosting pipeline's config file:
//!
//! ```rust
//! use record_throttle::{ThrottleConfig, ThrottleFilter};
//!
//! let config: ThrottleConfig = serde_yaml::from_str(r#"
//! group_key:
//!   - kubernetes.container_name
//!   - kubernetes.namespace_name
//! group_bucket_period_s: 60
//! group_bucket_limit: 120
//! group_reset_rate_s: 1
//! group_emit_metrics: true
//! labels:
//!   host: ${hostname}
//! "#).unwrap();
//!
//! let filter = ThrottleFilter::builder()
//!     .with_config(config)
//!     .with_worker_id(0)
//!     .build()
//!     .unwrap();
//! ```
//!
//! ## Grouping
//!
//! Records are bucketed by the values found at the configured `group_key`
//! paths. A missing field is not an error: absence becomes part of the
//! key, so records missing the same field throttle together. Two records
//! disagreeing on any key field throttle independently.
//!
//! ## Periods and recovery
//!
//! Time is partitioned into fixed periods of `group_bucket_period_s`
//! seconds. Within a period each group may pass `group_bucket_limit`
//! records; the record that overflows the budget flips the group to
//! exceeded and everything after it is suppressed. At the next period
//! boundary the group recovers — unconditionally when
//! `group_reset_rate_s` is `-1`, otherwise only once its sampled rate
//! drops below the threshold. Until then it keeps dropping, which
//! prevents a still-flooding group from flapping between states.
//!
//! All transitions are driven by record arrival. A group that receives no
//! records sits untouched — there is no background timer, and an idle
//! group never resets on its own. This is intended semantics: state
//! changes are only observable through records, and skipped periods
//! collapse into a single reset when the next record shows up.
//!
//! ## Suppression policy
//!
//! By default suppressed records are discarded (`process` returns `None`).
//! With `group_drop_logs: false` the filter runs observe-only: suppressed
//! records flow through unchanged while warnings and counters still fire,
//! which is useful for sizing budgets before enforcing them.
//!
//! ## Observability
//!
//! Rate-exceeded groups are reported through `tracing` warnings, rate
//! limited per group by `group_warning_delay_s`; recovery emits an info
//! notice. With `group_emit_metrics: true` a `records_suppressed_total`
//! counter is emitted through the `metrics` facade (or any custom
//! [`CounterSink`]), labeled with the configured static labels plus the
//! group's key fields.
//!
//! Internal counters are always available:
//!
//! ```rust
//! # use record_throttle::{ThrottleConfig, ThrottleFilter};
//! # let filter = ThrottleFilter::new(ThrottleConfig::default()).unwrap();
//! let metrics = filter.metrics();
//! println!("passed: {}", metrics.records_passed());
//! println!("suppressed: {}", metrics.records_suppressed());
//! println!("evicted groups: {}", metrics.groups_evicted());
//! println!("suppression rate: {:.2}%", metrics.snapshot().suppression_rate() * 100.0);
//! ```
//!
//! ## Memory management
//!
//! Group state lives in an access-ordered table. On every record the
//! filter inspects the single least-recently-touched group and evicts it
//! if it has been idle for more than two periods. This bounds the
//! amortized cost at O(1) per record, at the price of being approximate:
//! under key cardinality growing faster than the arrival rate, stale
//! entries can linger until they surface as oldest. Check
//! `group_count()` if you need to watch the population.
//!
//! ## Scope
//!
//! State is process-local and per-filter: multiple pipeline workers each
//! own an independent table, so limits are per-worker, not global. State
//! does not persist across restarts. Rate samples are instantaneous
//! one-second estimates with no smoothing.

// Domain layer - pure business logic
pub mod domain;

// Application layer - orchestration
pub mod application;

// Infrastructure layer - external adapters
pub mod infrastructure;

// Re-export commonly used types for convenience
pub use domain::{
    key::{GroupKey, KeyExtractor, KeyPart, KeyPath},
    limiter::{BucketLimiter, Decision, Outcome, RateEvent, Recovery},
    rate::RateEstimator,
    state::{Bucket, GroupState},
};

pub use application::{
    config::{ConfigError, ThrottleConfig},
    filter::{BuildError, ThrottleFilter, ThrottleFilterBuilder},
    metrics::{Metrics, MetricsSnapshot},
    notifier::SUPPRESSED_COUNTER,
    ports::{Clock, CounterSink, GroupStore},
};

pub use infrastructure::{clock::SystemClock, sink::MetricsCounterSink, table::GroupTable};
