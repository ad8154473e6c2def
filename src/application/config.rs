//! Configuration surface for the throttle filter.
//!
//! `ThrottleConfig` deserializes from whatever format the hosting pipeline
//! uses (every field has a default), and `validate()` enforces the numeric
//! ranges before a filter is built. Configuration errors are fatal at
//! startup; there are no recoverable configuration conditions at runtime.

use serde::Deserialize;
use std::collections::BTreeMap;

/// Configuration for a [`ThrottleFilter`](crate::ThrottleFilter).
///
/// All fields carry defaults, so an empty configuration block yields a
/// working filter grouping on `kubernetes.container_name` with a budget of
/// 6000 records per 60-second period.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ThrottleConfig {
    /// Ordered list of dotted field paths defining the grouping key.
    #[serde(default = "default_group_key")]
    pub group_key: Vec<String>,

    /// Period length in seconds. Must be greater than zero.
    #[serde(default = "default_bucket_period")]
    pub group_bucket_period_s: u64,

    /// Maximum records per group per period. Must be greater than zero.
    #[serde(default = "default_bucket_limit")]
    pub group_bucket_limit: u64,

    /// Whether suppressed records are discarded (`true`) or merely flagged
    /// and passed through while logging and metrics still fire (`false`).
    #[serde(default = "default_drop_logs")]
    pub group_drop_logs: bool,

    /// Hysteresis recovery threshold in records/second, in
    /// `[-1, group_bucket_limit / group_bucket_period_s]`. `-1` recovers
    /// unconditionally at the next period boundary. Unset defaults to the
    /// per-second rate limit itself.
    #[serde(default)]
    pub group_reset_rate_s: Option<i64>,

    /// Minimum seconds between repeated warnings for one group. Must be
    /// at least 1.
    #[serde(default = "default_warning_delay")]
    pub group_warning_delay_s: u64,

    /// Whether to emit a suppression counter through the metrics sink.
    #[serde(default)]
    pub group_emit_metrics: bool,

    /// Static label key/value pairs attached to every emitted counter.
    /// Values may contain `${hostname}` and `${worker_id}` placeholders,
    /// resolved exactly once when the filter is built.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

fn default_group_key() -> Vec<String> {
    vec!["kubernetes.container_name".to_string()]
}

fn default_bucket_period() -> u64 {
    60
}

fn default_bucket_limit() -> u64 {
    6000
}

fn default_drop_logs() -> bool {
    true
}

fn default_warning_delay() -> u64 {
    10
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            group_key: default_group_key(),
            group_bucket_period_s: default_bucket_period(),
            group_bucket_limit: default_bucket_limit(),
            group_drop_logs: default_drop_logs(),
            group_reset_rate_s: None,
            group_warning_delay_s: default_warning_delay(),
            group_emit_metrics: false,
            labels: BTreeMap::new(),
        }
    }
}

impl ThrottleConfig {
    /// The per-second rate limit implied by the bucket:
    /// `group_bucket_limit / group_bucket_period_s`, floored.
    pub fn rate_limit(&self) -> u64 {
        self.group_bucket_limit / self.group_bucket_period_s.max(1)
    }

    /// The effective recovery threshold: the configured value, or the
    /// per-second rate limit when unset.
    pub fn reset_rate(&self) -> i64 {
        self.group_reset_rate_s
            .unwrap_or_else(|| self.rate_limit() as i64)
    }

    /// Check all numeric ranges. Called by the filter builder; violations
    /// refuse to initialize the filter.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.group_key.is_empty() {
            return Err(ConfigError::EmptyGroupKey);
        }
        if self.group_bucket_period_s == 0 {
            return Err(ConfigError::ZeroBucketPeriod);
        }
        if self.group_bucket_limit == 0 {
            return Err(ConfigError::ZeroBucketLimit);
        }
        let max_reset = self.rate_limit() as i64;
        let reset = self.reset_rate();
        if reset < -1 || reset > max_reset {
            return Err(ConfigError::ResetRateOutOfRange {
                value: reset,
                max: max_reset,
            });
        }
        if self.group_warning_delay_s < 1 {
            return Err(ConfigError::WarningDelayTooSmall {
                value: self.group_warning_delay_s,
            });
        }
        Ok(())
    }
}

/// Error returned when a configuration value is out of range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// `group_key` must name at least one field path
    EmptyGroupKey,
    /// `group_bucket_period_s` must be greater than zero
    ZeroBucketPeriod,
    /// `group_bucket_limit` must be greater than zero
    ZeroBucketLimit,
    /// `group_reset_rate_s` outside `[-1, limit / period]`
    ResetRateOutOfRange {
        /// The configured (or defaulted) threshold
        value: i64,
        /// The per-second rate limit bounding it
        max: i64,
    },
    /// `group_warning_delay_s` must be at least 1
    WarningDelayTooSmall {
        /// The configured delay
        value: u64,
    },
    /// A label value referenced a placeholder this filter does not know
    UnknownPlaceholder {
        /// The label whose value failed to resolve
        label: String,
        /// The unrecognized placeholder, including `${}` delimiters
        placeholder: String,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::EmptyGroupKey => {
                write!(f, "group_key must list at least one field path")
            }
            ConfigError::ZeroBucketPeriod => {
                write!(f, "group_bucket_period_s must be greater than 0")
            }
            ConfigError::ZeroBucketLimit => {
                write!(f, "group_bucket_limit must be greater than 0")
            }
            ConfigError::ResetRateOutOfRange { value, max } => {
                write!(
                    f,
                    "group_reset_rate_s must be between -1 and {} (bucket limit / period), got {}",
                    max, value
                )
            }
            ConfigError::WarningDelayTooSmall { value } => {
                write!(f, "group_warning_delay_s must be at least 1, got {}", value)
            }
            ConfigError::UnknownPlaceholder { label, placeholder } => {
                write!(f, "label '{}' uses unknown placeholder '{}'", label, placeholder)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
