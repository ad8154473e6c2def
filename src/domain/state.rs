//! Per-group counter state.
//!
//! A [`GroupState`] is a plain value record: all behavior lives in the
//! rate estimator and the bucket limiter, which mutate it in place.

use std::time::Instant;

/// The budget side of a group's state.
///
/// `Normal` carries the number of records accepted in the current period;
/// `Exceeded` means the budget is exhausted and records are being
/// suppressed until a period boundary allows recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    /// Within budget; `0 <= count <= bucket_limit` between decisions.
    Normal(u64),
    /// Budget exhausted, currently dropping.
    Exceeded,
}

impl Bucket {
    /// Whether the group is currently exceeded.
    pub fn is_exceeded(&self) -> bool {
        matches!(self, Bucket::Exceeded)
    }
}

/// Counters and timestamps tracked for one group.
#[derive(Debug, Clone, Copy)]
pub struct GroupState {
    /// Current period budget.
    pub bucket: Bucket,
    /// Start of the current accounting period.
    pub bucket_last_reset: Instant,
    /// Records observed since the last rate sample.
    pub rate_count: u64,
    /// When the last rate sample was taken. Monotonically non-decreasing.
    pub rate_last_reset: Instant,
    /// Last computed records/second sample. Instantaneous and unsmoothed.
    pub approx_rate: u64,
    /// Baseline for metric-increment deltas.
    pub rate_count_last: u64,
    /// Last warning emission for this group, if any.
    pub last_warning: Option<Instant>,
}

impl GroupState {
    /// Fresh state for a group first seen at `now`.
    pub fn new(now: Instant, bucket_limit: u64) -> Self {
        GroupState {
            bucket: Bucket::Normal(0),
            bucket_last_reset: now,
            rate_count: 0,
            rate_last_reset: now,
            approx_rate: 0,
            rate_count_last: bucket_limit,
            last_warning: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_starts_normal_and_empty() {
        let now = Instant::now();
        let state = GroupState::new(now, 100);

        assert_eq!(state.bucket, Bucket::Normal(0));
        assert_eq!(state.rate_count, 0);
        assert_eq!(state.approx_rate, 0);
        assert_eq!(state.rate_count_last, 100);
        assert_eq!(state.bucket_last_reset, now);
        assert_eq!(state.rate_last_reset, now);
        assert!(state.last_warning.is_none());
    }

    #[test]
    fn test_exceeded_marker() {
        assert!(Bucket::Exceeded.is_exceeded());
        assert!(!Bucket::Normal(0).is_exceeded());
        assert!(!Bucket::Normal(u64::MAX).is_exceeded());
    }
}
