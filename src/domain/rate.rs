//! Coarse per-group rate sampling.
//!
//! Produces at most one records/second sample per group per second. The
//! sample is intentionally unsmoothed: the recovery rule in the bucket
//! limiter wants an independent, current estimate, and the noise of a raw
//! one-second window is an accepted trade-off for simplicity.

use crate::domain::state::GroupState;
use std::time::{Duration, Instant};

const SAMPLE_WINDOW: Duration = Duration::from_secs(1);

/// Maintains the `approx_rate` sample inside each [`GroupState`].
#[derive(Debug, Clone, Copy)]
pub struct RateEstimator {
    bucket_limit: u64,
}

impl RateEstimator {
    /// `bucket_limit` seeds the metric-delta baseline on every sample,
    /// matching the baseline a fresh group starts with.
    pub fn new(bucket_limit: u64) -> Self {
        RateEstimator { bucket_limit }
    }

    /// Account one record for the group and re-sample if a full second
    /// has elapsed since the previous sample.
    pub fn observe(&self, state: &mut GroupState, now: Instant) {
        state.rate_count += 1;

        let elapsed = now.saturating_duration_since(state.rate_last_reset);
        if elapsed >= SAMPLE_WINDOW {
            let per_second = state.rate_count as f64 / elapsed.as_secs_f64();
            state.approx_rate = per_second.round() as u64;
            state.rate_count = 0;
            state.rate_count_last = self.bucket_limit;
            state.rate_last_reset = now;
        }
    }
}
