//! The per-group bucket/period state machine.
//!
//! Time is partitioned into fixed, non-overlapping periods. Each group may
//! pass `limit` records per period; the record that overflows the budget
//! flips the group to [`Bucket::Exceeded`] and everything is suppressed
//! until a period boundary allows recovery. Recovery is optionally gated
//! on the group's sampled rate falling below a threshold (hysteresis), so
//! a group that is still flooding keeps dropping instead of flapping.
//!
//! All transitions are driven by record arrival. If no record arrives
//! during a period, the transition is deferred to the next record and the
//! intervening periods are skipped wholesale; an idle group never resets
//! on its own.

use crate::domain::state::{Bucket, GroupState};
use std::time::{Duration, Instant};

/// How an exceeded group may return to normal at a period boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Recover unconditionally at the next boundary.
    Immediate,
    /// Recover only once the sampled rate drops below the threshold
    /// (records/second).
    Below(u64),
}

/// Pass-or-suppress verdict for one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Let the record through.
    Pass,
    /// Suppress the record per the configured drop policy.
    Suppress,
}

/// Notification raised by a decision, handed to the notifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RateEvent {
    /// The group is over budget. Carries the in-period instantaneous rate
    /// observed at the moment of the decision: the overflow transition
    /// computes it from the transient `limit + 1` count, while an
    /// already-exceeded group reports `0.0` (its budget count is gone) and
    /// a period that just started reports `+inf`.
    Exceeded {
        /// Records/second inside the current period.
        instantaneous: f64,
    },
    /// An exceeded group recovered at a period boundary.
    BackDown,
}

/// Decision plus any notification it raised.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outcome {
    /// The pass/suppress verdict.
    pub decision: Decision,
    /// At most one event per record.
    pub event: Option<RateEvent>,
}

impl Outcome {
    fn pass(event: Option<RateEvent>) -> Self {
        Outcome {
            decision: Decision::Pass,
            event,
        }
    }

    fn suppress(event: RateEvent) -> Self {
        Outcome {
            decision: Decision::Suppress,
            event: Some(event),
        }
    }

    /// Whether the record passed.
    pub fn passed(&self) -> bool {
        self.decision == Decision::Pass
    }
}

/// The bucket accounting state machine, shared by every group.
///
/// Periods are indexed relative to an epoch fixed at construction; the
/// monotonic clock has no meaningful zero, and the semantics only need
/// fixed-width, non-overlapping windows.
#[derive(Debug, Clone, Copy)]
pub struct BucketLimiter {
    period: Duration,
    limit: u64,
    recovery: Recovery,
    epoch: Instant,
}

impl BucketLimiter {
    /// Build a limiter. `period` and `limit` must already be validated
    /// (both non-zero).
    pub fn new(period: Duration, limit: u64, recovery: Recovery, epoch: Instant) -> Self {
        BucketLimiter {
            period,
            limit,
            recovery,
            epoch,
        }
    }

    /// Period length.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Records allowed per group per period.
    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// The configured recovery rule.
    pub fn recovery(&self) -> Recovery {
        self.recovery
    }

    fn period_index(&self, t: Instant) -> u128 {
        t.saturating_duration_since(self.epoch).as_nanos() / self.period.as_nanos()
    }

    fn period_crossed(&self, last_reset: Instant, now: Instant) -> bool {
        self.period_index(now) > self.period_index(last_reset)
    }

    fn instantaneous_rate(count: u64, since: Instant, now: Instant) -> f64 {
        let elapsed = now.saturating_duration_since(since).as_secs_f64();
        if elapsed > 0.0 {
            (count as f64 / elapsed).round()
        } else {
            f64::INFINITY
        }
    }

    /// Decide one record for the group, mutating its bucket state.
    pub fn observe(&self, state: &mut GroupState, now: Instant) -> Outcome {
        let mut event = None;

        if self.period_crossed(state.bucket_last_reset, now) {
            if state.bucket.is_exceeded() {
                if let Recovery::Below(threshold) = self.recovery {
                    // The sample is a non-negative integer, so a zero
                    // threshold recovers once the rate decays fully to
                    // zero rather than never.
                    if state.approx_rate >= threshold.max(1) {
                        // Still too hot: hold the period open and keep
                        // dropping until the sampled rate backs off.
                        return Outcome::suppress(RateEvent::Exceeded { instantaneous: 0.0 });
                    }
                    event = Some(RateEvent::BackDown);
                }
                // Unconditional recovery resets silently.
            }
            state.bucket = Bucket::Normal(0);
            state.bucket_last_reset = now;
        } else if state.bucket.is_exceeded() {
            return Outcome::suppress(RateEvent::Exceeded { instantaneous: 0.0 });
        }

        let count = match state.bucket {
            Bucket::Normal(count) => count + 1,
            // Exceeded states all returned above.
            Bucket::Exceeded => 1,
        };

        if count > self.limit {
            let instantaneous = Self::instantaneous_rate(count, state.bucket_last_reset, now);
            state.bucket = Bucket::Exceeded;
            return Outcome::suppress(RateEvent::Exceeded { instantaneous });
        }

        state.bucket = Bucket::Normal(count);
        Outcome::pass(event)
    }
}
