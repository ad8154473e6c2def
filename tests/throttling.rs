//! Bucket accounting: budgets, overflow, period resets.

use record_throttle::infrastructure::mocks::MockClock;
use record_throttle::{ThrottleConfig, ThrottleFilter};
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn build(config: ThrottleConfig) -> (ThrottleFilter, MockClock) {
    let clock = MockClock::new(Instant::now());
    let filter = ThrottleFilter::builder()
        .with_config(config)
        .with_clock(Arc::new(clock.clone()))
        .build()
        .expect("valid config");
    (filter, clock)
}

fn config(period_s: u64, limit: u64) -> ThrottleConfig {
    ThrottleConfig {
        group_key: vec!["name".to_string()],
        group_bucket_period_s: period_s,
        group_bucket_limit: limit,
        ..Default::default()
    }
}

#[test]
fn test_every_record_within_budget_passes() {
    let (mut filter, _clock) = build(config(60, 50));

    for i in 0..50 {
        let passed = filter.process(json!({ "name": "api", "seq": i }));
        assert!(passed.is_some(), "record {} should pass", i);
    }

    assert_eq!(filter.metrics().records_passed(), 50);
    assert_eq!(filter.metrics().records_suppressed(), 0);
}

#[test]
fn test_limit_120_accepts_120_and_suppresses_the_121st() {
    let (mut filter, _clock) = build(config(60, 120));

    let mut accepted = 0;
    let mut suppressed = 0;
    for _ in 0..121 {
        match filter.process(json!({ "name": "api" })) {
            Some(_) => accepted += 1,
            None => suppressed += 1,
        }
    }

    assert_eq!(accepted, 120);
    assert_eq!(suppressed, 1);
}

#[test]
fn test_exceeded_group_stays_suppressed_within_the_period() {
    let (mut filter, clock) = build(config(60, 3));

    for _ in 0..4 {
        filter.process(json!({ "name": "api" }));
    }

    // Probe through the rest of the period; nothing gets through.
    for _ in 0..10 {
        clock.advance(Duration::from_secs(5));
        assert!(filter.process(json!({ "name": "api" })).is_none());
    }
}

#[test]
fn test_budget_replenishes_at_the_period_boundary() {
    let (mut filter, clock) = build(config(60, 2));

    assert!(filter.process(json!({ "name": "api" })).is_some());
    assert!(filter.process(json!({ "name": "api" })).is_some());
    assert!(filter.process(json!({ "name": "api" })).is_none());

    clock.advance(Duration::from_secs(61));
    assert!(filter.process(json!({ "name": "api" })).is_some());
    assert!(filter.process(json!({ "name": "api" })).is_some());
    assert!(filter.process(json!({ "name": "api" })).is_none());
}

#[test]
fn test_normal_group_count_resets_across_boundary() {
    let (mut filter, clock) = build(config(60, 10));

    // Use part of the budget, then cross the boundary: the new period
    // starts from zero rather than carrying the remainder.
    for _ in 0..7 {
        assert!(filter.process(json!({ "name": "api" })).is_some());
    }
    clock.advance(Duration::from_secs(61));
    for i in 0..10 {
        let passed = filter.process(json!({ "name": "api" }));
        assert!(passed.is_some(), "record {} of the new period should pass", i);
    }
    assert!(filter.process(json!({ "name": "api" })).is_none());
}

#[test]
fn test_idle_periods_are_skipped_without_individual_processing() {
    let (mut filter, clock) = build(config(10, 1));

    assert!(filter.process(json!({ "name": "api" })).is_some());
    assert!(filter.process(json!({ "name": "api" })).is_none());

    // Many silent periods pass; the next record triggers exactly one
    // reset and is accepted against a fresh budget.
    clock.advance(Duration::from_secs(95));
    assert!(filter.process(json!({ "name": "api" })).is_some());
    assert!(filter.process(json!({ "name": "api" })).is_none());
}

#[test]
fn test_observe_only_mode_flags_without_dropping() {
    let cfg = ThrottleConfig {
        group_drop_logs: false,
        ..config(60, 2)
    };
    let (mut filter, _clock) = build(cfg);

    // All five flow downstream, but the filter still accounts for the
    // three over budget.
    for _ in 0..5 {
        assert!(filter.process(json!({ "name": "api" })).is_some());
    }
    assert_eq!(filter.metrics().records_passed(), 2);
    assert_eq!(filter.metrics().records_suppressed(), 3);
}

#[test]
fn test_suppression_rate_snapshot() {
    let (mut filter, _clock) = build(config(60, 5));

    for _ in 0..10 {
        filter.process(json!({ "name": "api" }));
    }

    let snapshot = filter.metrics().snapshot();
    assert_eq!(snapshot.total_records(), 10);
    assert!((snapshot.suppression_rate() - 0.5).abs() < f64::EPSILON);
}
