//! Basic usage: throttle a burst of records for two containers and watch
//! the warnings and suppression stats.
//!
//! Run with: cargo run --example basic

use record_throttle::{ThrottleConfig, ThrottleFilter};
use serde_json::json;

fn main() {
    tracing_subscriber::fmt().init();

    let config: ThrottleConfig = serde_yaml::from_str(
        r#"
group_key:
  - kubernetes.container_name
group_bucket_period_s: 60
group_bucket_limit: 10
group_warning_delay_s: 5
"#,
    )
    .expect("valid yaml");

    let mut filter = ThrottleFilter::new(config).expect("valid config");

    // "chatty" floods, "quiet" stays within its budget.
    let mut forwarded = 0;
    for i in 0..50 {
        let record = json!({
            "kubernetes": { "container_name": "chatty" },
            "message": format!("spam {}", i),
        });
        if filter.process(record).is_some() {
            forwarded += 1;
        }
    }
    for i in 0..5 {
        let record = json!({
            "kubernetes": { "container_name": "quiet" },
            "message": format!("heartbeat {}", i),
        });
        if filter.process(record).is_some() {
            forwarded += 1;
        }
    }

    let snapshot = filter.metrics().snapshot();
    println!("forwarded:   {}", forwarded);
    println!("passed:      {}", snapshot.records_passed);
    println!("suppressed:  {}", snapshot.records_suppressed);
    println!("groups:      {}", filter.group_count());
    println!("suppression: {:.0}%", snapshot.suppression_rate() * 100.0);
}
