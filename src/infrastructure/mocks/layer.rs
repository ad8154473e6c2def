//! Capture layer for asserting on emitted log events.

use std::sync::{Arc, Mutex};
use tracing::field::{Field, Visit};
use tracing::Level;
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

/// A log event seen by [`MockCaptureLayer`].
#[derive(Debug, Clone)]
pub struct CapturedEvent {
    /// Level the event was emitted at.
    pub level: Level,
    /// The event's rendered `message` field.
    pub message: String,
}

/// Layer that buffers every event it sees, for tests that assert on the
/// warnings and notices the filter emits.
///
/// Install a clone on a subscriber and keep the original for inspection:
///
/// ```
/// use record_throttle::infrastructure::mocks::MockCaptureLayer;
/// use tracing_subscriber::layer::SubscriberExt;
///
/// let capture = MockCaptureLayer::new();
/// let subscriber = tracing_subscriber::registry().with(capture.clone());
///
/// tracing::subscriber::with_default(subscriber, || {
///     tracing::warn!("something noisy");
/// });
/// assert_eq!(capture.get_captured().len(), 1);
/// ```
#[derive(Clone, Default)]
pub struct MockCaptureLayer {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl MockCaptureLayer {
    /// Create an empty capture buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything captured so far, in emission order.
    pub fn get_captured(&self) -> Vec<CapturedEvent> {
        self.events
            .lock()
            .expect("capture buffer lock poisoned")
            .clone()
    }
}

impl<S: tracing::Subscriber> Layer<S> for MockCaptureLayer {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor(String::new());
        event.record(&mut visitor);

        self.events
            .lock()
            .expect("capture buffer lock poisoned")
            .push(CapturedEvent {
                level: *event.metadata().level(),
                message: visitor.0,
            });
    }
}

/// Pulls the `message` field out of an event; other fields are ignored.
struct MessageVisitor(String);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{:?}", value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn test_captures_level_and_message_in_order() {
        let capture = MockCaptureLayer::new();
        let subscriber = tracing_subscriber::registry().with(capture.clone());

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(group = "api", "limit reached");
            tracing::info!("resumed");
        });

        let events = capture.get_captured();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].level, Level::WARN);
        assert!(events[0].message.contains("limit reached"));
        assert_eq!(events[1].level, Level::INFO);
        assert!(events[1].message.contains("resumed"));
    }
}
