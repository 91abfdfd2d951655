//! Events published on a bus.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An immutable fact delivered to observers.
///
/// Observers receive events by shared reference and may see the same
/// instance concurrently, so events are never mutated after publication.
/// Type-scoped observers are matched on [`Event::event_type`].
pub trait Event: Send + Sync + 'static {
    fn event_type(&self) -> &str;

    fn timestamp(&self) -> DateTime<Utc>;

    /// Identity of whatever raised the event.
    fn source(&self) -> &str;
}

/// General purpose event with a JSON payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BasicEvent {
    pub id: Uuid,
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    pub source: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl BasicEvent {
    pub fn new(event_type: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type: event_type.into(),
            timestamp: Utc::now(),
            source: source.into(),
            payload: serde_json::Value::Null,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

impl Event for BasicEvent {
    fn event_type(&self) -> &str {
        &self.event_type
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn source(&self) -> &str {
        &self.source
    }
}
