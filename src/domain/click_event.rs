//! Click event model carried over the event stream.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::NewClick;

/// Stream entry field that holds the JSON-encoded event.
pub const EVENT_FIELD: &str = "event";

/// Errors raised when a stream entry cannot be turned back into a [`ClickEvent`].
#[derive(Debug, thiserror::Error)]
pub enum ClickEventError {
    #[error("stream entry has no 'event' field")]
    MissingField,

    #[error("malformed click event: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// A redirect captured for asynchronous click tracking.
///
/// Created on the redirect path once the destination is known, published to the
/// click stream as a single JSON string under [`EVENT_FIELD`], and converted into
/// a [`NewClick`] by the ingestion worker.
///
/// # Wire Format
///
/// ```json
/// {
///   "link_id": 42,
///   "timestamp": "2025-01-01T12:00:00Z",
///   "ip_address": "1.2.3.4",
///   "user_agent": "Mozilla/5.0",
///   "referrer": ""
/// }
/// ```
///
/// Missing request headers are carried as empty strings, never omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClickEvent {
    pub link_id: i64,
    pub timestamp: DateTime<Utc>,
    pub ip_address: String,
    pub user_agent: String,
    pub referrer: String,
}

impl ClickEvent {
    /// Creates a click event stamped with the current time.
    pub fn new(
        link_id: i64,
        ip_address: impl Into<String>,
        user_agent: impl Into<String>,
        referrer: impl Into<String>,
    ) -> Self {
        Self {
            link_id,
            timestamp: Utc::now(),
            ip_address: ip_address.into(),
            user_agent: user_agent.into(),
            referrer: referrer.into(),
        }
    }

    /// Serializes the event into the string stored under [`EVENT_FIELD`].
    ///
    /// # Errors
    ///
    /// Returns a serialization error; with plain strings and integers this does
    /// not happen in practice.
    pub fn to_payload(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decodes an event from the value stored under [`EVENT_FIELD`].
    ///
    /// # Errors
    ///
    /// Returns [`ClickEventError::MissingField`] when `payload` is `None` and
    /// [`ClickEventError::Malformed`] when the JSON does not match the wire format.
    pub fn from_payload(payload: Option<&str>) -> Result<Self, ClickEventError> {
        let payload = payload.ok_or(ClickEventError::MissingField)?;
        Ok(serde_json::from_str(payload)?)
    }

    /// Converts the event into the persistence input for a click record.
    pub fn into_new_click(self) -> NewClick {
        NewClick {
            link_id: self.link_id,
            clicked_at: self.timestamp,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            referrer: self.referrer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_click_event_creation() {
        let before = Utc::now();
        let event = ClickEvent::new(42, "1.2.3.4", "test", "");

        assert_eq!(event.link_id, 42);
        assert_eq!(event.ip_address, "1.2.3.4");
        assert_eq!(event.user_agent, "test");
        assert_eq!(event.referrer, "");
        assert!(event.timestamp >= before);
    }

    #[test]
    fn test_payload_uses_rfc3339_timestamp() {
        let event = ClickEvent {
            link_id: 7,
            timestamp: Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap(),
            ip_address: "10.0.0.1".to_string(),
            user_agent: "Chrome/120".to_string(),
            referrer: "https://google.com".to_string(),
        };

        let json: serde_json::Value =
            serde_json::from_str(&event.to_payload().unwrap()).unwrap();

        assert_eq!(json["link_id"], 7);
        assert_eq!(json["timestamp"], "2025-01-01T12:00:00Z");
        assert_eq!(json["ip_address"], "10.0.0.1");
        assert_eq!(json["user_agent"], "Chrome/120");
        assert_eq!(json["referrer"], "https://google.com");
    }

    #[test]
    fn test_from_payload_accepts_offset_timestamps() {
        let payload = r#"{"link_id":3,"timestamp":"2025-06-01T10:00:00+02:00","ip_address":"","user_agent":"","referrer":""}"#;

        let event = ClickEvent::from_payload(Some(payload)).unwrap();

        assert_eq!(event.link_id, 3);
        assert_eq!(
            event.timestamp,
            Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_from_payload_missing_field() {
        let result = ClickEvent::from_payload(None);
        assert!(matches!(result, Err(ClickEventError::MissingField)));
    }

    #[test]
    fn test_from_payload_rejects_garbage() {
        let result = ClickEvent::from_payload(Some("not json"));
        assert!(matches!(result, Err(ClickEventError::Malformed(_))));

        let result = ClickEvent::from_payload(Some(r#"{"link_id":"abc"}"#));
        assert!(matches!(result, Err(ClickEventError::Malformed(_))));
    }

    #[test]
    fn test_into_new_click_keeps_redirect_time() {
        let event = ClickEvent::new(9, "1.1.1.1", "Safari", "https://news.ycombinator.com");
        let timestamp = event.timestamp;

        let click = event.into_new_click();

        assert_eq!(click.link_id, 9);
        assert_eq!(click.clicked_at, timestamp);
        assert_eq!(click.ip_address, "1.1.1.1");
        assert_eq!(click.user_agent, "Safari");
        assert_eq!(click.referrer, "https://news.ycombinator.com");
    }
}
