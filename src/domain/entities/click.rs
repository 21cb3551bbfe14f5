//! Click record entity representing a persisted redirect event.

use chrono::{DateTime, Utc};

/// A click persisted by the ingestion worker.
///
/// Append-only: one row per processed stream entry. Redelivery after a crash
/// can produce a second row for the same event.
#[derive(Debug, Clone, PartialEq)]
pub struct ClickRecord {
    pub id: i64,
    pub link_id: i64,
    pub clicked_at: DateTime<Utc>,
    pub ip_address: String,
    pub user_agent: String,
    pub referrer: String,
}

impl ClickRecord {
    /// Creates a new ClickRecord instance.
    pub fn new(
        id: i64,
        link_id: i64,
        clicked_at: DateTime<Utc>,
        ip_address: String,
        user_agent: String,
        referrer: String,
    ) -> Self {
        Self {
            id,
            link_id,
            clicked_at,
            ip_address,
            user_agent,
            referrer,
        }
    }
}

/// Input data for recording a click.
///
/// `clicked_at` is the time the redirect happened, not the time the worker
/// got around to persisting it.
#[derive(Debug, Clone, PartialEq)]
pub struct NewClick {
    pub link_id: i64,
    pub clicked_at: DateTime<Utc>,
    pub ip_address: String,
    pub user_agent: String,
    pub referrer: String,
}
