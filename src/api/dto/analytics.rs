//! DTOs for per-owner analytics.

use serde::{Deserialize, Serialize};

use crate::domain::repositories::LinkAnalytics;

/// Click total for one of the caller's links.
#[derive(Debug, Serialize, Deserialize)]
pub struct LinkAnalyticsItem {
    pub id: i64,
    pub alias: String,
    pub original_url: String,
    pub total_clicks: i64,
}

impl From<LinkAnalytics> for LinkAnalyticsItem {
    fn from(row: LinkAnalytics) -> Self {
        Self {
            id: row.link_id,
            alias: row.alias,
            original_url: row.original_url,
            total_clicks: row.total_clicks,
        }
    }
}
