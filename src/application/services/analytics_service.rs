//! Per-owner click analytics service.

use std::sync::Arc;

use crate::domain::repositories::{ClickRepository, LinkAnalytics, StoreError};

/// Service for reading click totals of a user's links.
///
/// Totals reflect what the ingestion worker has persisted so far, so they
/// trail the redirects by the stream's processing lag.
pub struct AnalyticsService {
    clicks: Arc<dyn ClickRepository>,
}

impl AnalyticsService {
    /// Creates a new analytics service.
    pub fn new(clicks: Arc<dyn ClickRepository>) -> Self {
        Self { clicks }
    }

    /// Lists the owner's links with their click totals, newest link first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on database errors.
    pub async fn link_analytics(&self, owner_user_id: i64) -> Result<Vec<LinkAnalytics>, StoreError> {
        self.clicks.analytics_for_owner(owner_user_id).await
    }
}
