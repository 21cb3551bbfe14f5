//! Repository trait for click records and per-owner analytics.

use crate::domain::entities::{ClickRecord, NewClick};
use crate::domain::repositories::StoreError;
use async_trait::async_trait;

/// Click totals for one link.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkAnalytics {
    pub link_id: i64,
    pub alias: String,
    pub original_url: String,
    pub total_clicks: i64,
}

/// Repository interface for click records.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgClickRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
///
/// # Examples
///
/// See integration tests: `tests/repository_click.rs`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClickRepository: Send + Sync {
    /// Appends a click record. Each call is a single atomic insert.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on database errors, including a
    /// `link_id` that does not reference an existing link.
    async fn record_click(&self, new_click: NewClick) -> Result<ClickRecord, StoreError>;

    /// Counts the click records of a link.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on database errors.
    async fn count_by_link(&self, link_id: i64) -> Result<i64, StoreError>;

    /// Lists every link owned by `owner_user_id` with its total clicks,
    /// newest link first. Links without clicks report zero.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on database errors.
    async fn analytics_for_owner(&self, owner_user_id: i64)
    -> Result<Vec<LinkAnalytics>, StoreError>;
}
