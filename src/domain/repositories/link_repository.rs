//! Repository trait for link data access.

use crate::domain::entities::{Link, NewLink};
use crate::domain::repositories::StoreError;
use async_trait::async_trait;

/// Repository interface for alias to URL mappings.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
///
/// # Examples
///
/// See integration tests: `tests/repository_link.rs`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Inserts a new link.
    ///
    /// Alias uniqueness is enforced by the storage layer, not pre-checked.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UniqueViolation`] if the alias is already taken.
    /// Returns [`StoreError::Database`] on any other database error.
    async fn create(&self, new_link: NewLink) -> Result<Link, StoreError>;

    /// Finds a link by its alias.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Link))` if found
    /// - `Ok(None)` if not found
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on database errors.
    async fn find_by_alias(&self, alias: &str) -> Result<Option<Link>, StoreError>;

    /// Runs a trivial query to check that the store is reachable.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the round-trip fails.
    async fn ping(&self) -> Result<(), StoreError>;
}
