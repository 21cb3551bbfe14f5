//! Repository trait definitions for the domain layer.
//!
//! These traits abstract the durable store following the Repository pattern and
//! are implemented by concrete repositories in the infrastructure layer.
//!
//! # Architecture
//!
//! - Traits define the contract for data operations
//! - Implementations live in `crate::infrastructure::persistence`
//! - Mock implementations are auto-generated via `mockall` for testing
//!
//! # Available Repositories
//!
//! - [`LinkRepository`] - Link creation and alias lookup
//! - [`ClickRepository`] - Click records and analytics

pub mod click_repository;
pub mod error;
pub mod link_repository;

pub use click_repository::{ClickRepository, LinkAnalytics};
pub use error::StoreError;
pub use link_repository::LinkRepository;

#[cfg(test)]
pub use click_repository::MockClickRepository;
#[cfg(test)]
pub use link_repository::MockLinkRepository;
