//! PostgreSQL repository implementations.
//!
//! Concrete implementations of domain repository traits using SQLx prepared
//! statements checked at runtime.
//!
//! # Repositories
//!
//! - [`PgLinkRepository`] - Link storage and alias lookup
//! - [`PgClickRepository`] - Click records and per-owner analytics

pub mod pg_click_repository;
pub mod pg_link_repository;

pub use pg_click_repository::PgClickRepository;
pub use pg_link_repository::PgLinkRepository;
