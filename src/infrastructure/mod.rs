//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer, providing
//! concrete implementations for data persistence, caching and event streaming.
//!
//! # Modules
//!
//! - [`cache`] - Caching abstractions (Redis and no-op implementations)
//! - [`persistence`] - PostgreSQL repository implementations
//! - [`stream`] - Event stream abstractions (Redis Streams and in-memory)

pub mod cache;
pub mod persistence;
pub mod stream;
