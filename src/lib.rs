//! # shorty
//!
//! URL shortener with cache-aside redirects and stream-based click ingestion,
//! built with Axum, PostgreSQL and Redis.
//!
//! ## Architecture
//!
//! This crate follows Clean Architecture principles with clear layer separation:
//!
//! - **Domain Layer** ([`domain`]) - Entities, click events, repository traits
//!   and the click ingestion worker
//! - **Application Layer** ([`application`]) - Link resolution and analytics services
//! - **Infrastructure Layer** ([`infrastructure`]) - PostgreSQL, Redis cache and
//!   Redis Streams
//! - **API Layer** ([`api`]) - REST handlers, DTOs and middleware
//!
//! ## Data Flow
//!
//! ```text
//! GET /{alias} -> cache -> (miss) database -> cache write
//!              -> 302 Found
//!              -> click event on `clicks_stream` (background)
//!
//! click-worker -> XREADGROUP clicks_group -> click_records -> XACK
//! ```
//!
//! ## Binaries
//!
//! - `shorty` - HTTP server
//! - `click-worker` - Stream consumer persisting click records
//! - `admin` - Dead-letter and stream inspection CLI
//!
//! ## Configuration
//!
//! Service configuration is loaded from environment variables via [`config::Config`].
//! See [`config`] module for available options.

pub mod api;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod state;
pub mod utils;

pub mod config;
pub mod server;
pub mod shutdown;
pub mod telemetry;

pub mod routes;

pub use error::AppError;
pub use state::AppState;

/// Commonly used types for external consumers.
///
/// Re-exports frequently used types to simplify imports for library users
/// and integration tests.
pub mod prelude {
    pub use crate::application::services::{AnalyticsService, ClickContext, LinkError, LinkService};
    pub use crate::domain::click_event::ClickEvent;
    pub use crate::domain::click_worker::{ClickWorker, WorkerSettings};
    pub use crate::domain::entities::{ClickRecord, Link, NewLink};
    pub use crate::error::AppError;
    pub use crate::infrastructure::stream::{EventStream, MemoryStream};
    pub use crate::state::AppState;
}
