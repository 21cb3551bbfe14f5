//! Application layer services implementing business logic.
//!
//! This layer orchestrates domain operations by coordinating repository, cache
//! and stream calls. Services consume trait objects and provide a clean API for
//! HTTP handlers.
//!
//! # Available Services
//!
//! - [`services::link_service::LinkService`] - Alias creation and resolution with click emission
//! - [`services::analytics_service::AnalyticsService`] - Per-owner click totals

pub mod services;
