//! Domain layer containing business entities and logic.
//!
//! This module defines entities, repository interfaces, the click event wire
//! format and the ingestion worker, independent of HTTP concerns.
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Data access trait definitions
//! - [`click_event`] - Click event carried over the event stream
//! - [`click_worker`] - Stream consumer persisting click records
//!
//! # Click Processing Flow
//!
//! 1. The redirect path resolves an alias (see [`crate::application::services::LinkService`])
//! 2. A [`click_event::ClickEvent`] is published to the click stream
//! 3. [`click_worker::ClickWorker`] reads it through a consumer group
//! 4. The click is persisted via [`repositories::ClickRepository`] and acknowledged

pub mod click_event;
pub mod click_worker;
pub mod entities;
pub mod repositories;
