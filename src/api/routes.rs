//! API route configuration.
//!
//! Authentication happens upstream; the owner of a request arrives in the
//! `X-User-Id` header.

use crate::api::handlers::{analytics_handler, create_link_handler};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// Routes mounted under `/api`.
///
/// # Endpoints
///
/// - `POST /links`     - Create a link (custom or generated alias)
/// - `GET  /analytics` - Click totals for the caller's links
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/links", post(create_link_handler))
        .route("/analytics", get(analytics_handler))
}
