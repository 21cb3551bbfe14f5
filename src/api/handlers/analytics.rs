//! Handler for per-owner click analytics.

use axum::{Json, extract::State, http::HeaderMap};

use crate::api::dto::analytics::LinkAnalyticsItem;
use crate::api::handlers::owner::required_owner;
use crate::error::AppError;
use crate::state::AppState;

/// Lists the caller's links with their click totals, newest link first.
///
/// # Endpoint
///
/// `GET /api/analytics`
///
/// # Response
///
/// ```json
/// [
///   { "id": 1, "alias": "abc123", "original_url": "https://example.com", "total_clicks": 3 }
/// ]
/// ```
///
/// Totals only include clicks the ingestion worker has already persisted.
///
/// # Errors
///
/// - 401 Unauthorized: no `X-User-Id`
/// - 500 Internal Server Error: database failure
pub async fn analytics_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<LinkAnalyticsItem>>, AppError> {
    let owner = required_owner(&headers)?;

    let rows = state.analytics_service.link_analytics(owner).await?;

    Ok(Json(rows.into_iter().map(LinkAnalyticsItem::from).collect()))
}
