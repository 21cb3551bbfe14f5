//! Handler for link creation.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use validator::Validate;

use crate::api::dto::links::{CreateLinkRequest, LinkResponse};
use crate::api::handlers::owner::optional_owner;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::target_url::validate_target_url;

/// Creates a link under a custom or generated alias.
///
/// # Endpoint
///
/// `POST /api/links`
///
/// # Request Body
///
/// ```json
/// { "url": "https://example.com", "alias": "abc123" }
/// ```
///
/// `alias` is optional. Without it a 6-character alias is generated and
/// redrawn on collision. The owner is taken from `X-User-Id` when present.
///
/// # Errors
///
/// - 400 Bad Request: invalid URL, alias or user id
/// - 409 Conflict: the custom alias is taken
/// - 500 Internal Server Error: database failure
pub async fn create_link_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateLinkRequest>,
) -> Result<(StatusCode, Json<LinkResponse>), AppError> {
    payload.validate()?;
    validate_target_url(&payload.url)?;

    let owner = optional_owner(&headers)?;

    let link = state
        .link_service
        .shorten(&payload.url, payload.alias.as_deref(), owner)
        .await?;

    tracing::info!(alias = %link.alias, link_id = link.id, "Link created");

    Ok((StatusCode::CREATED, Json(link.into())))
}
