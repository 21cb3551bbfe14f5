//! Owner identity forwarded by the authenticating proxy.

use axum::http::HeaderMap;
use serde_json::json;

use crate::error::AppError;

/// Header carrying the authenticated user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Reads the owner id if the request carries one.
///
/// # Errors
///
/// Returns 400 Bad Request if the header is present but not an integer.
pub fn optional_owner(headers: &HeaderMap) -> Result<Option<i64>, AppError> {
    let Some(raw) = headers.get(USER_ID_HEADER) else {
        return Ok(None);
    };

    raw.to_str()
        .ok()
        .and_then(|v| v.trim().parse::<i64>().ok())
        .map(Some)
        .ok_or_else(|| {
            AppError::bad_request(
                "Invalid user id",
                json!({ "header": USER_ID_HEADER }),
            )
        })
}

/// Reads the owner id of an authenticated request.
///
/// # Errors
///
/// Returns 401 Unauthorized if the header is missing, 400 if it is malformed.
pub fn required_owner(headers: &HeaderMap) -> Result<i64, AppError> {
    optional_owner(headers)?.ok_or_else(|| {
        AppError::unauthorized(
            "User not authenticated",
            json!({ "header": USER_ID_HEADER }),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, StatusCode};

    #[test]
    fn test_owner_header_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(optional_owner(&headers).unwrap(), None);
        assert_eq!(
            required_owner(&headers).unwrap_err().status(),
            StatusCode::UNAUTHORIZED
        );

        headers.insert(USER_ID_HEADER, HeaderValue::from_static("42"));
        assert_eq!(optional_owner(&headers).unwrap(), Some(42));
        assert_eq!(required_owner(&headers).unwrap(), 42);

        headers.insert(USER_ID_HEADER, HeaderValue::from_static("bob"));
        assert_eq!(
            optional_owner(&headers).unwrap_err().status(),
            StatusCode::BAD_REQUEST
        );
    }
}
