use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};

use crate::application::services::LinkError;
use crate::domain::repositories::StoreError;
use crate::utils::target_url::TargetUrlError;

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

#[derive(Serialize)]
struct ErrorInfo {
    code: &'static str,
    message: String,
    details: Value,
}

#[derive(Debug)]
pub enum AppError {
    Validation { message: String, details: Value },
    Unauthorized { message: String, details: Value },
    NotFound { message: String, details: Value },
    Conflict { message: String, details: Value },
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }
    pub fn unauthorized(message: impl Into<String>, details: Value) -> Self {
        Self::Unauthorized {
            message: message.into(),
            details,
        }
    }
    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }
    pub fn conflict(message: impl Into<String>, details: Value) -> Self {
        Self::Conflict {
            message: message.into(),
            details,
        }
    }
    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, message, details) = match self {
            AppError::Validation { message, details } => ("validation_error", message, details),
            AppError::Unauthorized { message, details } => ("unauthorized", message, details),
            AppError::NotFound { message, details } => ("not_found", message, details),
            AppError::Conflict { message, details } => ("conflict", message, details),
            AppError::Internal { message, details } => ("internal_error", message, details),
        };

        let body = ErrorBody {
            error: ErrorInfo {
                code,
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<LinkError> for AppError {
    fn from(e: LinkError) -> Self {
        match e {
            LinkError::AliasExists { alias } => {
                AppError::conflict("Alias already exists", json!({ "alias": alias }))
            }
            LinkError::LinkNotFound { alias } => {
                AppError::not_found("Link not found", json!({ "alias": alias }))
            }
            LinkError::InvalidAlias { alias, reason } => AppError::bad_request(
                "Invalid alias",
                json!({ "alias": alias, "reason": reason }),
            ),
            LinkError::Persistence(source) => source.into(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        tracing::error!(error = %e, "Store operation failed");
        AppError::internal("Database error", json!({}))
    }
}

impl From<TargetUrlError> for AppError {
    fn from(e: TargetUrlError) -> Self {
        AppError::bad_request("Invalid URL", json!({ "reason": e.to_string() }))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let fields: serde_json::Map<String, Value> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let messages: Vec<String> = errs
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                (field.to_string(), json!(messages))
            })
            .collect();

        AppError::bad_request("Validation failed", Value::Object(fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_errors_map_to_status_codes() {
        let cases = [
            (
                LinkError::AliasExists {
                    alias: "abc123".into(),
                },
                StatusCode::CONFLICT,
            ),
            (
                LinkError::LinkNotFound {
                    alias: "doesnotexist".into(),
                },
                StatusCode::NOT_FOUND,
            ),
            (
                LinkError::InvalidAlias {
                    alias: "a b".into(),
                    reason: "bad characters",
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                LinkError::Persistence(StoreError::Database(sqlx::Error::PoolTimedOut)),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(AppError::from(error).status(), expected);
        }
    }

    #[test]
    fn test_url_error_is_bad_request() {
        let err = AppError::from(TargetUrlError::UnsupportedProtocol);

        match err {
            AppError::Validation { details, .. } => {
                assert_eq!(
                    details["reason"],
                    "Only HTTP and HTTPS protocols are allowed"
                );
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = AppError::not_found("Link not found", json!({ "alias": "x" })).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["error"]["code"], "not_found");
        assert_eq!(body["error"]["message"], "Link not found");
        assert_eq!(body["error"]["details"]["alias"], "x");
    }
}
