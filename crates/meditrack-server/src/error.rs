//! HTTP error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use meditrack_core::{AnalyticsError, AuthError, RangeError};
use serde_json::json;
use thiserror::Error;

pub const INVALID_BEARER: &str = "Missing or invalid Bearer token";
pub const ANALYTICS_FAILED: &str = "Failed to fetch analytics data.";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    /// Analytics range failures carry their reason code as `message`.
    #[error(transparent)]
    InvalidRange(#[from] RangeError),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Internal(String),

    #[error("{}", ANALYTICS_FAILED)]
    AnalyticsUnavailable,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken | AuthError::InvalidToken(_) => {
                ApiError::Unauthorized(INVALID_BEARER.into())
            }
            AuthError::SignInFailed(message) => ApiError::Unauthorized(message),
            AuthError::EmailUnavailable
            | AuthError::AllowListNotConfigured
            | AuthError::NotAllowListed { .. } => ApiError::Forbidden(err.to_string()),
            AuthError::Keyring(_) | AuthError::Provider(_) => {
                ApiError::Internal("Internal Server Error during authentication.".into())
            }
        }
    }
}

impl From<AnalyticsError> for ApiError {
    fn from(err: AnalyticsError) -> Self {
        match err {
            AnalyticsError::Validation(e) => ApiError::InvalidRange(e),
            AnalyticsError::Store(_) => ApiError::AnalyticsUnavailable,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            ApiError::InvalidRange(e) => (
                StatusCode::BAD_REQUEST,
                json!({ "message": e.code(), "error": e.to_string() }),
            ),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, json!({ "error": msg })),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, json!({ "error": msg })),
            ApiError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": msg }))
            }
            ApiError::AnalyticsUnavailable => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "message": ANALYTICS_FAILED }),
            ),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_map_to_statuses() {
        let cases = [
            (AuthError::MissingToken, StatusCode::UNAUTHORIZED),
            (AuthError::InvalidToken("x".into()), StatusCode::UNAUTHORIZED),
            (AuthError::SignInFailed("nope".into()), StatusCode::UNAUTHORIZED),
            (AuthError::EmailUnavailable, StatusCode::FORBIDDEN),
            (AuthError::AllowListNotConfigured, StatusCode::FORBIDDEN),
            (
                AuthError::NotAllowListed { email: "a@b.c".into() },
                StatusCode::FORBIDDEN,
            ),
            (AuthError::Provider("down".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn range_error_is_bad_request() {
        let resp = ApiError::from(RangeError::EndDateBeforeStartDate).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
