//! Bearer-token authentication extractor.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use meditrack_core::auth::bearer_token;
use meditrack_core::AuthError;

use crate::error::ApiError;
use crate::state::AppState;

/// The caller, as identified by a verified API token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub email: Option<String>,
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AuthError::MissingToken)?;
        let token = bearer_token(header).ok_or(AuthError::MissingToken)?;

        let claims = state.signer.verify(token).map_err(|e| {
            tracing::warn!(error = %e, "rejected API token");
            e
        })?;
        if claims.user_id.is_empty() {
            return Err(AuthError::InvalidToken("empty subject".into()).into());
        }

        Ok(AuthUser {
            user_id: claims.user_id,
            email: claims.email,
        })
    }
}
