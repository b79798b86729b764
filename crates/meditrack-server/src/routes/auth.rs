//! POST /api/auth/google: trade a Google ID token for an API token.
//!
//! Sign-in succeeds only for emails on the allow-list. An empty allow-list
//! denies everyone.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use meditrack_core::auth::Claims;
use meditrack_core::AuthError;
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenIssued {
    pub api_token: String,
}

pub async fn google_sign_in(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<Json<TokenIssued>> {
    let google_token = serde_json::from_slice::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("googleToken")?.as_str().map(str::to_string))
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing googleToken in request body".into()))?;

    let identity = state
        .identity
        .sign_in_with_id_token(&google_token)
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "Google sign-in failed");
            e
        })?;

    let email = identity.email.clone().ok_or_else(|| {
        tracing::warn!(user_id = %identity.user_id, "signed in without an email address");
        AuthError::EmailUnavailable
    })?;
    if let Err(e) = state.allow_list.check(&email) {
        tracing::warn!(email = %email, error = %e, "sign-in denied by allow-list");
        return Err(e.into());
    }

    let claims = Claims {
        user_id: identity.user_id,
        email: Some(email),
        iat: chrono::Utc::now().timestamp(),
    };
    let api_token = state.signer.issue(&claims).map_err(|e| {
        tracing::error!(error = %e, "failed to sign API token");
        ApiError::Internal("An unexpected error occurred during authentication.".into())
    })?;

    tracing::info!(user_id = %claims.user_id, "API token issued");
    Ok(Json(TokenIssued { api_token }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/auth/google", post(google_sign_in))
}
