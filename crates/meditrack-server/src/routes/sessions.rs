//! POST /api/sessions: record a finished meditation session.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use meditrack_core::validation::validate_session_payload;
use meditrack_core::SessionStore;
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::extract::AuthUser;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCreated {
    pub session_id: String,
    pub message: &'static str,
}

pub async fn create_session(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<SessionCreated>)> {
    let raw: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|_| ApiError::BadRequest("Invalid session data: body must be JSON.".into()))?;
    let session = validate_session_payload(&raw).map_err(|e| {
        tracing::debug!(user_id = %user.user_id, reason = e.code(), "invalid session payload");
        ApiError::BadRequest(e.to_string())
    })?;

    let user_id = user.user_id.clone();
    let new_session = session.clone();
    let session_id = state
        .with_store(move |_, store| store.insert(&user_id, &new_session))
        .await?
        .map_err(|e| {
            tracing::error!(user_id = %user.user_id, error = %e, "session insert failed");
            ApiError::Internal("Failed to save session".into())
        })?;

    tracing::info!(
        user_id = %user.user_id,
        %session_id,
        duration_seconds = session.duration_seconds,
        "session saved"
    );
    Ok((
        StatusCode::CREATED,
        Json(SessionCreated {
            session_id,
            message: "Session saved successfully",
        }),
    ))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/sessions", post(create_session))
}
