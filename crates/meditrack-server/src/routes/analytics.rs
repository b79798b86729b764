//! GET /api/analytics: totals, averages and streaks for a date range.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use meditrack_core::AnalyticsResult;
use serde::Deserialize;

use crate::error::ApiResult;
use crate::extract::AuthUser;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

pub async fn get_analytics(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<AnalyticsQuery>,
) -> ApiResult<Json<AnalyticsResult>> {
    let result = state
        .with_store(move |state, store| {
            state.analytics.get_analytics(
                store,
                &user.user_id,
                query.start_date.as_deref(),
                query.end_date.as_deref(),
            )
        })
        .await??;
    Ok(Json(result))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/analytics", get(get_analytics))
}
