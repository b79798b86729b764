pub mod analytics;
pub mod auth;
pub mod sessions;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;

pub const BANNER: &str = "Hello from the Meditrack backend!";

async fn root() -> &'static str {
    BANNER
}

/// All `/api` routes plus the liveness banner at `/`.
pub fn api_routes() -> Router<Arc<AppState>> {
    let api = Router::new()
        .merge(sessions::router())
        .merge(analytics::router())
        .merge(auth::router());
    Router::new().route("/", get(root)).nest("/api", api)
}
