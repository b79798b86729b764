//! # Meditrack Server
//!
//! HTTP backend storing meditation sessions and serving analytics.
//! Every `/api` endpoint except sign-in requires a bearer API token.

pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;

pub use state::AppState;

pub fn create_app(state: Arc<AppState>) -> Router {
    routes::api_routes().with_state(state)
}
