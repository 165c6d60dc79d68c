//! Health check endpoints.

use crate::state::AppState;
use axum::{
    Router,
    body::Body,
    response::{IntoResponse, Response},
    routing::get,
};

pub const HEALTH_PATH: &str = "/health";

/// Registers health check routes.
pub fn routes() -> Router<AppState> {
    Router::new().route(HEALTH_PATH, get(health_check))
}

/// Returns 200 while the process is serving; does not touch the Outline API.
async fn health_check() -> impl IntoResponse {
    Response::new(Body::from("OK"))
}
