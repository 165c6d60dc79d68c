//! Metrics exposition endpoint.

use axum::http::header::CONTENT_TYPE;
use axum::{Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use tracing::error;

use crate::metrics::RegistryRecorder;
use crate::state::AppState;
use crate::utils::http_helpers::HTTPError;

/// Creates the metrics route at the configured path.
pub fn routes(metrics_path: &str) -> Router<AppState> {
    Router::new().route(metrics_path, get(metrics_handler))
}

/// Runs one scrape of the Outline API and returns its samples in Prometheus
/// text format.
async fn metrics_handler(State(state): State<AppState>) -> Result<impl IntoResponse, HTTPError> {
    let mut recorder = RegistryRecorder::new();
    state.collector.collect(&mut recorder).await;

    let metrics_text = recorder.render().map_err(|e| {
        error!("Failed to encode metrics: {}", e);
        HTTPError::internal(format!("failed to encode metrics: {}", e))
    })?;

    Ok((
        StatusCode::OK,
        [(CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        metrics_text,
    ))
}
