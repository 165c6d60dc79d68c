//! HTTP route definitions and handlers.
//!
//! The exporter serves the scrape endpoint, a health check and a small home
//! page linking to the metrics.

mod health_routes;
mod home_routes;
mod metrics_routes;

use crate::state::AppState;
use axum::Router;

/// Creates the application router with all configured routes.
///
/// The metrics path takes precedence: the home page is left out when the
/// metrics are served from `/`, and the health check when they are served
/// from its path.
pub fn create_router(state: AppState) -> Router {
    let metrics_path = state.config.metrics_path.clone();
    let mut router = Router::new().merge(metrics_routes::routes(&metrics_path));
    if metrics_path != health_routes::HEALTH_PATH {
        router = router.merge(health_routes::routes());
    }
    if metrics_path != "/" {
        router = router.merge(home_routes::routes());
    }
    router.with_state(state)
}
