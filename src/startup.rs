//! Application startup and server initialization.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::client::{OutlineClient, RetryPolicy};
use crate::collector::Collector;
use crate::config::ExporterConfig;
use crate::routes;
use crate::state::AppState;

/// Builds the handler state: the Outline client and the collector around it.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be constructed.
pub fn build_state(config: Arc<ExporterConfig>) -> Result<AppState, reqwest::Error> {
    let client = OutlineClient::new(&config)?;
    let collector = Arc::new(Collector::new(
        client,
        config.page_limit,
        RetryPolicy::default(),
    ));

    Ok(AppState { config, collector })
}

/// Initializes and runs the exporter's HTTP server.
///
/// # Errors
///
/// Returns an error if the client cannot be built, the listen address cannot
/// be bound, or the server fails while running.
pub async fn run(config: Arc<ExporterConfig>) -> Result<(), Box<dyn std::error::Error>> {
    let state = build_state(config.clone())?;
    let app = routes::create_router(state);

    info!("Starting Outline Wiki exporter on {}", config.listen_address);
    info!("Using page limit of {} items", config.page_limit);
    if config.debug {
        info!("Debug mode enabled");
    }

    let listener = TcpListener::bind(&config.listen_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
