//! Shared application state.

use crate::collector::Collector;
use crate::config::ExporterConfig;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Exporter configuration loaded at startup.
    pub config: Arc<ExporterConfig>,
    /// Scrape pipeline; holds the process-wide scrape error counter.
    pub collector: Arc<Collector>,
}
