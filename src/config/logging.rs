use tracing::level_filters::LevelFilter;

/// Output format of the log stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// OTel-aligned JSON lines.
    Json,
    #[default]
    Console,
}

/// LoggingConfig controls how we initialize tracing/logging.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    pub level: LevelFilter,
    pub format: LogFormat,
    pub service_name: String,
    pub service_version: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::INFO,
            format: LogFormat::Console,
            service_name: env!("CARGO_PKG_NAME").to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Parses a level name (trace, debug, info, warn, error).
pub fn parse_level(level: &str) -> Option<LevelFilter> {
    match level.trim().to_lowercase().as_str() {
        "trace" => Some(LevelFilter::TRACE),
        "debug" => Some(LevelFilter::DEBUG),
        "info" => Some(LevelFilter::INFO),
        "warn" => Some(LevelFilter::WARN),
        "error" => Some(LevelFilter::ERROR),
        _ => None,
    }
}
