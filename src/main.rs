use std::sync::Arc;

use tracing::{error, warn};

use outline_exporter::config::load_config;
use outline_exporter::startup;
use outline_exporter::utils::logger::init_logging;

#[tokio::main]
async fn main() {
    let loaded = match load_config() {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    init_logging(&loaded.config.logging);
    for warning in &loaded.warnings {
        warn!("{}", warning);
    }

    if let Err(e) = startup::run(Arc::new(loaded.config)).await {
        error!("Exporter stopped: {}", e);
        std::process::exit(1);
    }
}
