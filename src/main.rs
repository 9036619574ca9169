//! Gatekeeper server entry point.
//!
//! Loads configuration, installs logging, and runs the gate until a
//! shutdown signal arrives.

use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use gatekeeper_core::config::AppConfig;
use gatekeeper_core::config::logging::LoggingConfig;
use gatekeeper_core::error::AppError;

#[tokio::main]
async fn main() {
    let env = std::env::var("GATEKEEPER_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = init_logging(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        std::process::exit(1);
    }

    tracing::info!(env = %env, version = env!("CARGO_PKG_VERSION"), "Starting Gatekeeper");

    if let Err(e) = gatekeeper_api::run_server(config).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the global subscriber: a console sink in the configured format,
/// plus a JSON file sink when `logging.file` is set.
fn init_logging(config: &LoggingConfig) -> Result<(), AppError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let mut layers: Vec<BoxedLayer> = Vec::with_capacity(2);

    layers.push(match config.format.as_str() {
        "pretty" => fmt::layer().pretty().with_target(true).boxed(),
        _ => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .boxed(),
    });

    if let Some(path) = &config.file {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        layers.push(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .init();

    Ok(())
}
