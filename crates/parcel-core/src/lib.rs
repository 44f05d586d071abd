pub mod config;

pub use config::{
    Config, ConfigValidationError, DatabaseConfig, LoggingConfig, ServerConfig, ValidationResult,
    WeatherConfig,
};

use anyhow::Result;

/// Initialize tracing/logging.
///
/// `RUST_LOG` takes precedence; otherwise `default_level` (usually
/// `logging.level` from the config file) is used.
pub fn init(default_level: &str) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    tracing::info!("Parcel core initialized");
    Ok(())
}
