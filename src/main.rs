use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use parcel_api::AppState;
use parcel_core::Config;
use parcel_services::{PropertyRepository, PropertyService, SqlitePropertyStore};
use parcel_weather::{RetryPolicy, WeatherClient};

/// Headroom added on top of the weather client's worst case before the
/// server gives up on a request.
const REQUEST_TIMEOUT_MARGIN: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    parcel_core::init(&config.logging.level)?;

    let validation = config.validate();
    for warning in &validation.warnings {
        tracing::warn!("Config: {}", warning);
    }
    if !validation.is_valid() {
        anyhow::bail!("Invalid configuration: {}", validation.error_summary());
    }

    if let Some(parent) = config.database.path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create data directory {}", parent.display()))?;
    }
    let store = SqlitePropertyStore::new(&config.database.path)?;
    tracing::info!("Property store at {}", config.database.path.display());

    let weather = WeatherClient::new(
        &config.weather.base_url,
        config.weather.access_key.clone().unwrap_or_default(),
        config.weather.timeout(),
    )?
    .with_units(config.weather.units.clone())
    .with_retry_policy(RetryPolicy::new(
        config.weather.max_attempts,
        config.weather.backoff_unit(),
    ));

    let service = PropertyService::new(Arc::new(weather), PropertyRepository::sqlite(store));
    let request_timeout = config.weather.worst_case_latency() + REQUEST_TIMEOUT_MARGIN;
    let app = parcel_api::router(AppState::new(service), request_timeout);

    parcel_api::serve(&config.server.bind_address(), app).await
}
