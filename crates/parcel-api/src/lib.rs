//! HTTP boundary for the property service.

use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use parcel_services::PropertyService;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;

pub mod error;
pub mod routes;

pub use error::ApiError;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub service: PropertyService,
}

impl AppState {
    pub fn new(service: PropertyService) -> Self {
        Self { service }
    }
}

/// Build the application router.
///
/// `request_timeout` must exceed the weather client's worst-case latency so
/// a creation that is still retrying is never cut off by the server.
pub fn router(state: AppState, request_timeout: Duration) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    routes::router()
        .with_state(state)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(cors)
}

/// Bind `addr` and serve until Ctrl-C.
///
/// # Errors
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(addr: &str, app: Router) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Parcel API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    tracing::info!("Parcel API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
