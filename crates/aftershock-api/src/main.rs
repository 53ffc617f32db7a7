//! Aftershock API - HTTP front end for the forecasting library
//!
//! Loads the trained models once at startup and serves predictions, model
//! coverage and the recent-earthquakes listing until interrupted.

use aftershock_api::{
    api::{self, AppState, CorsPolicy, SharedFeed},
    config::ApiConfig,
};
use aftershock_lib::{
    feed::{CachedFeed, EarthquakeFeed, UsgsFeed},
    health::{components, HealthRegistry},
    Forecaster, ServiceMetrics,
};
use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting aftershock-api");

    let config = ApiConfig::load()?;
    info!(
        models_dir = %config.models_dir.display(),
        port = config.port,
        "API configured"
    );

    // Models are read once; the repository is immutable from here on
    let forecaster = Arc::new(Forecaster::load(&config.models_dir));
    let models = forecaster.health();

    let health_registry = HealthRegistry::new();
    health_registry.record_models(&models).await;
    health_registry.register(components::EARTHQUAKE_FEED).await;

    let usgs: Arc<dyn EarthquakeFeed> =
        Arc::new(UsgsFeed::new(&config.usgs_api_url, config.max_results)?);
    let feed: SharedFeed = Arc::new(
        CachedFeed::new(usgs, config.cache_duration()).with_metrics(ServiceMetrics::new()),
    );

    let state = AppState::new(
        forecaster,
        feed,
        health_registry,
        CorsPolicy::from_origins(config.origins()),
    );
    state
        .logger
        .log_models_loaded(&config.models_dir.display().to_string(), &models);
    state.metrics.set_models_loaded(&models);

    let logger = state.logger.clone();
    api::serve(config.port, Arc::new(state), async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "Failed to listen for shutdown signal");
        }
    })
    .await?;

    logger.log_shutdown("SIGINT received");
    Ok(())
}
