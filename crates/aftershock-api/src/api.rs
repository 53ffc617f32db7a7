//! HTTP API for predictions, model coverage, recent earthquakes, health and metrics

use aftershock_lib::{
    feed::{CachedFeed, EarthquakeFeed, FeedError, FeedQuery},
    health::{components, ComponentStatus, HealthRegistry},
    EarthquakeEvent, ForecastError, Forecaster, PredictionRequest, ServiceMetrics,
    StructuredLogger,
};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, Request, State,
    },
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use prometheus::{Encoder, TextEncoder};
use serde::Deserialize;
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

pub const SERVICE_NAME: &str = "aftershock-api";

const DAYS_RANGE: (u32, u32) = (1, 365);
const MIN_MAGNITUDE_RANGE: (f64, f64) = (2.5, 10.0);

/// Feed type held by the service: any feed behind the listing cache
pub type SharedFeed = Arc<CachedFeed<Arc<dyn EarthquakeFeed>>>;

/// Origins allowed to call the API from a browser
#[derive(Debug, Clone, PartialEq)]
pub enum CorsPolicy {
    Any,
    List(Vec<String>),
}

impl CorsPolicy {
    /// Build from a list of origins; an empty list allows any origin
    pub fn from_origins(origins: Vec<String>) -> Self {
        if origins.is_empty() {
            CorsPolicy::Any
        } else {
            CorsPolicy::List(origins)
        }
    }

    fn allow_origin(&self, request_origin: Option<&HeaderValue>) -> Option<HeaderValue> {
        match self {
            CorsPolicy::Any => Some(HeaderValue::from_static("*")),
            CorsPolicy::List(origins) => {
                let origin = request_origin?;
                let value = origin.to_str().ok()?;
                origins
                    .iter()
                    .any(|allowed| allowed == value)
                    .then(|| origin.clone())
            }
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub forecaster: Arc<Forecaster>,
    pub feed: SharedFeed,
    pub health_registry: HealthRegistry,
    pub metrics: ServiceMetrics,
    pub logger: StructuredLogger,
    pub cors: CorsPolicy,
}

impl AppState {
    pub fn new(
        forecaster: Arc<Forecaster>,
        feed: SharedFeed,
        health_registry: HealthRegistry,
        cors: CorsPolicy,
    ) -> Self {
        Self {
            forecaster,
            feed,
            health_registry,
            metrics: ServiceMetrics::new(),
            logger: StructuredLogger::new(SERVICE_NAME),
            cors,
        }
    }
}

/// Error returned by handlers, rendered as `{error, message}`
#[derive(Debug)]
pub enum ApiError {
    Forecast(ForecastError),
    Feed(FeedError),
}

impl From<ForecastError> for ApiError {
    fn from(err: ForecastError) -> Self {
        ApiError::Forecast(err)
    }
}

impl From<FeedError> for ApiError {
    fn from(err: FeedError) -> Self {
        ApiError::Feed(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Forecast(ForecastError::InvalidInput(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Forecast(ForecastError::InvalidInput(rejection.body_text()))
    }
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Forecast(ForecastError::InvalidInput(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Forecast(ForecastError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Forecast(ForecastError::NoModelAvailable { .. }) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::Feed(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn category(&self) -> &'static str {
        match self {
            ApiError::Forecast(err) => err.category(),
            ApiError::Feed(_) => "feed_unavailable",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            ApiError::Forecast(err) => err.to_string(),
            ApiError::Feed(err) => err.to_string(),
        };
        let body = json!({
            "error": self.category(),
            "message": message,
        });
        (self.status_code(), Json(body)).into_response()
    }
}

/// Service index
async fn root() -> impl IntoResponse {
    Json(json!({
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "endpoints": {
            "health": "/api/health",
            "earthquakes": "/api/earthquakes",
            "predict": "/api/predict",
            "coverage": "/api/models/coverage",
            "model": "/api/models/{region_id}",
            "metrics": "/metrics",
        },
    }))
}

/// Health check - returns 200 if operational, 503 if unhealthy
async fn api_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;
    let models = state.forecaster.health();

    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    let body = json!({
        "status": health.status,
        "models_loaded": models.models_loaded,
        "has_global_model": models.has_fallback,
        "components": health.components,
        "timestamp": Utc::now().to_rfc3339(),
    });

    (status_code, Json(body))
}

#[derive(Debug, Deserialize)]
pub struct EarthquakeParams {
    pub days: Option<u32>,
    pub min_magnitude: Option<f64>,
}

impl EarthquakeParams {
    fn into_query(self) -> Result<FeedQuery, ForecastError> {
        let defaults = FeedQuery::default();
        let days = self.days.unwrap_or(defaults.days);
        let min_magnitude = self.min_magnitude.unwrap_or(defaults.min_magnitude);

        if !(DAYS_RANGE.0..=DAYS_RANGE.1).contains(&days) {
            return Err(ForecastError::InvalidInput(format!(
                "days must be between {} and {}, got {}",
                DAYS_RANGE.0, DAYS_RANGE.1, days
            )));
        }
        if !(MIN_MAGNITUDE_RANGE.0..=MIN_MAGNITUDE_RANGE.1).contains(&min_magnitude) {
            return Err(ForecastError::InvalidInput(format!(
                "min_magnitude must be between {} and {}, got {}",
                MIN_MAGNITUDE_RANGE.0, MIN_MAGNITUDE_RANGE.1, min_magnitude
            )));
        }

        Ok(FeedQuery {
            days,
            min_magnitude,
        })
    }
}

/// Recent earthquakes from the catalog feed
async fn earthquakes(
    State(state): State<Arc<AppState>>,
    params: Result<Query<EarthquakeParams>, QueryRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Query(params) = params?;
    let query = params.into_query()?;

    let start = Instant::now();
    let result = state.feed.recent(query).await;
    state
        .metrics
        .observe_feed_latency(start.elapsed().as_secs_f64());

    let events: Vec<EarthquakeEvent> = match result {
        Ok(events) => events,
        Err(err) => {
            state.metrics.inc_feed_errors();
            state
                .logger
                .log_feed_failure(query.days, query.min_magnitude, &err.to_string());
            state
                .health_registry
                .set_degraded(components::EARTHQUAKE_FEED, err.to_string())
                .await;
            return Err(err.into());
        }
    };

    state.health_registry.set_healthy(components::EARTHQUAKE_FEED).await;
    state
        .logger
        .log_feed_fetch(query.days, query.min_magnitude, events.len());

    Ok(Json(json!({
        "count": events.len(),
        "earthquakes": events,
        "filters": {
            "days": query.days,
            "min_magnitude": query.min_magnitude,
        },
        "fetched_at": Utc::now().to_rfc3339(),
    })))
}

/// Run a prediction for one mainshock
async fn predict(
    State(state): State<Arc<AppState>>,
    request: Result<Json<PredictionRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Json(request) = request?;
    let start = Instant::now();
    let result = state.forecaster.resolve_and_predict(&request);
    let elapsed = start.elapsed();
    state
        .metrics
        .observe_prediction_latency(elapsed.as_secs_f64());

    match result {
        Ok(prediction) => {
            state
                .metrics
                .inc_predictions(prediction.model_info.source.as_str());
            state.logger.log_prediction(&prediction, elapsed.as_micros());

            Ok(Json(json!({
                "success": true,
                "predictions": prediction,
                "generated_at": Utc::now().to_rfc3339(),
            })))
        }
        Err(err) => {
            state.metrics.inc_prediction_errors(err.category());
            state
                .logger
                .log_prediction_failure(err.category(), &err.to_string());
            Err(err.into())
        }
    }
}

/// Every regional model the service can resolve to
async fn coverage(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let coverage = state.forecaster.list_coverage();
    let models = state.forecaster.health();

    Json(json!({
        "total_models": coverage.len(),
        "has_global_fallback": models.has_fallback,
        "coverage": coverage,
    }))
}

/// Full parameters of one regional model
async fn model_details(
    State(state): State<Arc<AppState>>,
    Path(region_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let model = state.forecaster.get_model(&region_id)?;

    Ok(Json(json!({
        "model": model,
        "retrieved_at": Utc::now().to_rfc3339(),
    })))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %err, "Failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, encoder.format_type().to_string())],
        buffer,
    )
        .into_response()
}

/// Answer preflight requests and stamp CORS headers on every response
async fn cors(State(state): State<Arc<AppState>>, request: Request, next: Next) -> Response {
    let allow_origin = state.cors.allow_origin(request.headers().get(header::ORIGIN));

    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };

    if let Some(origin) = allow_origin {
        let headers: &mut HeaderMap = response.headers_mut();
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, POST, OPTIONS"),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("content-type"),
        );
        headers.append(header::VARY, HeaderValue::from_static("origin"));
    }

    response
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api/health", get(api_health))
        .route("/api/earthquakes", get(earthquakes))
        .route("/api/predict", post(predict))
        .route("/api/models/coverage", get(coverage))
        .route("/api/models/:region_id", get(model_details))
        .route("/metrics", get(metrics))
        .layer(middleware::from_fn_with_state(Arc::clone(&state), cors))
        .with_state(state)
}

/// Start the API server and run until `shutdown` resolves
pub async fn serve<S>(port: u16, state: Arc<AppState>, shutdown: S) -> anyhow::Result<()>
where
    S: Future<Output = ()> + Send + 'static,
{
    let logger = state.logger.clone();
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    logger.log_startup(env!("CARGO_PKG_VERSION"), &addr);
    info!(addr = %addr, "Starting API server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
