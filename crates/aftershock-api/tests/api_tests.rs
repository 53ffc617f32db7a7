//! Integration tests for the aftershock API endpoints

use aftershock_api::api::{create_router, AppState, CorsPolicy, SharedFeed};
use aftershock_lib::{
    feed::{CachedFeed, EarthquakeFeed, FeedError, FeedQuery},
    health::{components, HealthRegistry},
    EarthquakeEvent, Forecaster, ServiceMetrics,
};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

const SOCAL_MODEL: &str = r#"{
    "region_id": "region_socal",
    "bounds": {"lat": [32.0, 36.0], "lon": [-121.0, -114.0]},
    "center": {"lat": 34.0, "lon": -117.5},
    "omori": {"K": 12.0, "c": 0.05, "p": 1.08},
    "gr": {"a_value": 4.2, "b_value": 1.0},
    "data_quality": "high",
    "tectonic_setting": "transform",
    "n_sequences": 18,
    "n_total_aftershocks": 2400,
    "omori_r_squared": 0.93,
    "gr_r_squared": 0.97
}"#;

const GLOBAL_MODEL: &str = r#"{
    "region_id": "global",
    "omori": {"K": 8.0, "c": 0.05, "p": 1.1},
    "gr": {"a_value": 3.5, "b_value": 1.0},
    "data_quality": "global"
}"#;

/// Feed returning a fixed list, or failing when `events` is `None`
struct StubFeed {
    events: Option<Vec<EarthquakeEvent>>,
}

#[async_trait]
impl EarthquakeFeed for StubFeed {
    async fn recent(&self, _query: FeedQuery) -> Result<Vec<EarthquakeEvent>, FeedError> {
        match &self.events {
            Some(events) => Ok(events.clone()),
            None => Err(FeedError::Status {
                status: 503,
                body: "upstream down".to_string(),
            }),
        }
    }
}

fn event(id: &str, magnitude: f64) -> EarthquakeEvent {
    EarthquakeEvent {
        id: id.to_string(),
        magnitude: Some(magnitude),
        latitude: 35.7,
        longitude: -117.6,
        depth: 8.0,
        time: "2024-07-01T10:00:00+00:00".to_string(),
        place: "10 km N of Ridgecrest, CA".to_string(),
        updated: "2024-07-01T10:30:00+00:00".to_string(),
        url: "https://earthquake.usgs.gov/earthquakes/eventpage/ci1".to_string(),
        detail_url: String::new(),
    }
}

fn write_models(dir: &Path, with_fallback: bool) {
    fs::write(dir.join("region_socal.json"), SOCAL_MODEL).unwrap();
    if with_fallback {
        fs::write(dir.join("global_fallback.json"), GLOBAL_MODEL).unwrap();
    }
}

struct TestApp {
    router: Router,
    state: Arc<AppState>,
    _models: TempDir,
}

async fn setup(with_fallback: bool, events: Option<Vec<EarthquakeEvent>>, cors: CorsPolicy) -> TestApp {
    let models = TempDir::new().unwrap();
    write_models(models.path(), with_fallback);

    let forecaster = Arc::new(Forecaster::load(models.path()));
    let health_registry = HealthRegistry::new();
    health_registry.record_models(&forecaster.health()).await;
    health_registry.register(components::EARTHQUAKE_FEED).await;

    let stub: Arc<dyn EarthquakeFeed> = Arc::new(StubFeed { events });
    let feed: SharedFeed = Arc::new(
        CachedFeed::new(stub, Duration::from_secs(60)).with_metrics(ServiceMetrics::new()),
    );

    let state = Arc::new(AppState::new(forecaster, feed, health_registry, cors));
    TestApp {
        router: create_router(state.clone()),
        state,
        _models: models,
    }
}

async fn setup_test_app() -> TestApp {
    setup(true, Some(vec![event("ci1", 4.4), event("ci2", 6.1)]), CorsPolicy::Any).await
}

async fn get(router: Router, uri: &str) -> (StatusCode, Value) {
    let response = router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

async fn post_predict(router: Router, body: Value) -> (StatusCode, Value) {
    let response = router
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/predict")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_root_lists_endpoints() {
    let app = setup_test_app().await;
    let (status, body) = get(app.router, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "aftershock-api");
    assert_eq!(body["status"], "running");
    assert_eq!(body["endpoints"]["predict"], "/api/predict");
}

#[tokio::test]
async fn test_health_reports_models_and_components() {
    let app = setup_test_app().await;
    let (status, body) = get(app.router, "/api/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["models_loaded"], 1);
    assert_eq!(body["has_global_model"], true);
    assert!(body["components"][components::MODEL_REPOSITORY].is_object());
    assert!(body["components"][components::EARTHQUAKE_FEED].is_object());
}

#[tokio::test]
async fn test_health_degraded_without_fallback_still_ok() {
    let app = setup(false, Some(Vec::new()), CorsPolicy::Any).await;
    let (status, body) = get(app.router, "/api/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["has_global_model"], false);
}

#[tokio::test]
async fn test_predict_inside_region_uses_regional_model() {
    let app = setup_test_app().await;
    let (status, body) = post_predict(
        app.router,
        json!({"magnitude": 6.5, "latitude": 35.7, "longitude": -117.6}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["generated_at"].is_string());

    let prediction = &body["predictions"];
    assert_eq!(prediction["model_info"]["region_id"], "region_socal");
    assert_eq!(prediction["model_info"]["source"], "regional");
    assert_eq!(prediction["model_info"]["quality"], "high");
    assert!(prediction["forecasts"]["day_1"]["rate_per_day"].is_number());
    assert!(prediction["forecasts"]["day_365"].is_object());
    assert!(prediction["magnitude_probabilities"]["M5.0"].is_object());
    assert!(prediction["magnitude_probabilities"]["M6.5"].is_null());
    assert!(prediction["risk_assessment"]["level"].is_string());
    assert_eq!(
        prediction["risk_assessment"]["recommendations"]
            .as_array()
            .unwrap()
            .len(),
        5
    );
}

#[tokio::test]
async fn test_predict_honours_custom_horizons_and_thresholds() {
    let app = setup_test_app().await;
    let (status, body) = post_predict(
        app.router,
        json!({
            "magnitude": 7.0,
            "latitude": 34.0,
            "longitude": -117.0,
            "tectonic_setting": "transform",
            "horizons": [3, 14],
            "thresholds": [5.5]
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let prediction = &body["predictions"];
    assert_eq!(prediction["mainshock"]["tectonic_setting"], "transform");

    let forecasts = prediction["forecasts"].as_object().unwrap();
    assert_eq!(forecasts.len(), 2);
    assert!(forecasts.contains_key("day_3"));
    assert!(forecasts.contains_key("day_14"));

    let probabilities = prediction["magnitude_probabilities"].as_object().unwrap();
    assert_eq!(probabilities.len(), 1);
    assert!(probabilities.contains_key("M5.5"));
}

#[tokio::test]
async fn test_predict_outside_regions_uses_fallback() {
    let app = setup_test_app().await;
    let (status, body) = post_predict(
        app.router,
        json!({"magnitude": 6.0, "latitude": -10.0, "longitude": 120.0}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["predictions"]["model_info"]["source"], "global_fallback");
    assert_eq!(body["predictions"]["model_info"]["region_id"], "global");
}

#[tokio::test]
async fn test_predict_without_any_model_returns_503() {
    let app = setup(false, Some(Vec::new()), CorsPolicy::Any).await;
    let (status, body) = post_predict(
        app.router,
        json!({"magnitude": 6.0, "latitude": -10.0, "longitude": 120.0}),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "no_model_available");
}

#[tokio::test]
async fn test_predict_rejects_out_of_range_magnitude() {
    let app = setup_test_app().await;
    let (status, body) = post_predict(
        app.router,
        json!({"magnitude": 2.0, "latitude": 35.0, "longitude": -117.0}),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "invalid_input");
    assert!(body["message"].as_str().unwrap().contains("magnitude"));
}

#[tokio::test]
async fn test_predict_rejects_zero_horizon() {
    let app = setup_test_app().await;
    let (status, body) = post_predict(
        app.router,
        json!({"magnitude": 6.0, "latitude": 35.0, "longitude": -117.0, "horizons": [0, 7]}),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "invalid_input");
}

#[tokio::test]
async fn test_predict_malformed_body_is_structured_error() {
    let app = setup_test_app().await;
    let (status, body) = post_predict(
        app.router.clone(),
        json!({"magnitude": 6.0, "latitude": 35.0, "longitude": -118.0, "horizons": [-1]}),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "invalid_input");
    assert!(body["message"].as_str().unwrap().contains("horizons"));

    let (status, body) =
        post_predict(app.router, json!({"latitude": 35.0, "longitude": -118.0})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "invalid_input");
    assert!(body["message"].as_str().unwrap().contains("magnitude"));
}

#[tokio::test]
async fn test_coverage_lists_regional_models() {
    let app = setup_test_app().await;
    let (status, body) = get(app.router, "/api/models/coverage").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_models"], 1);
    assert_eq!(body["has_global_fallback"], true);

    let region = &body["coverage"][0];
    assert_eq!(region["region_id"], "region_socal");
    assert_eq!(region["center"]["lat"], 34.0);
    assert_eq!(region["sequences"], 18);
    assert_eq!(region["tectonic_setting"], "transform");
}

#[tokio::test]
async fn test_model_details_found_and_missing() {
    let app = setup_test_app().await;

    let (status, body) = get(app.router.clone(), "/api/models/region_socal").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model"]["region_id"], "region_socal");
    assert_eq!(body["model"]["omori"]["K"], 12.0);
    assert!(body["retrieved_at"].is_string());

    let (status, body) = get(app.router, "/api/models/region_atlantis").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_earthquakes_returns_events_and_filters() {
    let app = setup_test_app().await;
    let (status, body) = get(app.router, "/api/earthquakes?days=3&min_magnitude=4.5").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["filters"]["days"], 3);
    assert_eq!(body["filters"]["min_magnitude"], 4.5);
    assert_eq!(body["earthquakes"][0]["id"], "ci1");
    assert!(body["fetched_at"].is_string());
}

#[tokio::test]
async fn test_earthquakes_second_request_served_from_cache() {
    let app = setup_test_app().await;

    let (status, _) = get(app.router.clone(), "/api/earthquakes").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = get(app.router, "/api/earthquakes").await;
    assert_eq!(status, StatusCode::OK);

    let stats = app.state.feed.stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 1);
}

#[tokio::test]
async fn test_earthquakes_rejects_invalid_query() {
    let app = setup_test_app().await;

    let (status, body) = get(app.router.clone(), "/api/earthquakes?days=0").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "invalid_input");

    let (status, _) = get(app.router.clone(), "/api/earthquakes?min_magnitude=1.0").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = get(app.router, "/api/earthquakes?days=abc").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "invalid_input");
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_earthquake_feed_failure_returns_502_and_degrades_health() {
    let app = setup(true, None, CorsPolicy::Any).await;

    let (status, body) = get(app.router.clone(), "/api/earthquakes").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "feed_unavailable");

    let (status, health) = get(app.router, "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "degraded");
    assert_eq!(
        health["components"][components::EARTHQUAKE_FEED]["status"],
        "degraded"
    );
}

#[tokio::test]
async fn test_cors_preflight_allows_any_origin() {
    let app = setup_test_app().await;

    let response = app
        .router
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/predict")
                .header(header::ORIGIN, "https://quake.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

#[tokio::test]
async fn test_cors_echoes_listed_origin_only() {
    let policy = CorsPolicy::from_origins(vec!["https://quake.example".to_string()]);
    let app = setup(true, Some(Vec::new()), policy).await;

    let request = |origin: &str| {
        Request::builder()
            .uri("/")
            .header(header::ORIGIN, origin)
            .body(Body::empty())
            .unwrap()
    };

    let allowed = app
        .router
        .clone()
        .oneshot(request("https://quake.example"))
        .await
        .unwrap();
    assert_eq!(
        allowed.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://quake.example"
    );

    let denied = app
        .router
        .oneshot(request("https://other.example"))
        .await
        .unwrap();
    assert!(denied
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}

#[tokio::test]
async fn test_metrics_endpoint_returns_prometheus_format() {
    let app = setup_test_app().await;

    let (status, _) = post_predict(
        app.router.clone(),
        json!({"magnitude": 6.5, "latitude": 35.7, "longitude": -117.6}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    app.state.metrics.observe_feed_latency(0.2);

    let response = app
        .router
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers().get("content-type").unwrap();
    assert!(content_type.to_str().unwrap().contains("text/plain"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let metrics_text = String::from_utf8(body.to_vec()).unwrap();

    assert!(metrics_text.contains("aftershock_prediction_latency_seconds_bucket"));
    assert!(metrics_text.contains("aftershock_predictions_total"));
    assert!(metrics_text.contains("aftershock_feed_latency_seconds_count"));
}
