//! Observability infrastructure for the forecasting service
//!
//! Provides:
//! - Prometheus metrics (prediction latency, feed latency, model counts, error counters)
//! - Structured JSON logging with tracing

use crate::forecaster::{ModelHealth, PredictionResult};
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for prediction latency (in seconds)
const PREDICTION_BUCKETS: &[f64] = &[
    0.000_01, 0.000_05, 0.000_1, 0.000_5, 0.001, 0.005, 0.01, 0.05, 0.1,
];

/// Histogram buckets for upstream feed latency (in seconds)
const FEED_BUCKETS: &[f64] = &[0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ServiceMetricsInner> = OnceLock::new();

struct ServiceMetricsInner {
    prediction_latency_seconds: Histogram,
    predictions_total: IntCounterVec,
    prediction_errors_total: IntCounterVec,
    regional_models_loaded: IntGauge,
    fallback_model_loaded: IntGauge,
    feed_latency_seconds: Histogram,
    feed_errors_total: IntCounter,
    feed_cache_hits_total: IntCounter,
}

impl ServiceMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram!(
                "aftershock_prediction_latency_seconds",
                "Time spent resolving a model and computing a prediction",
                PREDICTION_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            predictions_total: register_int_counter_vec!(
                "aftershock_predictions_total",
                "Predictions generated, by model source",
                &["source"]
            )
            .expect("Failed to register predictions_total"),

            prediction_errors_total: register_int_counter_vec!(
                "aftershock_prediction_errors_total",
                "Rejected or failed predictions, by error category",
                &["category"]
            )
            .expect("Failed to register prediction_errors_total"),

            regional_models_loaded: register_int_gauge!(
                "aftershock_regional_models_loaded",
                "Number of regional models held in memory"
            )
            .expect("Failed to register regional_models_loaded"),

            fallback_model_loaded: register_int_gauge!(
                "aftershock_fallback_model_loaded",
                "1 if the global fallback model is loaded"
            )
            .expect("Failed to register fallback_model_loaded"),

            feed_latency_seconds: register_histogram!(
                "aftershock_feed_latency_seconds",
                "Time spent fetching recent earthquakes",
                FEED_BUCKETS.to_vec()
            )
            .expect("Failed to register feed_latency_seconds"),

            feed_errors_total: register_int_counter!(
                "aftershock_feed_errors_total",
                "Failed earthquake feed fetches"
            )
            .expect("Failed to register feed_errors_total"),

            feed_cache_hits_total: register_int_counter!(
                "aftershock_feed_cache_hits_total",
                "Earthquake listings served from cache"
            )
            .expect("Failed to register feed_cache_hits_total"),
        }
    }
}

/// Service metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct ServiceMetrics {
    _private: (),
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ServiceMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ServiceMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner().prediction_latency_seconds.observe(duration_secs);
    }

    pub fn inc_predictions(&self, source: &str) {
        self.inner().predictions_total.with_label_values(&[source]).inc();
    }

    pub fn inc_prediction_errors(&self, category: &str) {
        self.inner()
            .prediction_errors_total
            .with_label_values(&[category])
            .inc();
    }

    pub fn set_models_loaded(&self, models: &ModelHealth) {
        self.inner().regional_models_loaded.set(models.models_loaded as i64);
        self.inner()
            .fallback_model_loaded
            .set(i64::from(models.has_fallback));
    }

    pub fn observe_feed_latency(&self, duration_secs: f64) {
        self.inner().feed_latency_seconds.observe(duration_secs);
    }

    pub fn inc_feed_errors(&self) {
        self.inner().feed_errors_total.inc();
    }

    pub fn inc_feed_cache_hits(&self) {
        self.inner().feed_cache_hits_total.inc();
    }

    #[cfg(test)]
    pub(crate) fn feed_cache_hits(&self) -> u64 {
        self.inner().feed_cache_hits_total.get()
    }
}

/// Structured logger for service events
///
/// Provides consistent JSON-formatted logging for predictions, model
/// loading and feed activity.
#[derive(Clone)]
pub struct StructuredLogger {
    service: String,
}

impl StructuredLogger {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    /// Log a generated prediction
    pub fn log_prediction(&self, result: &PredictionResult, elapsed_us: u128) {
        info!(
            event = "prediction_generated",
            service = %self.service,
            magnitude = result.mainshock.magnitude,
            latitude = result.mainshock.latitude,
            longitude = result.mainshock.longitude,
            region_id = %result.model_info.region_id,
            source = result.model_info.source.as_str(),
            risk_level = result.risk_assessment.level.as_str(),
            risk_score = result.risk_assessment.score,
            elapsed_us = elapsed_us as u64,
            "Generated aftershock prediction"
        );
    }

    /// Log a rejected or failed prediction
    pub fn log_prediction_failure(&self, category: &str, message: &str) {
        warn!(
            event = "prediction_failed",
            service = %self.service,
            category = %category,
            error = %message,
            "Prediction failed"
        );
    }

    /// Log the outcome of model loading
    pub fn log_models_loaded(&self, models_dir: &str, models: &ModelHealth) {
        if models.models_loaded == 0 && !models.has_fallback {
            warn!(
                event = "models_loaded",
                service = %self.service,
                models_dir = %models_dir,
                models_loaded = 0,
                has_fallback = false,
                "No models loaded, every prediction will fail"
            );
        } else {
            info!(
                event = "models_loaded",
                service = %self.service,
                models_dir = %models_dir,
                models_loaded = models.models_loaded,
                has_fallback = models.has_fallback,
                "Models loaded"
            );
        }
    }

    /// Log a completed feed fetch
    pub fn log_feed_fetch(&self, days: u32, min_magnitude: f64, count: usize) {
        info!(
            event = "feed_fetched",
            service = %self.service,
            days = days,
            min_magnitude = min_magnitude,
            count = count,
            "Fetched recent earthquakes"
        );
    }

    /// Log a failed feed fetch
    pub fn log_feed_failure(&self, days: u32, min_magnitude: f64, error: &str) {
        warn!(
            event = "feed_failed",
            service = %self.service,
            days = days,
            min_magnitude = min_magnitude,
            error = %error,
            "Earthquake feed fetch failed"
        );
    }

    pub fn log_startup(&self, version: &str, addr: &str) {
        info!(
            event = "service_started",
            service = %self.service,
            version = %version,
            addr = %addr,
            "Aftershock service started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            service = %self.service,
            reason = %reason,
            "Aftershock service shutting down"
        );
    }
}
