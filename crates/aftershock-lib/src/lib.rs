//! Aftershock forecasting library
//!
//! This crate provides the core functionality for:
//! - Loading trained regional models and the global fallback
//! - Resolving a mainshock location to a model
//! - Omori decay forecasts and Gutenberg-Richter exceedance probabilities
//! - Risk assessment
//! - The USGS earthquake feed, health checks and observability

pub mod error;
pub mod feed;
pub mod forecaster;
pub mod health;
pub mod models;
pub mod observability;
pub mod predictor;
pub mod repository;
pub mod resolver;

pub use error::{ForecastError, ModelLoadError};
pub use forecaster::{
    Forecaster, Mainshock, ModelHealth, ModelInfo, PredictionResult, RegionSummary,
};
pub use health::{ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse};
pub use models::*;
pub use observability::{ServiceMetrics, StructuredLogger};
pub use repository::ModelRepository;
pub use resolver::{resolve, ModelSource, Resolution};
