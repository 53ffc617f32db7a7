//! Forecaster facade
//!
//! Owns the model repository and exposes the operations the transport layer
//! calls. Constructed once at startup and shared behind an `Arc`; everything
//! here is a pure function of the request and the immutable repository.

use crate::error::ForecastError;
use crate::models::{Bounds, Coordinate, PredictionRequest, RegionalModel, MAGNITUDE_RANGE};
use crate::predictor::{self, Forecasts, MagnitudeProbabilities, RiskAssessment};
use crate::repository::ModelRepository;
use crate::resolver::{self, ModelSource};
use serde::Serialize;
use std::path::Path;
use tracing::debug;

/// Mainshock parameters echoed back in the result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mainshock {
    pub magnitude: f64,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tectonic_setting: Option<String>,
}

/// Which model produced the forecast and how well it was trained
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelInfo {
    pub region_id: String,
    pub source: ModelSource,
    pub quality: String,
    pub tectonic_setting: String,
    pub training_sequences: u64,
    pub training_aftershocks: u64,
    pub omori_r_squared: f64,
    pub gr_r_squared: f64,
}

/// Complete aftershock prediction for one mainshock
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub mainshock: Mainshock,
    pub model_info: ModelInfo,
    pub forecasts: Forecasts,
    pub magnitude_probabilities: MagnitudeProbabilities,
    pub risk_assessment: RiskAssessment,
}

/// Coverage entry for one regional model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionSummary {
    pub region_id: String,
    pub center: Coordinate,
    pub bounds: Bounds,
    pub quality: String,
    pub sequences: u64,
    pub aftershocks: u64,
    pub tectonic_setting: String,
}

/// Model counts reported by health checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModelHealth {
    pub models_loaded: usize,
    pub has_fallback: bool,
}

pub struct Forecaster {
    repository: ModelRepository,
}

impl Forecaster {
    pub fn new(repository: ModelRepository) -> Self {
        Self { repository }
    }

    /// Load the repository from a models directory
    pub fn load(models_dir: &Path) -> Self {
        Self::new(ModelRepository::load(models_dir))
    }

    /// Select a model for the mainshock location and run every engine
    pub fn resolve_and_predict(
        &self,
        request: &PredictionRequest,
    ) -> Result<PredictionResult, ForecastError> {
        validate_request(request)?;

        let resolution = resolver::resolve(&self.repository, request.latitude, request.longitude)?;
        let model = resolution.model;
        debug!(
            region_id = %model.region_id,
            source = resolution.source.as_str(),
            "Resolved model"
        );

        let forecasts = predictor::forecast(&model.omori, request.horizons());
        let probabilities =
            predictor::magnitude_probabilities(&model.gr, request.magnitude, request.thresholds());

        // Risk always uses the day-one rate, whichever horizons were requested.
        let day1_rate = predictor::rate_at(&model.omori, 1.0);
        let risk_assessment = predictor::assess(request.magnitude, day1_rate, &probabilities);

        let metadata = &model.metadata;
        Ok(PredictionResult {
            mainshock: Mainshock {
                magnitude: request.magnitude,
                latitude: request.latitude,
                longitude: request.longitude,
                tectonic_setting: request.tectonic_setting.clone(),
            },
            model_info: ModelInfo {
                region_id: model.region_id.clone(),
                source: resolution.source,
                quality: metadata.quality().to_string(),
                tectonic_setting: metadata.setting().to_string(),
                training_sequences: metadata.n_sequences,
                training_aftershocks: metadata.n_total_aftershocks,
                omori_r_squared: metadata.omori_r_squared,
                gr_r_squared: metadata.gr_r_squared,
            },
            forecasts,
            magnitude_probabilities: probabilities,
            risk_assessment,
        })
    }

    /// Summaries of every regional model, ordered by region id
    pub fn list_coverage(&self) -> Vec<RegionSummary> {
        self.repository
            .all_regional_models()
            .map(|model| {
                let metadata = &model.params.metadata;
                RegionSummary {
                    region_id: model.region_id().to_string(),
                    center: model.center(),
                    bounds: model.bounds,
                    quality: metadata.quality().to_string(),
                    sequences: metadata.n_sequences,
                    aftershocks: metadata.n_total_aftershocks,
                    tectonic_setting: metadata.setting().to_string(),
                }
            })
            .collect()
    }

    pub fn get_model(&self, region_id: &str) -> Result<&RegionalModel, ForecastError> {
        self.repository
            .lookup_by_region_id(region_id)
            .ok_or_else(|| ForecastError::NotFound(region_id.to_string()))
    }

    pub fn health(&self) -> ModelHealth {
        ModelHealth {
            models_loaded: self.repository.regional_count(),
            has_fallback: self.repository.has_fallback(),
        }
    }
}

/// Reject out-of-range requests before any model is consulted
pub fn validate_request(request: &PredictionRequest) -> Result<(), ForecastError> {
    let (min_mag, max_mag) = MAGNITUDE_RANGE;
    if !(min_mag..=max_mag).contains(&request.magnitude) {
        return Err(ForecastError::InvalidInput(format!(
            "magnitude must be between {} and {}, got {}",
            min_mag, max_mag, request.magnitude
        )));
    }
    if !(-90.0..=90.0).contains(&request.latitude) {
        return Err(ForecastError::InvalidInput(format!(
            "latitude must be between -90 and 90, got {}",
            request.latitude
        )));
    }
    if !(-180.0..=180.0).contains(&request.longitude) {
        return Err(ForecastError::InvalidInput(format!(
            "longitude must be between -180 and 180, got {}",
            request.longitude
        )));
    }

    let horizons = request.horizons();
    if horizons.is_empty() || horizons.contains(&0) {
        return Err(ForecastError::InvalidInput(
            "horizons must be a non-empty list of positive days".to_string(),
        ));
    }
    if request.thresholds().iter().any(|m| !m.is_finite()) {
        return Err(ForecastError::InvalidInput(
            "thresholds must be finite magnitudes".to_string(),
        ));
    }

    Ok(())
}
