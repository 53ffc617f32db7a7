//! Region resolution
//!
//! Maps a coordinate to the model that should forecast it. A regional model
//! whose bounds contain the point always wins over the global fallback.
//! When bounds overlap, the region whose center is nearest to the point is
//! chosen, with the smaller region id breaking exact ties.

use crate::error::ForecastError;
use crate::models::{ModelParameters, RegionalModel};
use crate::repository::ModelRepository;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Where the selected model came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelSource {
    Regional,
    GlobalFallback,
}

impl ModelSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelSource::Regional => "regional",
            ModelSource::GlobalFallback => "global_fallback",
        }
    }
}

/// Outcome of resolving a coordinate
#[derive(Debug, Clone, Copy)]
pub struct Resolution<'a> {
    pub model: &'a ModelParameters,
    pub source: ModelSource,
}

/// Select the model for `(lat, lon)`
pub fn resolve(repo: &ModelRepository, lat: f64, lon: f64) -> Result<Resolution<'_>, ForecastError> {
    if let Some(regional) = best_regional_match(repo, lat, lon) {
        return Ok(Resolution {
            model: &regional.params,
            source: ModelSource::Regional,
        });
    }

    repo.fallback()
        .map(|fallback| Resolution {
            model: &fallback.params,
            source: ModelSource::GlobalFallback,
        })
        .ok_or(ForecastError::NoModelAvailable {
            latitude: lat,
            longitude: lon,
        })
}

fn best_regional_match(repo: &ModelRepository, lat: f64, lon: f64) -> Option<&RegionalModel> {
    // Iteration is ordered by region id, so min_by keeps the smaller id on ties.
    repo.all_regional_models()
        .filter(|m| m.bounds.contains(lat, lon))
        .map(|m| (center_distance_sq(m, lat, lon), m))
        .min_by(|(a, _), (b, _)| a.partial_cmp(b).unwrap_or(Ordering::Equal))
        .map(|(_, m)| m)
}

/// Squared equirectangular distance in degrees
fn center_distance_sq(model: &RegionalModel, lat: f64, lon: f64) -> f64 {
    let center = model.center();
    let dlat = lat - center.lat;
    let dlon = (lon - center.lon) * lat.to_radians().cos();
    dlat * dlat + dlon * dlon
}
