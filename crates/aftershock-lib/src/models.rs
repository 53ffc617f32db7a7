//! Core data models for the aftershock forecaster
//!
//! Model files are produced by the offline training pipeline. The field
//! names follow that JSON layout (`omori`, `gr`, `bounds`, ...).

use serde::{Deserialize, Deserializer, Serialize};

/// Default forecast horizons in days
pub const DEFAULT_HORIZONS: &[u32] = &[1, 7, 30, 365];

/// Default magnitude thresholds for exceedance probabilities
pub const DEFAULT_THRESHOLDS: &[f64] = &[3.0, 4.0, 4.5, 5.0, 5.5, 6.0, 6.5];

/// Accepted mainshock magnitude range (inclusive)
pub const MAGNITUDE_RANGE: (f64, f64) = (3.0, 10.0);

/// Geographic coordinate in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl<'de> Deserialize<'de> for Coordinate {
    // Training output writes centers either as an object or as a [lat, lon] pair.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Object { lat: f64, lon: f64 },
            Pair([f64; 2]),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Object { lat, lon } => Coordinate { lat, lon },
            Repr::Pair([lat, lon]) => Coordinate { lat, lon },
        })
    }
}

/// Rectangular geographic extent, `[min, max]` on each axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub lat: [f64; 2],
    pub lon: [f64; 2],
}

impl Bounds {
    /// Inclusive containment test on both axes
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        self.lat[0] <= lat && lat <= self.lat[1] && self.lon[0] <= lon && lon <= self.lon[1]
    }

    pub fn midpoint(&self) -> Coordinate {
        Coordinate {
            lat: (self.lat[0] + self.lat[1]) / 2.0,
            lon: (self.lon[0] + self.lon[1]) / 2.0,
        }
    }
}

/// Modified Omori law parameters: `rate(t) = K / (t + c)^p`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OmoriParams {
    #[serde(rename = "K")]
    pub k: f64,
    pub c: f64,
    pub p: f64,
}

/// Gutenberg-Richter parameters: `log10 N(M) = a - b*M`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrParams {
    pub a_value: f64,
    pub b_value: f64,
}

/// Training metadata. Advisory only; never drives model selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_quality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tectonic_setting: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub n_sequences: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub n_total_aftershocks: u64,
    #[serde(default, deserialize_with = "lenient_float")]
    pub omori_r_squared: f64,
    #[serde(default, deserialize_with = "lenient_float")]
    pub gr_r_squared: f64,
}

/// Count written as an integer, a float or `null`; anything unusable reads as 0
fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(value
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v.round() as u64)
        .unwrap_or(0))
}

/// Float or `null`; `null` and non-finite values read as 0.0
fn lenient_float<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(value.filter(|v| v.is_finite()).unwrap_or(0.0))
}

impl ModelMetadata {
    pub fn quality(&self) -> &str {
        self.data_quality.as_deref().unwrap_or("unknown")
    }

    pub fn setting(&self) -> &str {
        self.tectonic_setting.as_deref().unwrap_or("unknown")
    }
}

/// Parameters shared by regional and fallback models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParameters {
    pub region_id: String,
    #[serde(rename = "omori", alias = "omori_params")]
    pub omori: OmoriParams,
    #[serde(rename = "gr", alias = "gr_params")]
    pub gr: GrParams,
    #[serde(flatten)]
    pub metadata: ModelMetadata,
}

/// A trained model covering a rectangular region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionalModel {
    #[serde(flatten)]
    pub params: ModelParameters,
    pub bounds: Bounds,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<Coordinate>,
}

impl RegionalModel {
    pub fn region_id(&self) -> &str {
        &self.params.region_id
    }

    /// Declared center, or the bounds midpoint when the file has none
    pub fn center(&self) -> Coordinate {
        self.center.unwrap_or_else(|| self.bounds.midpoint())
    }
}

/// The global model used when no region matches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackModel {
    #[serde(flatten)]
    pub params: ModelParameters,
}

/// A prediction request for a single mainshock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub magnitude: f64,
    pub latitude: f64,
    pub longitude: f64,
    /// Accepted and echoed back; not used for model selection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tectonic_setting: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horizons: Option<Vec<u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thresholds: Option<Vec<f64>>,
}

impl PredictionRequest {
    pub fn new(magnitude: f64, latitude: f64, longitude: f64) -> Self {
        Self {
            magnitude,
            latitude,
            longitude,
            tectonic_setting: None,
            horizons: None,
            thresholds: None,
        }
    }

    pub fn with_tectonic_setting(mut self, setting: impl Into<String>) -> Self {
        self.tectonic_setting = Some(setting.into());
        self
    }

    pub fn with_horizons(mut self, horizons: Vec<u32>) -> Self {
        self.horizons = Some(horizons);
        self
    }

    pub fn with_thresholds(mut self, thresholds: Vec<f64>) -> Self {
        self.thresholds = Some(thresholds);
        self
    }

    pub fn horizons(&self) -> &[u32] {
        self.horizons.as_deref().unwrap_or(DEFAULT_HORIZONS)
    }

    pub fn thresholds(&self) -> &[f64] {
        self.thresholds.as_deref().unwrap_or(DEFAULT_THRESHOLDS)
    }
}

/// Earthquake record from the upstream catalog feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarthquakeEvent {
    pub id: String,
    pub magnitude: Option<f64>,
    pub latitude: f64,
    pub longitude: f64,
    pub depth: f64,
    pub time: String,
    pub place: String,
    pub updated: String,
    pub url: String,
    pub detail_url: String,
}
