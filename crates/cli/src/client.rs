//! API client for communicating with the aftershock API

use aftershock_lib::{Bounds, ComponentHealth, Coordinate, EarthquakeEvent, RegionalModel};
use anyhow::{Context, Result};
use reqwest::{Client, Response};
use serde::{
    de::{DeserializeOwned, MapAccess, Visitor},
    ser::SerializeMap,
    Deserialize, Deserializer, Serialize, Serializer,
};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use url::Url;

/// API client for the aftershock API
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        Self::decode(response).await
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;

        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            match serde_json::from_str::<ErrorResponse>(&body) {
                Ok(err) => anyhow::bail!("API error ({}): {}: {}", status, err.error, err.message),
                Err(_) => anyhow::bail!("API error ({}): {}", status, body),
            }
        }

        response.json().await.context("Failed to parse response")
    }
}

// API response types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    pub success: bool,
    pub predictions: PredictionView,
    pub generated_at: String,
}

/// Client-side view of a prediction, shared by local and remote runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionView {
    pub mainshock: MainshockView,
    pub model_info: ModelInfoView,
    pub forecasts: OrderedMap<HorizonView>,
    pub magnitude_probabilities: OrderedMap<ThresholdView>,
    pub risk_assessment: RiskView,
}

impl PredictionView {
    /// Horizons in ascending day order
    pub fn sorted_forecasts(&self) -> Vec<&HorizonView> {
        let mut forecasts: Vec<_> = self.forecasts.values().collect();
        forecasts.sort_by_key(|f| f.days);
        forecasts
    }

    /// Thresholds in ascending magnitude order
    pub fn sorted_probabilities(&self) -> Vec<&ThresholdView> {
        let mut probabilities: Vec<_> = self.magnitude_probabilities.values().collect();
        probabilities.sort_by(|a, b| a.magnitude.total_cmp(&b.magnitude));
        probabilities
    }
}

/// JSON object that keeps its keys in document order
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedMap<V>(Vec<(String, V)>);

impl<V> OrderedMap<V> {
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.0.iter().map(|(_, v)| v)
    }

    #[cfg(test)]
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedVisitor<V> {
            type Value = OrderedMap<V>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some(entry) = access.next_entry()? {
                    entries.push(entry);
                }
                Ok(OrderedMap(entries))
            }
        }

        deserializer.deserialize_map(OrderedVisitor(PhantomData))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MainshockView {
    pub magnitude: f64,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tectonic_setting: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfoView {
    pub region_id: String,
    pub source: String,
    pub quality: String,
    pub tectonic_setting: String,
    pub training_sequences: u64,
    pub training_aftershocks: u64,
    pub omori_r_squared: f64,
    pub gr_r_squared: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HorizonView {
    pub days: u32,
    pub rate_per_day: f64,
    pub expected_aftershocks: f64,
    pub cumulative_expected: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdView {
    pub magnitude: f64,
    pub expected_count: f64,
    pub probability: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskView {
    pub level: String,
    pub score: u32,
    pub color: String,
    pub description: String,
    pub factors: Vec<String>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarthquakeList {
    pub count: usize,
    pub earthquakes: Vec<EarthquakeEvent>,
    pub fetched_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageResponse {
    pub total_models: usize,
    pub has_global_fallback: bool,
    pub coverage: Vec<RegionView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionView {
    pub region_id: String,
    pub center: Coordinate,
    pub bounds: Bounds,
    pub quality: String,
    pub sequences: u64,
    pub aftershocks: u64,
    pub tectonic_setting: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelResponse {
    pub model: RegionalModel,
    pub retrieved_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthView {
    pub status: String,
    pub models_loaded: usize,
    pub has_global_model: bool,
    pub components: HashMap<String, ComponentHealth>,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
