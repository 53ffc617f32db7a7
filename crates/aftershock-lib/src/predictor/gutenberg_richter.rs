//! Exceedance probabilities from the Gutenberg-Richter law
//!
//! `N(m) = 10^(a - b*m)` is the expected number of aftershocks of magnitude
//! `m` or larger. Treating them as a Poisson process, the probability of at
//! least one such event is `1 - exp(-N)`.

use crate::models::GrParams;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// Tolerance used when looking up a threshold by magnitude
const MAGNITUDE_EPSILON: f64 = 1e-9;

/// Probability figures for a single magnitude threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThresholdProbability {
    pub magnitude: f64,
    pub expected_count: f64,
    pub probability: f64,
    pub percentage: f64,
}

/// Probabilities ordered by ascending threshold, serialized as an `M<m>` map
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MagnitudeProbabilities(Vec<ThresholdProbability>);

impl MagnitudeProbabilities {
    pub fn get(&self, magnitude: f64) -> Option<&ThresholdProbability> {
        self.0
            .iter()
            .find(|t| (t.magnitude - magnitude).abs() < MAGNITUDE_EPSILON)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ThresholdProbability> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<ThresholdProbability> for MagnitudeProbabilities {
    fn from_iter<I: IntoIterator<Item = ThresholdProbability>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Serialize for MagnitudeProbabilities {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for entry in &self.0 {
            map.serialize_entry(&threshold_key(entry.magnitude), entry)?;
        }
        map.end()
    }
}

/// Map key for a threshold: `M3.0`, `M4.5`, `M4.25`
pub fn threshold_key(magnitude: f64) -> String {
    format!("M{:?}", magnitude)
}

/// Expected count of aftershocks at or above `magnitude`
pub fn expected_count(gr: &GrParams, magnitude: f64) -> f64 {
    10f64.powf(gr.a_value - gr.b_value * magnitude)
}

/// Probability of at least one event given a Poisson mean
pub fn poisson_exceedance(mean: f64) -> f64 {
    1.0 - (-mean).exp()
}

/// Probabilities for every threshold strictly below the mainshock magnitude
pub fn magnitude_probabilities(
    gr: &GrParams,
    mainshock_magnitude: f64,
    thresholds: &[f64],
) -> MagnitudeProbabilities {
    let mut magnitudes: Vec<f64> = thresholds
        .iter()
        .copied()
        .filter(|m| m.is_finite() && *m < mainshock_magnitude)
        .collect();
    magnitudes.sort_by(|a, b| a.total_cmp(b));
    magnitudes.dedup();

    magnitudes
        .into_iter()
        .map(|magnitude| {
            let count = expected_count(gr, magnitude);
            let probability = poisson_exceedance(count);
            ThresholdProbability {
                magnitude,
                expected_count: count,
                probability,
                percentage: probability * 100.0,
            }
        })
        .collect()
}
