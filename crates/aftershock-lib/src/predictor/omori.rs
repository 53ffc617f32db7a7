//! Temporal decay forecasts from the modified Omori law
//!
//! The aftershock rate `t` days after the mainshock is `K / (t + c)^p`.
//! The expected count up to day `d` is the integral of that rate from 0,
//! which needs its logarithmic limit form when `p == 1`.

use crate::models::OmoriParams;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// Forecast figures for a single horizon
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HorizonForecast {
    pub days: u32,
    pub rate_per_day: f64,
    /// Same value as `rate_per_day`; older clients read this field
    pub expected_aftershocks: f64,
    pub cumulative_expected: f64,
}

/// Forecasts ordered by ascending horizon, serialized as a `day_<d>` map
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Forecasts(Vec<HorizonForecast>);

impl Forecasts {
    pub fn get(&self, days: u32) -> Option<&HorizonForecast> {
        self.0.iter().find(|f| f.days == days)
    }

    pub fn iter(&self) -> impl Iterator<Item = &HorizonForecast> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Forecasts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for forecast in &self.0 {
            map.serialize_entry(&format!("day_{}", forecast.days), forecast)?;
        }
        map.end()
    }
}

/// Instantaneous aftershock rate (events per day) at `days`
pub fn rate_at(omori: &OmoriParams, days: f64) -> f64 {
    omori.k / (days + omori.c).powf(omori.p)
}

/// Expected number of aftershocks between the mainshock and `days`
pub fn cumulative_at(omori: &OmoriParams, days: f64) -> f64 {
    let OmoriParams { k, c, p } = *omori;
    if p == 1.0 {
        k * ((days + c) / c).ln()
    } else {
        let q = 1.0 - p;
        k * ((days + c).powf(q) - c.powf(q)) / q
    }
}

/// Forecast every horizon. Zero horizons are dropped; the rest are
/// deduplicated and returned in ascending order.
pub fn forecast(omori: &OmoriParams, horizons: &[u32]) -> Forecasts {
    let mut days: Vec<u32> = horizons.iter().copied().filter(|d| *d > 0).collect();
    days.sort_unstable();
    days.dedup();

    Forecasts(
        days.into_iter()
            .map(|d| {
                let rate = rate_at(omori, d as f64);
                HorizonForecast {
                    days: d,
                    rate_per_day: rate,
                    expected_aftershocks: rate,
                    cumulative_expected: cumulative_at(omori, d as f64),
                }
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_log_branch_at_p_equal_one() {
        let omori = OmoriParams { k: 10.0, c: 0.5, p: 1.0 };
        let cumulative = cumulative_at(&omori, 7.0);
        assert!((cumulative - 10.0 * 15.0_f64.ln()).abs() < EPS);
        assert!((cumulative - 27.08).abs() < 0.01);
    }

    #[test]
    fn test_power_branch_matches_closed_form() {
        let omori = OmoriParams { k: 5.0, c: 0.1, p: 0.9 };
        let expected = 5.0 * (7.1_f64.powf(0.1) - 0.1_f64.powf(0.1)) / 0.1;
        assert!((cumulative_at(&omori, 7.0) - expected).abs() < EPS);
    }

    #[test]
    fn test_power_branch_approaches_log_branch() {
        let near = OmoriParams { k: 10.0, c: 0.5, p: 1.0 + 1e-7 };
        let exact = OmoriParams { k: 10.0, c: 0.5, p: 1.0 };
        assert!((cumulative_at(&near, 30.0) - cumulative_at(&exact, 30.0)).abs() < 1e-4);
    }

    #[test]
    fn test_rate_strictly_decreasing() {
        for p in [0.6, 1.0, 1.4] {
            let omori = OmoriParams { k: 20.0, c: 0.05, p };
            let result = forecast(&omori, &[1, 2, 7, 30, 365]);
            let rates: Vec<f64> = result.iter().map(|f| f.rate_per_day).collect();
            assert!(rates.windows(2).all(|w| w[0] > w[1]), "p={p}: {rates:?}");
        }
    }

    #[test]
    fn test_cumulative_non_decreasing() {
        for p in [0.7, 1.0, 1.3] {
            let omori = OmoriParams { k: 20.0, c: 0.05, p };
            let result = forecast(&omori, &[1, 7, 30, 365]);
            let totals: Vec<f64> = result.iter().map(|f| f.cumulative_expected).collect();
            assert!(totals.windows(2).all(|w| w[0] <= w[1]), "p={p}: {totals:?}");
            assert!(totals[0] > 0.0);
        }
    }

    #[test]
    fn test_horizons_sorted_and_deduplicated() {
        let omori = OmoriParams { k: 1.0, c: 0.1, p: 1.1 };
        let result = forecast(&omori, &[30, 1, 0, 7, 30]);
        let days: Vec<u32> = result.iter().map(|f| f.days).collect();
        assert_eq!(days, vec![1, 7, 30]);
        assert!(result.get(0).is_none());
    }

    #[test]
    fn test_serializes_as_day_keyed_map() {
        let omori = OmoriParams { k: 5.0, c: 0.1, p: 0.9 };
        let json = serde_json::to_value(forecast(&omori, &[1, 7])).unwrap();

        let day1 = &json["day_1"];
        assert_eq!(day1["days"], 1);
        assert_eq!(day1["rate_per_day"], day1["expected_aftershocks"]);
        assert!(json["day_7"].is_object());
    }
}
