//! Statistical aftershock engines

pub mod gutenberg_richter;
pub mod omori;
pub mod risk;

pub use gutenberg_richter::{
    magnitude_probabilities, threshold_key, MagnitudeProbabilities, ThresholdProbability,
};
pub use omori::{cumulative_at, forecast, rate_at, Forecasts, HorizonForecast};
pub use risk::{assess, LevelProfile, RiskAssessment, RiskLevel};
