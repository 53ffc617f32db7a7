//! Error types for model loading and prediction

use std::path::PathBuf;

/// Errors surfaced to callers of the forecaster
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ForecastError {
    /// No regional bounds contain the point and no fallback model is loaded
    #[error("No model available for location ({latitude}, {longitude})")]
    NoModelAvailable { latitude: f64, longitude: f64 },

    /// The requested region id is not in the repository
    #[error("Model not found: {0}")]
    NotFound(String),

    /// Request values outside the accepted ranges
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ForecastError {
    /// Stable category string for structured error responses
    pub fn category(&self) -> &'static str {
        match self {
            ForecastError::NoModelAvailable { .. } => "no_model_available",
            ForecastError::NotFound(_) => "not_found",
            ForecastError::InvalidInput(_) => "invalid_input",
        }
    }
}

/// A single model file that could not be loaded. Handled inside the
/// repository by skipping the file.
#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid model {region_id:?}: {reason}")]
    Invalid { region_id: String, reason: String },
}
