//! Service configuration

use aftershock_lib::feed::{DEFAULT_MAX_RESULTS, DEFAULT_USGS_URL};
use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable prefix, e.g. `AFTERSHOCK_MODELS_DIR`
pub const ENV_PREFIX: &str = "AFTERSHOCK";

/// Service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Directory holding `region_*.json` and `global_fallback.json`
    #[serde(default = "default_models_dir")]
    pub models_dir: PathBuf,

    /// USGS event query endpoint
    #[serde(default = "default_usgs_api_url")]
    pub usgs_api_url: String,

    /// How long earthquake listings are cached, in seconds
    #[serde(default = "default_cache_duration")]
    pub cache_duration_secs: u64,

    /// Maximum events requested from USGS per listing
    #[serde(default = "default_max_results")]
    pub max_results: u32,

    /// HTTP listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// `*` or a comma-separated list of allowed CORS origins
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: String,
}

fn default_models_dir() -> PathBuf {
    PathBuf::from("../models/regional_models")
}

fn default_usgs_api_url() -> String {
    DEFAULT_USGS_URL.to_string()
}

fn default_cache_duration() -> u64 {
    300
}

fn default_max_results() -> u32 {
    DEFAULT_MAX_RESULTS
}

fn default_port() -> u16 {
    8000
}

fn default_allowed_origins() -> String {
    "*".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            models_dir: default_models_dir(),
            usgs_api_url: default_usgs_api_url(),
            cache_duration_secs: default_cache_duration(),
            max_results: default_max_results(),
            port: default_port(),
            allowed_origins: default_allowed_origins(),
        }
    }
}

impl ApiConfig {
    /// Load configuration from `AFTERSHOCK_*` environment variables
    pub fn load() -> Result<Self> {
        Self::from_source(config::Environment::with_prefix(ENV_PREFIX))
    }

    fn from_source(env: config::Environment) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(env.try_parsing(true))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    pub fn cache_duration(&self) -> Duration {
        Duration::from_secs(self.cache_duration_secs)
    }

    /// Allowed origins; empty means any origin
    pub fn origins(&self) -> Vec<String> {
        if self.allowed_origins.trim() == "*" {
            return Vec::new();
        }
        self.allowed_origins
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect()
    }
}
