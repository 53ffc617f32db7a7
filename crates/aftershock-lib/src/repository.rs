//! In-memory model repository
//!
//! Regional models and the optional global fallback are loaded once from a
//! directory of JSON files and never change afterwards. A file that cannot
//! be read, parsed or validated is skipped with a warning.

use crate::error::ModelLoadError;
use crate::models::{Bounds, FallbackModel, ModelParameters, RegionalModel};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File name prefix for regional model files
pub const REGIONAL_PREFIX: &str = "region_";

/// File name of the global fallback model
pub const FALLBACK_FILE: &str = "global_fallback.json";

/// Read-only collection of trained models keyed by region id
#[derive(Debug, Clone, Default)]
pub struct ModelRepository {
    regional: BTreeMap<String, RegionalModel>,
    fallback: Option<FallbackModel>,
}

impl ModelRepository {
    /// Load all `region_*.json` files and `global_fallback.json` from `dir`
    pub fn load(dir: &Path) -> Self {
        info!(models_dir = %dir.display(), "Loading models");

        let mut repository = Self::default();

        let files = match regional_files(dir) {
            Ok(files) => files,
            Err(e) => {
                warn!(models_dir = %dir.display(), error = %e, "Could not list models directory");
                Vec::new()
            }
        };
        debug!(count = files.len(), "Found regional model files");

        for path in files {
            match read_model::<RegionalModel>(&path).and_then(validate_regional) {
                Ok(model) => repository.insert_regional(model),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping model file"),
            }
        }

        let fallback_path = dir.join(FALLBACK_FILE);
        if fallback_path.exists() {
            match read_model::<FallbackModel>(&fallback_path).and_then(validate_fallback) {
                Ok(model) => {
                    info!(region_id = %model.params.region_id, "Global fallback model loaded");
                    repository.fallback = Some(model);
                }
                Err(e) => warn!(error = %e, "Global fallback model not loaded"),
            }
        }

        info!(
            regional_models = repository.regional.len(),
            has_fallback = repository.fallback.is_some(),
            "Models loaded"
        );
        repository
    }

    /// Build a repository from already-parsed models, applying the same
    /// validation as [`ModelRepository::load`]
    pub fn from_models(
        regional: impl IntoIterator<Item = RegionalModel>,
        fallback: Option<FallbackModel>,
    ) -> Self {
        let mut repository = Self::default();
        for model in regional {
            match validate_regional(model) {
                Ok(model) => repository.insert_regional(model),
                Err(e) => warn!(error = %e, "Skipping model"),
            }
        }
        repository.fallback = fallback.and_then(|m| match validate_fallback(m) {
            Ok(m) => Some(m),
            Err(e) => {
                warn!(error = %e, "Global fallback model not loaded");
                None
            }
        });
        repository
    }

    fn insert_regional(&mut self, model: RegionalModel) {
        let id = model.region_id().to_string();
        if self.regional.contains_key(&id) {
            warn!(region_id = %id, "Duplicate region id, keeping first model");
            return;
        }
        self.regional.insert(id, model);
    }

    pub fn lookup_by_region_id(&self, region_id: &str) -> Option<&RegionalModel> {
        self.regional.get(region_id)
    }

    /// Regional models ordered by region id
    pub fn all_regional_models(&self) -> impl Iterator<Item = &RegionalModel> {
        self.regional.values()
    }

    pub fn fallback(&self) -> Option<&FallbackModel> {
        self.fallback.as_ref()
    }

    pub fn regional_count(&self) -> usize {
        self.regional.len()
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}

fn regional_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with(REGIONAL_PREFIX) && n.ends_with(".json"))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    Ok(files)
}

fn read_model<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ModelLoadError> {
    let content = fs::read_to_string(path).map_err(|source| ModelLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ModelLoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn validate_regional(model: RegionalModel) -> Result<RegionalModel, ModelLoadError> {
    validate_params(&model.params)?;
    validate_bounds(&model.params.region_id, &model.bounds)?;
    Ok(model)
}

fn validate_fallback(model: FallbackModel) -> Result<FallbackModel, ModelLoadError> {
    validate_params(&model.params)?;
    Ok(model)
}

fn invalid(region_id: &str, reason: impl Into<String>) -> ModelLoadError {
    ModelLoadError::Invalid {
        region_id: region_id.to_string(),
        reason: reason.into(),
    }
}

fn validate_params(params: &ModelParameters) -> Result<(), ModelLoadError> {
    let id = params.region_id.as_str();
    if id.trim().is_empty() {
        return Err(invalid(id, "empty region_id"));
    }

    let omori = &params.omori;
    for (name, value) in [("K", omori.k), ("c", omori.c), ("p", omori.p)] {
        if !value.is_finite() || value <= 0.0 {
            return Err(invalid(id, format!("Omori {} must be positive, got {}", name, value)));
        }
    }

    if !params.gr.a_value.is_finite() || !params.gr.b_value.is_finite() {
        return Err(invalid(id, "Gutenberg-Richter parameters must be finite"));
    }

    Ok(())
}

fn validate_bounds(id: &str, bounds: &Bounds) -> Result<(), ModelLoadError> {
    let [lat_min, lat_max] = bounds.lat;
    let [lon_min, lon_max] = bounds.lon;

    if !(lat_min <= lat_max) || !(lon_min <= lon_max) {
        return Err(invalid(id, format!("unordered bounds {:?}", bounds)));
    }
    if lat_min < -90.0 || lat_max > 90.0 || lon_min < -180.0 || lon_max > 180.0 {
        return Err(invalid(id, format!("bounds out of range {:?}", bounds)));
    }
    Ok(())
}
