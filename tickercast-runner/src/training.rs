//! Out-of-band model training and artifact persistence.
//!
//! Training fits a min-max scaler on the full history, then an AR model on
//! the scaled features. Both land in one `ModelArtifact` that records the
//! fingerprint of the training bars. Installing an artifact into a
//! `ForecastContext` is an atomic swap; forecasts already running keep the
//! predictor they started with.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use tickercast_core::forecast::{feature_matrix, ForecastContext, MinMaxScaler, PriceFeature};
use tickercast_core::predictor::{AutoregressivePredictor, PredictorError};
use tickercast_core::{EngineError, PriceSeries};

/// Artifact layout version. Bumped on incompatible changes.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact I/O at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("artifact JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported artifact schema {found} (this build reads {expected})")]
    UnsupportedSchema { found: u32, expected: u32 },

    #[error("artifact does not match engine: {0}")]
    Mismatch(String),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Predictor(#[from] PredictorError),
}

fn default_schema() -> u32 {
    SCHEMA_VERSION
}

/// Trained scaler and step model for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    #[serde(default = "default_schema")]
    pub schema_version: u32,
    pub symbol: String,
    pub version: String,
    /// Fingerprint of the bars the model was trained on.
    pub trained_on: String,
    pub window: usize,
    pub features: Vec<PriceFeature>,
    pub scaler: MinMaxScaler,
    pub model: AutoregressivePredictor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingParams {
    pub order: usize,
    pub window: usize,
    pub features: Vec<PriceFeature>,
    /// Explicit model version; derived from order and data when absent.
    pub version: Option<String>,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            order: 5,
            window: 60,
            features: tickercast_core::forecast::default_features(),
            version: None,
        }
    }
}

/// Fit scaler and AR model on the whole of `series`.
pub fn train_autoregressive(
    series: &PriceSeries,
    params: &TrainingParams,
) -> Result<ModelArtifact, ArtifactError> {
    if params.order == 0 || params.order >= params.window {
        return Err(EngineError::InvalidParameter {
            name: "training.order",
            reason: format!("must be in [1, window), got {} with window {}", params.order, params.window),
        }
        .into());
    }
    let required = params.window.max(params.order + 2);
    if series.len() < required {
        return Err(EngineError::InsufficientData {
            required,
            actual: series.len(),
        }
        .into());
    }

    let raw = feature_matrix(series.bars(), &params.features);
    let scaler = MinMaxScaler::fit(raw.view())?;
    let scaled = scaler.transform(raw.view())?;

    let trained_on = series.fingerprint();
    let version = params
        .version
        .clone()
        .unwrap_or_else(|| format!("ar{}-{}", params.order, &trained_on[..12]));
    let model = AutoregressivePredictor::fit(scaled.view(), params.order, version.clone())?;

    info!(
        symbol = series.symbol(),
        bars = series.len(),
        order = params.order,
        %version,
        "trained autoregressive model"
    );

    Ok(ModelArtifact {
        schema_version: SCHEMA_VERSION,
        symbol: series.symbol().to_string(),
        version,
        trained_on,
        window: params.window,
        features: params.features.clone(),
        scaler,
        model,
    })
}

impl ModelArtifact {
    pub fn save(&self, path: &Path) -> Result<(), ArtifactError> {
        let json = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ArtifactError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, json).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let json = fs::read_to_string(path).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self, ArtifactError> {
        let artifact: ModelArtifact = serde_json::from_str(json)?;
        if artifact.schema_version != SCHEMA_VERSION {
            return Err(ArtifactError::UnsupportedSchema {
                found: artifact.schema_version,
                expected: SCHEMA_VERSION,
            });
        }
        if artifact.scaler.features() != artifact.features.len()
            || artifact.model.features() != artifact.features.len()
        {
            return Err(ArtifactError::Mismatch(format!(
                "{} features but scaler has {} and model has {}",
                artifact.features.len(),
                artifact.scaler.features(),
                artifact.model.features()
            )));
        }
        Ok(artifact)
    }

    /// True when `series` is exactly the history this model was trained on.
    pub fn trained_on_series(&self, series: &PriceSeries) -> bool {
        self.trained_on == series.fingerprint()
    }

    /// Check the artifact against the forecaster's window and features.
    pub fn check_compatible(&self, window: usize, features: &[PriceFeature]) -> Result<(), ArtifactError> {
        if self.features != features {
            return Err(ArtifactError::Mismatch(format!(
                "trained on features {:?}, engine tracks {:?}",
                self.features, features
            )));
        }
        if window <= self.model.order() {
            return Err(ArtifactError::Mismatch(format!(
                "engine window {window} is too short for AR order {}",
                self.model.order()
            )));
        }
        Ok(())
    }

    /// Swap this artifact's model and scaler into `ctx`.
    pub fn install(self, ctx: &ForecastContext) {
        ctx.install_scaler(self.symbol.clone(), self.scaler);
        ctx.install_predictor(Some(Arc::new(self.model)));
    }
}
