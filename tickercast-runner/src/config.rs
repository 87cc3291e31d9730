//! TOML engine configuration.
//!
//! ```toml
//! [forecast]
//! window = 60
//! horizon = 5
//!
//! [scoring]
//! buy_cutoff = 1.5
//!
//! [predictor]
//! kind = "autoregressive"
//! artifact = "models/ACME.json"
//! ```
//!
//! Every field has a default, so an empty file is a valid configuration.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use tickercast_core::forecast::ForecastContext;
use tickercast_core::indicators::IndicatorParams;
use tickercast_core::predictor::{LinearTrendPredictor, RandomWalkPredictor, StepPredictor};
use tickercast_core::scoring::ScoringThresholds;
use tickercast_core::volatility::VolatilityParams;
use tickercast_core::{Engine, EngineError, EngineParams, ForecastConfig};

use crate::training::{ArtifactError, ModelArtifact, TrainingParams};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(#[from] EngineError),

    #[error("invalid predictor config: {0}")]
    Predictor(String),

    #[error("model artifact: {0}")]
    Artifact(#[from] ArtifactError),

    #[error("failed to fingerprint config: {0}")]
    Fingerprint(#[from] serde_json::Error),
}

/// Which step predictor the engine is built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictorKind {
    /// No model; every forecast uses naive extrapolation.
    #[default]
    None,
    LinearTrend,
    /// Trained AR model loaded from `artifact`.
    Autoregressive,
    RandomWalk,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictorConfig {
    pub kind: PredictorKind,
    /// Model artifact for `autoregressive`.
    pub artifact: Option<PathBuf>,
    /// Trailing rows fitted by `linear_trend`; whole window when absent.
    pub span: Option<usize>,
    pub seed: u64,
    /// Scaled step bound for `random_walk`.
    pub max_step: f64,
    /// AR order used by the training command.
    pub ar_order: usize,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            kind: PredictorKind::None,
            artifact: None,
            span: None,
            seed: 42,
            max_step: 0.02,
            ar_order: 5,
        }
    }
}

impl PredictorConfig {
    pub fn validate(&self, forecast: &ForecastConfig) -> Result<(), ConfigError> {
        if self.ar_order == 0 || self.ar_order >= forecast.window {
            return Err(ConfigError::Predictor(format!(
                "ar_order must be in [1, {}), got {}",
                forecast.window, self.ar_order
            )));
        }
        if self.span == Some(0) {
            return Err(ConfigError::Predictor("span must be >= 1".into()));
        }
        if !self.max_step.is_finite() || self.max_step < 0.0 {
            return Err(ConfigError::Predictor(format!(
                "max_step must be finite and >= 0, got {}",
                self.max_step
            )));
        }
        if self.kind == PredictorKind::Autoregressive && self.artifact.is_none() {
            return Err(ConfigError::Predictor(
                "kind = \"autoregressive\" requires an artifact path".into(),
            ));
        }
        Ok(())
    }

    /// Build the configured predictor and install it (plus any trained
    /// scaler) into `ctx`.
    pub fn install(&self, ctx: &ForecastContext, forecast: &ForecastConfig) -> Result<(), ConfigError> {
        let predictor: Arc<dyn StepPredictor> = match self.kind {
            PredictorKind::None => {
                ctx.install_predictor(None);
                return Ok(());
            }
            PredictorKind::LinearTrend => match self.span {
                Some(span) => Arc::new(LinearTrendPredictor::with_span(span)),
                None => Arc::new(LinearTrendPredictor::new()),
            },
            PredictorKind::RandomWalk => Arc::new(RandomWalkPredictor::new(self.seed, self.max_step)),
            PredictorKind::Autoregressive => {
                let path = self.artifact.as_deref().ok_or_else(|| {
                    ConfigError::Predictor("autoregressive predictor needs an artifact".into())
                })?;
                let artifact = ModelArtifact::load(path)?;
                artifact.check_compatible(forecast.window, &forecast.features)?;
                artifact.install(ctx);
                return Ok(());
            }
        };
        ctx.install_predictor(Some(predictor));
        Ok(())
    }
}

/// Full engine configuration: the core parameter sections plus the
/// predictor selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub indicators: IndicatorParams,
    pub volatility: VolatilityParams,
    pub forecast: ForecastConfig,
    pub scoring: ScoringThresholds,
    pub predictor: PredictorConfig,
}

impl EngineConfig {
    /// Load and validate a config file. Relative artifact paths resolve
    /// against the file's directory.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&content)?;
        if let (Some(artifact), Some(base)) = (&config.predictor.artifact, path.parent()) {
            if artifact.is_relative() {
                config.predictor.artifact = Some(base.join(artifact));
            }
        }
        Ok(config)
    }

    /// Parse and validate a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine_params().validate()?;
        self.predictor.validate(&self.forecast)
    }

    pub fn engine_params(&self) -> EngineParams {
        EngineParams {
            indicators: self.indicators,
            volatility: self.volatility,
            forecast: self.forecast.clone(),
            scoring: self.scoring,
        }
    }

    pub fn training_params(&self) -> TrainingParams {
        TrainingParams {
            order: self.predictor.ar_order,
            window: self.forecast.window,
            features: self.forecast.features.clone(),
            version: None,
        }
    }

    /// Engine with the configured predictor installed in a fresh context.
    pub fn build_engine(&self) -> Result<Engine, ConfigError> {
        let ctx = ForecastContext::new();
        self.predictor.install(&ctx, &self.forecast)?;
        Ok(Engine::with_context(self.engine_params(), Arc::new(ctx))?)
    }

    /// BLAKE3 digest of the configuration, for namespacing cached results.
    pub fn fingerprint(&self) -> Result<String, ConfigError> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tickercast_core::forecast::PriceFeature;
    use tickercast_core::scoring::ReferencePoint;

    #[test]
    fn empty_toml_is_default() {
        let config = EngineConfig::from_toml("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.forecast.window, 60);
        assert_eq!(config.predictor.kind, PredictorKind::None);
    }

    #[test]
    fn sections_override_defaults() {
        let config = EngineConfig::from_toml(
            r#"
            [indicators]
            rsi_period = 10

            [forecast]
            window = 30
            horizon = 10
            features = ["close"]

            [scoring]
            buy_cutoff = 2.0
            reference = "next_step"

            [predictor]
            kind = "linear_trend"
            span = 20
            "#,
        )
        .unwrap();
        assert_eq!(config.indicators.rsi_period, 10);
        assert_eq!(config.indicators.macd_slow, 26);
        assert_eq!(config.forecast.window, 30);
        assert_eq!(config.forecast.features, vec![PriceFeature::Close]);
        assert_eq!(config.scoring.buy_cutoff, 2.0);
        assert_eq!(config.scoring.reference, ReferencePoint::NextStep);
        assert_eq!(config.predictor.kind, PredictorKind::LinearTrend);
        assert_eq!(config.predictor.span, Some(20));
    }

    #[test]
    fn invalid_engine_section_is_rejected() {
        let err = EngineConfig::from_toml("[forecast]\nwindow = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn autoregressive_requires_artifact() {
        let err = EngineConfig::from_toml("[predictor]\nkind = \"autoregressive\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Predictor(_)));
    }

    #[test]
    fn unknown_predictor_kind_fails_to_parse() {
        let err = EngineConfig::from_toml("[predictor]\nkind = \"lstm\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn build_engine_installs_predictor() {
        let config = EngineConfig::from_toml("[predictor]\nkind = \"random_walk\"\nseed = 7\n").unwrap();
        let engine = config.build_engine().unwrap();
        let predictor = engine.context().predictor().unwrap();
        assert_eq!(predictor.name(), "random_walk");

        let none = EngineConfig::default().build_engine().unwrap();
        assert!(none.context().predictor().is_none());
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = EngineConfig::from_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn relative_artifact_resolves_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.toml");
        std::fs::write(&path, "[predictor]\nkind = \"autoregressive\"\nartifact = \"m.json\"\n").unwrap();
        let config = EngineConfig::from_file(&path).unwrap();
        assert_eq!(config.predictor.artifact, Some(dir.path().join("m.json")));
    }

    #[test]
    fn fingerprint_tracks_content() {
        let a = EngineConfig::default();
        let mut b = EngineConfig::default();
        assert_eq!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
        b.forecast.horizon = 6;
        assert_ne!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
    }
}
