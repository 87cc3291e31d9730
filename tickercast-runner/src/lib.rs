//! Tickercast Runner — configuration, data sources, caching, training, batch analysis.
//!
//! This crate builds on `tickercast-core` to provide:
//! - TOML engine configuration with predictor selection
//! - CSV price history (`DataFetcher`) and headline sentiment (`SentimentProvider`)
//! - Forecast memoization per (ticker, as-of date, horizon)
//! - Out-of-band AR model training with JSON artifacts
//! - Parallel multi-ticker analysis

pub mod analyze;
pub mod cache;
pub mod config;
pub mod data_loader;
pub mod sentiment;
pub mod training;

pub use analyze::{AnalyzeError, Analyzer, IndicatorSnapshot, TickerReport};
pub use cache::{CacheError, CacheKey, ForecastCache};
pub use config::{ConfigError, EngineConfig, PredictorConfig, PredictorKind};
pub use data_loader::{load_csv, CsvHistory, LoadError};
pub use sentiment::{Headline, HeadlineSentiment, LexiconScorer};
pub use training::{train_autoregressive, ArtifactError, ModelArtifact, TrainingParams, SCHEMA_VERSION};
