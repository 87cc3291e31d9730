//! Tickercast Core — price series, indicators, volatility, forecasting, scoring.
//!
//! This crate contains the pure analysis engine:
//! - Domain types (bars, validated price series)
//! - RSI and MACD indicators with NaN warmup
//! - Annualized historical volatility
//! - Autoregressive multi-step forecasting behind a pluggable step predictor
//! - Additive recommendation scoring (Buy / Sell / Hold)
//! - Collaborator traits for price history and news sentiment
//!
//! No I/O happens here; the runner crate supplies files, caches and models.

pub mod data;
pub mod domain;
pub mod engine;
pub mod error;
pub mod forecast;
pub mod indicators;
pub mod predictor;
pub mod rng;
pub mod scoring;
pub mod sentiment;
pub mod volatility;

pub use domain::{PriceBar, PriceSeries, SeriesError};
pub use engine::{Analysis, Engine, EngineParams};
pub use error::EngineError;
pub use forecast::{ForecastConfig, ForecastContext, ForecastMode, ForecastPoint, ForecastResult};
pub use scoring::{Recommendation, RecommendationDecision, ScoringThresholds};
pub use sentiment::Sentiment;
