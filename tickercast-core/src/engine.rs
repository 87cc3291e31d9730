//! Engine facade: the four public operations over one price series.
//!
//! ```text
//! prices ─┬─ IndicatorCalculator ─► RSI, MACD ─────┐
//!         ├─ VolatilityEstimator ─► volatility ────┤
//!         └─ SequenceForecaster ──► forecast ──────┼─► RecommendationScorer ─► decision
//!                                      sentiment ──┘
//! ```

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::PriceSeries;
use crate::error::EngineError;
use crate::forecast::{ForecastConfig, ForecastContext, ForecastResult, SequenceForecaster};
use crate::indicators::{IndicatorCalculator, IndicatorParams, IndicatorSet};
use crate::scoring::{RecommendationDecision, RecommendationScorer, ScoringThresholds, Signals};
use crate::sentiment::Sentiment;
use crate::volatility::{VolatilityEstimator, VolatilityParams};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineParams {
    pub indicators: IndicatorParams,
    pub volatility: VolatilityParams,
    pub forecast: ForecastConfig,
    pub scoring: ScoringThresholds,
}

impl EngineParams {
    pub fn validate(&self) -> Result<(), EngineError> {
        self.indicators.validate()?;
        self.volatility.validate()?;
        self.forecast.validate()?;
        self.scoring.validate()
    }
}

/// Everything computed for one recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub symbol: String,
    pub as_of: NaiveDate,
    pub current_price: f64,
    pub volatility: f64,
    /// Latest RSI, neutral-defaulted.
    pub rsi: f64,
    /// Latest MACD histogram, neutral-defaulted.
    pub macd_hist: f64,
    pub sentiment: Sentiment,
    pub forecast: ForecastResult,
    pub decision: RecommendationDecision,
}

#[derive(Debug)]
pub struct Engine {
    params: EngineParams,
    calculator: IndicatorCalculator,
    estimator: VolatilityEstimator,
    forecaster: SequenceForecaster,
    scorer: RecommendationScorer,
    context: Arc<ForecastContext>,
}

impl Engine {
    pub fn new(params: EngineParams) -> Result<Self, EngineError> {
        Self::with_context(params, Arc::new(ForecastContext::new()))
    }

    /// Share a forecast context (predictor and fitted scalers) between
    /// engines.
    pub fn with_context(params: EngineParams, context: Arc<ForecastContext>) -> Result<Self, EngineError> {
        params.validate()?;
        Ok(Self {
            calculator: IndicatorCalculator::new(params.indicators),
            estimator: VolatilityEstimator::new(params.volatility),
            forecaster: SequenceForecaster::new(params.forecast.clone()),
            scorer: RecommendationScorer::new(params.scoring),
            params,
            context,
        })
    }

    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    pub fn context(&self) -> &Arc<ForecastContext> {
        &self.context
    }

    pub fn default_horizon(&self) -> usize {
        self.params.forecast.horizon
    }

    pub fn compute_indicators(&self, prices: &PriceSeries) -> IndicatorSet {
        self.calculator.compute(prices)
    }

    pub fn estimate_volatility(&self, prices: &PriceSeries) -> f64 {
        self.estimator.estimate(prices)
    }

    pub fn forecast(&self, prices: &PriceSeries, horizon: usize) -> Result<ForecastResult, EngineError> {
        self.forecaster.forecast(prices, horizon, &self.context)
    }

    /// Forecast over the default horizon and score it.
    ///
    /// `sentiment` is a provider label; unknown labels count as neutral.
    pub fn recommend(&self, prices: &PriceSeries, sentiment: &str) -> Result<RecommendationDecision, EngineError> {
        self.analyze(prices, self.default_horizon(), Sentiment::from_label(sentiment))
            .map(|analysis| analysis.decision)
    }

    /// Forecast and score, keeping every intermediate value.
    pub fn analyze(
        &self,
        prices: &PriceSeries,
        horizon: usize,
        sentiment: Sentiment,
    ) -> Result<Analysis, EngineError> {
        let forecast = self.forecast(prices, horizon)?;
        self.assess(prices, forecast, sentiment)
    }

    /// Score an already computed forecast (e.g. one served from a cache).
    pub fn assess(
        &self,
        prices: &PriceSeries,
        forecast: ForecastResult,
        sentiment: Sentiment,
    ) -> Result<Analysis, EngineError> {
        let last = prices.last().ok_or(EngineError::InsufficientData {
            required: 1,
            actual: 0,
        })?;

        let indicators = self.compute_indicators(prices);
        let signals = Signals {
            current_price: last.close,
            volatility: self.estimate_volatility(prices),
            rsi: indicators.latest_rsi_or_neutral(),
            macd_hist: indicators.latest_macd_hist_or_neutral(),
            sentiment,
        };
        let decision = self.scorer.score(&forecast, &signals);
        debug!(
            symbol = prices.symbol(),
            label = %decision.label,
            score = decision.score,
            degraded = forecast.is_degraded(),
            "scored recommendation"
        );

        Ok(Analysis {
            symbol: prices.symbol().to_string(),
            as_of: last.date,
            current_price: signals.current_price,
            volatility: signals.volatility,
            rsi: signals.rsi,
            macd_hist: signals.macd_hist,
            sentiment,
            forecast,
            decision,
        })
    }
}
