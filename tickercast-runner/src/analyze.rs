//! Per-ticker analysis: fetch history, aggregate sentiment, forecast
//! (through the cache), score.
//!
//! Tickers are independent, so `analyze_many` fans them out over rayon
//! with one shared engine. Results come back in input order.

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use tickercast_core::data::{DataError, DataFetcher, HistoryPeriod, SentimentProvider};
use tickercast_core::{Analysis, Engine, EngineError, ForecastResult, PriceSeries, Sentiment};

use crate::cache::{CacheKey, ForecastCache};

#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("{ticker}: {source}")]
    Data {
        ticker: String,
        #[source]
        source: DataError,
    },

    #[error("{ticker}: {source}")]
    Engine {
        ticker: String,
        #[source]
        source: EngineError,
    },
}

impl AnalyzeError {
    pub fn ticker(&self) -> &str {
        match self {
            AnalyzeError::Data { ticker, .. } | AnalyzeError::Engine { ticker, .. } => ticker,
        }
    }

    /// True when requesting a longer history period could succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AnalyzeError::Engine { source, .. } if source.is_recoverable())
    }
}

/// Latest indicator readings for one ticker. Undefined values are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub symbol: String,
    pub as_of: NaiveDate,
    pub close: f64,
    pub bars: usize,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_hist: Option<f64>,
    pub volatility: f64,
}

/// One line of a multi-ticker report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerReport {
    pub ticker: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<Analysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TickerReport {
    fn from_result(ticker: &str, result: Result<Analysis, AnalyzeError>) -> Self {
        match result {
            Ok(analysis) => Self {
                ticker: ticker.to_string(),
                analysis: Some(analysis),
                error: None,
            },
            Err(err) => Self {
                ticker: ticker.to_string(),
                analysis: None,
                error: Some(err.to_string()),
            },
        }
    }
}

pub struct Analyzer {
    engine: Engine,
    history: Box<dyn DataFetcher>,
    sentiment: Option<Box<dyn SentimentProvider>>,
    cache: Option<ForecastCache>,
    parallel: bool,
}

impl Analyzer {
    pub fn new(engine: Engine, history: Box<dyn DataFetcher>) -> Self {
        Self {
            engine,
            history,
            sentiment: None,
            cache: None,
            parallel: true,
        }
    }

    pub fn with_sentiment(mut self, provider: Box<dyn SentimentProvider>) -> Self {
        self.sentiment = Some(provider);
        self
    }

    pub fn with_cache(mut self, cache: ForecastCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn cache(&self) -> Option<&ForecastCache> {
        self.cache.as_ref()
    }

    pub fn history(&self, ticker: &str, period: HistoryPeriod) -> Result<PriceSeries, AnalyzeError> {
        self.history
            .get_history(ticker, period)
            .map_err(|source| AnalyzeError::Data {
                ticker: ticker.to_string(),
                source,
            })
    }

    /// Provider label for `ticker`; provider failures count as neutral.
    pub fn sentiment(&self, ticker: &str) -> Sentiment {
        let Some(provider) = &self.sentiment else {
            return Sentiment::Neutral;
        };
        match provider.aggregate(ticker) {
            Ok(label) => Sentiment::from_label(&label),
            Err(err) => {
                warn!(ticker, provider = provider.name(), error = %err, "sentiment unavailable, using neutral");
                Sentiment::Neutral
            }
        }
    }

    /// Forecast through the cache. Cache failures are logged and bypassed.
    pub fn forecast(&self, prices: &PriceSeries, horizon: usize) -> Result<ForecastResult, EngineError> {
        let Some(cache) = &self.cache else {
            return self.engine.forecast(prices, horizon);
        };
        let Some(last) = prices.last() else {
            return self.engine.forecast(prices, horizon);
        };

        let key = CacheKey::new(prices.symbol(), last.date, horizon);
        match cache.get(&key) {
            Ok(Some(hit)) => return Ok(hit),
            Ok(None) => {}
            Err(err) => warn!(symbol = prices.symbol(), error = %err, "forecast cache read failed"),
        }

        let forecast = self.engine.forecast(prices, horizon)?;
        if let Err(err) = cache.put(key, forecast.clone()) {
            warn!(symbol = prices.symbol(), error = %err, "forecast cache write failed");
        }
        Ok(forecast)
    }

    pub fn analyze(&self, ticker: &str, period: HistoryPeriod, horizon: usize) -> Result<Analysis, AnalyzeError> {
        let prices = self.history(ticker, period)?;
        let sentiment = self.sentiment(ticker);
        let engine_err = |source| AnalyzeError::Engine {
            ticker: ticker.to_string(),
            source,
        };

        let forecast = self.forecast(&prices, horizon).map_err(engine_err)?;
        let analysis = self
            .engine
            .assess(&prices, forecast, sentiment)
            .map_err(engine_err)?;

        info!(
            ticker,
            recommendation = %analysis.decision.label,
            score = analysis.decision.score,
            price = analysis.current_price,
            degraded = analysis.forecast.is_degraded(),
            "analysis complete"
        );
        Ok(analysis)
    }

    /// Analyze every ticker; one failing ticker does not affect the rest.
    pub fn analyze_many(&self, tickers: &[String], period: HistoryPeriod, horizon: usize) -> Vec<TickerReport> {
        let run = |ticker: &String| TickerReport::from_result(ticker, self.analyze(ticker, period, horizon));
        let reports: Vec<TickerReport> = if self.parallel {
            tickers.par_iter().map(run).collect()
        } else {
            tickers.iter().map(run).collect()
        };

        let failed = reports.iter().filter(|r| r.error.is_some()).count();
        info!(tickers = reports.len(), failed, "batch analysis finished");
        reports
    }

    pub fn indicators(&self, ticker: &str, period: HistoryPeriod) -> Result<IndicatorSnapshot, AnalyzeError> {
        let prices = self.history(ticker, period)?;
        let last = prices.last().ok_or_else(|| AnalyzeError::Engine {
            ticker: ticker.to_string(),
            source: EngineError::InsufficientData {
                required: 1,
                actual: 0,
            },
        })?;

        let set = self.engine.compute_indicators(&prices);
        let latest = |values: &[f64]| values.last().copied().filter(|v| v.is_finite());
        Ok(IndicatorSnapshot {
            symbol: prices.symbol().to_string(),
            as_of: last.date,
            close: last.close,
            bars: prices.len(),
            rsi: latest(&set.rsi),
            macd: latest(&set.macd),
            macd_signal: latest(&set.macd_signal),
            macd_hist: latest(&set.macd_hist),
            volatility: self.engine.estimate_volatility(&prices),
        })
    }
}
