//! IndicatorCalculator — RSI and MACD for one price series.

use serde::{Deserialize, Serialize};

use super::macd::macd_series;
use super::rsi::Rsi;
use super::{NEUTRAL_MACD_HIST, NEUTRAL_RSI};
use crate::domain::PriceSeries;
use crate::error::EngineError;

/// Indicator periods.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorParams {
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
        }
    }
}

impl IndicatorParams {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.rsi_period == 0 {
            return Err(EngineError::InvalidParameter {
                name: "rsi_period",
                reason: "must be >= 1".into(),
            });
        }
        if self.macd_fast == 0 || self.macd_signal == 0 {
            return Err(EngineError::InvalidParameter {
                name: "macd_fast/macd_signal",
                reason: "must be >= 1".into(),
            });
        }
        if self.macd_slow <= self.macd_fast {
            return Err(EngineError::InvalidParameter {
                name: "macd_slow",
                reason: format!(
                    "must exceed macd_fast ({} <= {})",
                    self.macd_slow, self.macd_fast
                ),
            });
        }
        Ok(())
    }
}

/// RSI and MACD lines, index-aligned 1:1 with the input series.
///
/// Leading entries are NaN until enough history exists. NaN means
/// "indicator unavailable", never an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSet {
    pub rsi: Vec<f64>,
    pub macd: Vec<f64>,
    pub macd_signal: Vec<f64>,
    pub macd_hist: Vec<f64>,
}

impl IndicatorSet {
    /// All-NaN set of length `n`.
    pub fn unavailable(n: usize) -> Self {
        Self {
            rsi: vec![f64::NAN; n],
            macd: vec![f64::NAN; n],
            macd_signal: vec![f64::NAN; n],
            macd_hist: vec![f64::NAN; n],
        }
    }

    pub fn len(&self) -> usize {
        self.rsi.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rsi.is_empty()
    }

    /// Latest RSI, or the neutral 50 when undefined.
    pub fn latest_rsi_or_neutral(&self) -> f64 {
        latest_or(&self.rsi, NEUTRAL_RSI)
    }

    /// Latest MACD histogram, or the neutral 0 when undefined.
    pub fn latest_macd_hist_or_neutral(&self) -> f64 {
        latest_or(&self.macd_hist, NEUTRAL_MACD_HIST)
    }
}

fn latest_or(values: &[f64], neutral: f64) -> f64 {
    match values.last() {
        Some(v) if v.is_finite() => *v,
        _ => neutral,
    }
}

#[derive(Debug, Clone, Default)]
pub struct IndicatorCalculator {
    params: IndicatorParams,
}

impl IndicatorCalculator {
    pub fn new(params: IndicatorParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &IndicatorParams {
        &self.params
    }

    /// Compute RSI and the three MACD lines for `prices`.
    ///
    /// Fewer than two bars produce an all-NaN set.
    pub fn compute(&self, prices: &PriceSeries) -> IndicatorSet {
        let n = prices.len();
        if n < 2 {
            return IndicatorSet::unavailable(n);
        }

        let closes = prices.closes();
        let rsi = Rsi::new(self.params.rsi_period).compute_closes(&closes);
        let macd = macd_series(
            &closes,
            self.params.macd_fast,
            self.params.macd_slow,
            self.params.macd_signal,
        );

        IndicatorSet {
            rsi,
            macd: macd.macd,
            macd_signal: macd.signal,
            macd_hist: macd.histogram,
        }
    }
}
