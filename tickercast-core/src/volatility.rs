//! Annualized historical volatility.
//!
//! r_t = ln(close_t / close_{t-1}); rolling sample standard deviation over
//! `window` returns; scaled by sqrt(periods_per_year). Reports 0.0, not an
//! error, when fewer than `window + 1` bars exist.

use serde::{Deserialize, Serialize};

use crate::domain::PriceSeries;
use crate::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolatilityParams {
    pub window: usize,
    pub periods_per_year: f64,
}

impl Default for VolatilityParams {
    fn default() -> Self {
        Self {
            window: 20,
            periods_per_year: 252.0,
        }
    }
}

impl VolatilityParams {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.window < 2 {
            return Err(EngineError::InvalidParameter {
                name: "volatility.window",
                reason: "sample standard deviation needs at least 2 returns".into(),
            });
        }
        if !(self.periods_per_year.is_finite() && self.periods_per_year > 0.0) {
            return Err(EngineError::InvalidParameter {
                name: "volatility.periods_per_year",
                reason: format!("must be positive, got {}", self.periods_per_year),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct VolatilityEstimator {
    params: VolatilityParams,
}

impl VolatilityEstimator {
    pub fn new(params: VolatilityParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &VolatilityParams {
        &self.params
    }

    /// Latest annualized volatility, or 0.0 with too little history.
    pub fn estimate(&self, prices: &PriceSeries) -> f64 {
        self.rolling(prices)
            .last()
            .copied()
            .filter(|v| v.is_finite())
            .unwrap_or(0.0)
    }

    /// Full rolling annualized volatility, index-aligned with `prices`.
    ///
    /// Entries before bar `window` are NaN.
    pub fn rolling(&self, prices: &PriceSeries) -> Vec<f64> {
        let closes = prices.closes();
        let n = closes.len();
        let window = self.params.window;
        let mut result = vec![f64::NAN; n];

        if window < 2 || n < window + 1 {
            return result;
        }

        let returns: Vec<f64> = closes.windows(2).map(|w| (w[1] / w[0]).ln()).collect();
        let scale = self.params.periods_per_year.sqrt();

        // returns[j] belongs to bar j + 1
        for end in (window - 1)..returns.len() {
            let slice = &returns[(end + 1 - window)..=end];
            result[end + 1] = sample_std(slice) * scale;
        }

        result
    }
}

/// Sample standard deviation (divide by N - 1).
fn sample_std(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    // Rounding can leave a tiny negative residue on constant input.
    var.max(0.0).sqrt()
}
