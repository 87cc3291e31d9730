//! Momentum indicators over close prices.
//!
//! Indicators are pure functions: bar history in, numeric series out, one
//! value per input bar. The first `lookback()` values are `f64::NAN`
//! (warmup). `IndicatorCalculator` bundles RSI and MACD into the
//! `IndicatorSet` the scorer consumes.
//!
//! MACD is a multi-series indicator; each line (MACD, signal, histogram) is
//! exposed as a separate named instance, keeping the single-series
//! `Indicator` trait unchanged.

pub mod calculator;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use calculator::{IndicatorCalculator, IndicatorParams, IndicatorSet};
pub use ema::{ema_of_series, Ema};
pub use macd::{macd_series, Macd, MacdLine, MacdSeries};
pub use rsi::Rsi;
pub use sma::rolling_mean;

use crate::domain::PriceBar;

/// RSI reading used whenever RSI is undefined.
pub const NEUTRAL_RSI: f64 = 50.0;

/// MACD histogram reading used whenever the histogram is undefined.
pub const NEUTRAL_MACD_HIST: f64 = 0.0;

/// Trait for indicators.
///
/// Indicators take a full bar series and produce an output series of the
/// same length.
///
/// # Look-ahead contamination guard
/// No indicator value at bar t may depend on price data from bar t+1 or
/// later. Every indicator must pass the truncated-vs-full series test.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "rsi_14", "macd_hist_12_26_9").
    fn name(&self) -> &str;

    /// Number of bars needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    fn compute(&self, bars: &[PriceBar]) -> Vec<f64>;
}

/// Create synthetic bars from close prices for testing.
///
/// open = prev_close (or close for the first bar), high/low bracket the
/// body by 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<PriceBar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            PriceBar {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
