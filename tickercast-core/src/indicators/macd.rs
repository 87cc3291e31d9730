//! Moving Average Convergence/Divergence (MACD).
//!
//! Three lines (separate Indicator instances):
//! - MACD: EMA(close, fast) - EMA(close, slow)
//! - Signal: EMA(MACD, signal)
//! - Histogram: MACD - Signal
//!
//! Lookback: slow - 1 for the MACD line, slow + signal - 2 for the
//! signal line and histogram.

use super::ema::ema_of_series;
use super::Indicator;
use crate::domain::PriceBar;

/// Which MACD line to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdLine {
    Macd,
    Signal,
    Histogram,
}

/// All three MACD lines, index-aligned with the input.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

/// Compute the MACD line, its signal line, and the histogram in one pass.
pub fn macd_series(closes: &[f64], fast: usize, slow: usize, signal: usize) -> MacdSeries {
    let fast_ema = ema_of_series(closes, fast);
    let slow_ema = ema_of_series(closes, slow);

    // NaN - x stays NaN, so the line inherits the slow warmup.
    let macd: Vec<f64> = fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| f - s)
        .collect();
    let signal_line = ema_of_series(&macd, signal);
    let histogram = macd
        .iter()
        .zip(&signal_line)
        .map(|(m, s)| m - s)
        .collect();

    MacdSeries {
        macd,
        signal: signal_line,
        histogram,
    }
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    line: MacdLine,
    name: String,
}

impl Macd {
    fn with_line(fast: usize, slow: usize, signal: usize, line: MacdLine) -> Self {
        assert!(fast >= 1, "MACD fast period must be >= 1");
        assert!(slow > fast, "MACD slow period must exceed the fast period");
        assert!(signal >= 1, "MACD signal period must be >= 1");
        let prefix = match line {
            MacdLine::Macd => "macd",
            MacdLine::Signal => "macd_signal",
            MacdLine::Histogram => "macd_hist",
        };
        Self {
            fast,
            slow,
            signal,
            line,
            name: format!("{prefix}_{fast}_{slow}_{signal}"),
        }
    }

    pub fn line(fast: usize, slow: usize, signal: usize) -> Self {
        Self::with_line(fast, slow, signal, MacdLine::Macd)
    }

    pub fn signal(fast: usize, slow: usize, signal: usize) -> Self {
        Self::with_line(fast, slow, signal, MacdLine::Signal)
    }

    pub fn histogram(fast: usize, slow: usize, signal: usize) -> Self {
        Self::with_line(fast, slow, signal, MacdLine::Histogram)
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        match self.line {
            MacdLine::Macd => self.slow - 1,
            MacdLine::Signal | MacdLine::Histogram => self.slow + self.signal - 2,
        }
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let series = macd_series(&closes, self.fast, self.slow, self.signal);
        match self.line {
            MacdLine::Macd => series.macd,
            MacdLine::Signal => series.signal,
            MacdLine::Histogram => series.histogram,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn macd_warmup_matches_lookback() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64 * 0.3).sin()).collect();
        let bars = make_bars(&closes);

        for indicator in [
            Macd::line(12, 26, 9),
            Macd::signal(12, 26, 9),
            Macd::histogram(12, 26, 9),
        ] {
            let result = indicator.compute(&bars);
            let lookback = indicator.lookback();
            assert!(
                result[..lookback].iter().all(|v| v.is_nan()),
                "{} defined before lookback",
                indicator.name()
            );
            assert!(!result[lookback].is_nan(), "{} undefined at lookback", indicator.name());
        }
    }

    #[test]
    fn macd_of_constant_series_is_exactly_zero() {
        let series = macd_series(&[100.0; 80], 12, 26, 9);
        assert_eq!(series.macd[79], 0.0);
        assert_eq!(series.signal[79], 0.0);
        assert_eq!(series.histogram[79], 0.0);
    }

    #[test]
    fn macd_positive_in_uptrend() {
        let closes: Vec<f64> = (0..80).map(|i| 100.0 * 1.01_f64.powi(i)).collect();
        let series = macd_series(&closes, 12, 26, 9);
        assert!(series.macd[79] > 0.0);
        // Accelerating trend: MACD keeps rising above its own average.
        assert!(series.histogram[79] > 0.0);
    }

    #[test]
    fn histogram_is_macd_minus_signal() {
        let closes: Vec<f64> = (0..70).map(|i| 50.0 + (i as f64 * 0.2).cos() * 3.0).collect();
        let series = macd_series(&closes, 12, 26, 9);
        for i in 33..70 {
            assert_approx(
                series.histogram[i],
                series.macd[i] - series.signal[i],
                DEFAULT_EPSILON,
            );
        }
    }

    #[test]
    fn macd_too_short_is_all_nan() {
        let series = macd_series(&[100.0; 20], 12, 26, 9);
        assert!(series.macd.iter().all(|v| v.is_nan()));
        assert!(series.histogram.iter().all(|v| v.is_nan()));
    }
}
