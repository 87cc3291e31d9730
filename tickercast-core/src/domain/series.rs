//! PriceSeries — validated, chronologically ordered bars for one ticker.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::bar::PriceBar;

/// Structural problems detected while building a series.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("bar {index} ({date}) is not after the previous bar ({previous})")]
    NonMonotonic {
        index: usize,
        date: NaiveDate,
        previous: NaiveDate,
    },

    #[error("duplicate timestamp {date} at bar {index}")]
    DuplicateTimestamp { index: usize, date: NaiveDate },

    #[error("bar {index} ({date}) has a non-finite price")]
    NonFinitePrice { index: usize, date: NaiveDate },

    #[error("bar {index} ({date}) has a non-positive open or close")]
    NonPositivePrice { index: usize, date: NaiveDate },

    #[error("bar {index} ({date}) has high below low")]
    InvertedRange { index: usize, date: NaiveDate },
}

/// Ordered bar history for one ticker.
///
/// Construction validates the ordering contract (strictly increasing dates,
/// no duplicates) and rejects malformed prices. Once built the series is
/// immutable; every engine operation borrows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Validate and wrap `bars`. Bars are never re-sorted; out-of-order
    /// input is an error.
    pub fn new(symbol: impl Into<String>, bars: Vec<PriceBar>) -> Result<Self, SeriesError> {
        for (index, bar) in bars.iter().enumerate() {
            if bar.has_non_finite() {
                return Err(SeriesError::NonFinitePrice {
                    index,
                    date: bar.date,
                });
            }
            if bar.open <= 0.0 || bar.close <= 0.0 {
                return Err(SeriesError::NonPositivePrice {
                    index,
                    date: bar.date,
                });
            }
            if bar.high < bar.low {
                return Err(SeriesError::InvertedRange {
                    index,
                    date: bar.date,
                });
            }
            if index > 0 {
                let previous = bars[index - 1].date;
                if bar.date == previous {
                    return Err(SeriesError::DuplicateTimestamp {
                        index,
                        date: bar.date,
                    });
                }
                if bar.date < previous {
                    return Err(SeriesError::NonMonotonic {
                        index,
                        date: bar.date,
                        previous,
                    });
                }
            }
        }

        Ok(Self {
            symbol: symbol.into(),
            bars,
        })
    }

    /// Build a series from `(date, close)` pairs with open/high/low = close.
    pub fn from_closes(
        symbol: impl Into<String>,
        points: impl IntoIterator<Item = (NaiveDate, f64)>,
    ) -> Result<Self, SeriesError> {
        let bars = points
            .into_iter()
            .map(|(date, close)| PriceBar::from_close(date, close))
            .collect();
        Self::new(symbol, bars)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    pub fn last_close(&self) -> Option<f64> {
        self.bars.last().map(|b| b.close)
    }

    /// Close prices in bar order.
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// The trailing `n` bars (or all of them if the series is shorter).
    pub fn tail(&self, n: usize) -> &[PriceBar] {
        &self.bars[self.bars.len().saturating_sub(n)..]
    }

    /// A new series holding only the trailing `n` bars.
    ///
    /// Ordering was validated on construction, so the tail is valid too.
    pub fn tail_series(&self, n: usize) -> PriceSeries {
        PriceSeries {
            symbol: self.symbol.clone(),
            bars: self.tail(n).to_vec(),
        }
    }

    /// Deterministic BLAKE3 digest over the symbol and all bar data.
    ///
    /// Used to tie model artifacts and cache entries to the exact history
    /// they were produced from.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.symbol.as_bytes());
        for bar in &self.bars {
            hasher.update(bar.date.to_string().as_bytes());
            hasher.update(&bar.open.to_le_bytes());
            hasher.update(&bar.high.to_le_bytes());
            hasher.update(&bar.low.to_le_bytes());
            hasher.update(&bar.close.to_le_bytes());
            hasher.update(&bar.volume.to_le_bytes());
        }
        hasher.finalize().to_hex().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn accepts_strictly_increasing_dates() {
        let series =
            PriceSeries::from_closes("SPY", vec![(day(2), 100.0), (day(3), 101.0), (day(4), 99.5)])
                .unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.symbol(), "SPY");
        assert_eq!(series.last_close(), Some(99.5));
        assert_eq!(series.closes(), vec![100.0, 101.0, 99.5]);
    }

    #[test]
    fn rejects_duplicate_timestamps() {
        let err = PriceSeries::from_closes("SPY", vec![(day(2), 100.0), (day(2), 101.0)])
            .unwrap_err();
        assert_eq!(
            err,
            SeriesError::DuplicateTimestamp {
                index: 1,
                date: day(2)
            }
        );
    }

    #[test]
    fn rejects_out_of_order_bars() {
        let err = PriceSeries::from_closes("SPY", vec![(day(3), 100.0), (day(2), 101.0)])
            .unwrap_err();
        assert!(matches!(err, SeriesError::NonMonotonic { index: 1, .. }));
    }

    #[test]
    fn rejects_nan_and_non_positive_prices() {
        let err = PriceSeries::from_closes("SPY", vec![(day(2), f64::NAN)]).unwrap_err();
        assert!(matches!(err, SeriesError::NonFinitePrice { index: 0, .. }));

        let err = PriceSeries::from_closes("SPY", vec![(day(2), 0.0)]).unwrap_err();
        assert!(matches!(err, SeriesError::NonPositivePrice { index: 0, .. }));
    }

    #[test]
    fn rejects_inverted_range() {
        let bar = PriceBar::new(day(2), 100.0, 99.0, 101.0, 100.0, 0);
        let err = PriceSeries::new("SPY", vec![bar]).unwrap_err();
        assert!(matches!(err, SeriesError::InvertedRange { index: 0, .. }));
    }

    #[test]
    fn empty_series_is_valid() {
        let series = PriceSeries::new("SPY", vec![]).unwrap();
        assert!(series.is_empty());
        assert_eq!(series.last_close(), None);
    }

    #[test]
    fn tail_series_keeps_trailing_bars() {
        let series = PriceSeries::from_closes(
            "SPY",
            (2..=9).map(|d| (day(d), 100.0 + d as f64)),
        )
        .unwrap();
        let tail = series.tail_series(3);
        assert_eq!(tail.len(), 3);
        assert_eq!(tail.bars()[0].date, day(7));
        assert_eq!(series.tail(100).len(), 8);
    }

    #[test]
    fn fingerprint_is_deterministic_and_data_sensitive() {
        let a = PriceSeries::from_closes("SPY", vec![(day(2), 100.0), (day(3), 101.0)]).unwrap();
        let b = PriceSeries::from_closes("SPY", vec![(day(2), 100.0), (day(3), 101.0)]).unwrap();
        let c = PriceSeries::from_closes("SPY", vec![(day(2), 100.0), (day(3), 101.5)]).unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
    }
}
