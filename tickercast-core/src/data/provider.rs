//! Collaborator traits: price history and news sentiment.
//!
//! The engine never fetches anything itself. Callers implement these
//! traits (CSV files, HTTP APIs, fixtures) and hand the results to the
//! engine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{PriceSeries, SeriesError};

#[derive(Debug, Error)]
pub enum DataError {
    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("unknown history period '{0}' (expected 1mo, 3mo, 6mo, 1y, 2y, 5y or max)")]
    InvalidPeriod(String),

    #[error("malformed record {line} in {source_name}: {reason}")]
    Malformed {
        source_name: String,
        line: usize,
        reason: String,
    },

    #[error(transparent)]
    InvalidSeries(#[from] SeriesError),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("data error: {0}")]
    Other(String),
}

/// How much trailing history to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HistoryPeriod {
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[default]
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
    #[serde(rename = "5y")]
    FiveYears,
    #[serde(rename = "max")]
    Max,
}

impl HistoryPeriod {
    /// Approximate trading days covered; `None` for everything available.
    pub fn trading_days(self) -> Option<usize> {
        match self {
            HistoryPeriod::OneMonth => Some(21),
            HistoryPeriod::ThreeMonths => Some(63),
            HistoryPeriod::SixMonths => Some(126),
            HistoryPeriod::OneYear => Some(252),
            HistoryPeriod::TwoYears => Some(504),
            HistoryPeriod::FiveYears => Some(1260),
            HistoryPeriod::Max => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HistoryPeriod::OneMonth => "1mo",
            HistoryPeriod::ThreeMonths => "3mo",
            HistoryPeriod::SixMonths => "6mo",
            HistoryPeriod::OneYear => "1y",
            HistoryPeriod::TwoYears => "2y",
            HistoryPeriod::FiveYears => "5y",
            HistoryPeriod::Max => "max",
        }
    }
}

impl fmt::Display for HistoryPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HistoryPeriod {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1mo" => Ok(HistoryPeriod::OneMonth),
            "3mo" => Ok(HistoryPeriod::ThreeMonths),
            "6mo" => Ok(HistoryPeriod::SixMonths),
            "1y" => Ok(HistoryPeriod::OneYear),
            "2y" => Ok(HistoryPeriod::TwoYears),
            "5y" => Ok(HistoryPeriod::FiveYears),
            "max" => Ok(HistoryPeriod::Max),
            other => Err(DataError::InvalidPeriod(other.to_string())),
        }
    }
}

/// Source of daily price history.
pub trait DataFetcher: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Ascending daily bars for `ticker` covering `period`. The engine does
    /// not re-sort what it receives.
    fn get_history(&self, ticker: &str, period: HistoryPeriod) -> Result<PriceSeries, DataError>;
}

/// Source of an aggregated news-sentiment label.
pub trait SentimentProvider: Send + Sync {
    fn name(&self) -> &str;

    /// "positive", "negative" or "neutral". Any other label is read as
    /// neutral by the engine.
    fn aggregate(&self, ticker: &str) -> Result<String, DataError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn periods_parse_and_display() {
        for label in ["1mo", "3mo", "6mo", "1y", "2y", "5y", "max"] {
            let period: HistoryPeriod = label.parse().unwrap();
            assert_eq!(period.to_string(), label);
        }
        assert!("10y".parse::<HistoryPeriod>().is_err());
    }

    #[test]
    fn trading_days_grow_with_period() {
        assert_eq!(HistoryPeriod::OneYear.trading_days(), Some(252));
        assert_eq!(HistoryPeriod::Max.trading_days(), None);
        assert!(HistoryPeriod::OneMonth.trading_days() < HistoryPeriod::SixMonths.trading_days());
    }

    #[test]
    fn period_serde_uses_short_labels() {
        assert_eq!(serde_json::to_string(&HistoryPeriod::TwoYears).unwrap(), "\"2y\"");
        let p: HistoryPeriod = serde_json::from_str("\"max\"").unwrap();
        assert_eq!(p, HistoryPeriod::Max);
    }
}
