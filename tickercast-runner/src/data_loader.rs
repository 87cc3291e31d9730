//! Price history from CSV files.
//!
//! One file per ticker at `<dir>/<TICKER>.csv` with a header row. Columns
//! are matched by name (`date,open,high,low,close,volume`, either case);
//! extra columns such as `Adj Close` are ignored. Rows must already be in
//! ascending date order: the loader validates, it never sorts.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use tickercast_core::data::{DataError, DataFetcher, HistoryPeriod};
use tickercast_core::{PriceBar, PriceSeries, SeriesError};

/// Errors from the CSV loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no history file for '{symbol}' at {}", path.display())]
    Missing { symbol: String, path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{}: row {row}: {source}", path.display())]
    Row {
        path: PathBuf,
        row: usize,
        #[source]
        source: csv::Error,
    },

    #[error("{}: {source}", path.display())]
    Series {
        path: PathBuf,
        #[source]
        source: SeriesError,
    },
}

impl From<LoadError> for DataError {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::Missing { symbol, .. } => DataError::SymbolNotFound { symbol },
            LoadError::Row { path, row, source } => DataError::Malformed {
                source_name: path.display().to_string(),
                line: row,
                reason: source.to_string(),
            },
            LoadError::Series { source, .. } => DataError::InvalidSeries(source),
            LoadError::Read { .. } => DataError::Io(err.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(alias = "Date")]
    date: NaiveDate,
    #[serde(alias = "Open")]
    open: f64,
    #[serde(alias = "High")]
    high: f64,
    #[serde(alias = "Low")]
    low: f64,
    #[serde(alias = "Close")]
    close: f64,
    #[serde(alias = "Volume", default)]
    volume: Option<f64>,
}

impl From<CsvRow> for PriceBar {
    fn from(row: CsvRow) -> Self {
        let volume = row.volume.filter(|v| v.is_finite() && *v > 0.0).unwrap_or(0.0);
        PriceBar::new(row.date, row.open, row.high, row.low, row.close, volume.round() as u64)
    }
}

/// Read and validate one CSV history file.
pub fn load_csv(path: &Path, symbol: &str) -> Result<PriceSeries, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    let mut bars = Vec::new();
    for (i, record) in reader.deserialize::<CsvRow>().enumerate() {
        let row = record.map_err(|source| LoadError::Row {
            path: path.to_path_buf(),
            // header is line 1
            row: i + 2,
            source,
        })?;
        bars.push(PriceBar::from(row));
    }

    let series = PriceSeries::new(symbol, bars).map_err(|source| LoadError::Series {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(symbol, bars = series.len(), path = %path.display(), "loaded CSV history");
    Ok(series)
}

/// `DataFetcher` over a directory of per-ticker CSV files.
#[derive(Debug, Clone)]
pub struct CsvHistory {
    dir: PathBuf,
}

impl CsvHistory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<dir>/<ticker>.csv`, falling back to the upper-cased ticker.
    pub fn path_for(&self, ticker: &str) -> PathBuf {
        let exact = self.dir.join(format!("{ticker}.csv"));
        if exact.exists() {
            return exact;
        }
        self.dir.join(format!("{}.csv", ticker.to_ascii_uppercase()))
    }

    /// Full history for `ticker`, untrimmed.
    pub fn load(&self, ticker: &str) -> Result<PriceSeries, LoadError> {
        let path = self.path_for(ticker);
        if !path.exists() {
            return Err(LoadError::Missing {
                symbol: ticker.to_string(),
                path,
            });
        }
        load_csv(&path, ticker)
    }
}

impl DataFetcher for CsvHistory {
    fn name(&self) -> &str {
        "csv"
    }

    fn get_history(&self, ticker: &str, period: HistoryPeriod) -> Result<PriceSeries, DataError> {
        let series = self.load(ticker)?;
        Ok(match period.trading_days() {
            Some(days) => series.tail_series(days),
            None => series,
        })
    }
}
