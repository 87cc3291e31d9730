pub mod provider;

pub use provider::{DataError, DataFetcher, HistoryPeriod, SentimentProvider};
