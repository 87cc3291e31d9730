//! Domain types for Tickercast

pub mod bar;
pub mod series;

pub use bar::PriceBar;
pub use series::{PriceSeries, SeriesError};
