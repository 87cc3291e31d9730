//! Price features tracked by the forecaster.

use std::fmt;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::domain::PriceBar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceFeature {
    Open,
    High,
    Low,
    Close,
}

impl PriceFeature {
    pub fn value(self, bar: &PriceBar) -> f64 {
        match self {
            PriceFeature::Open => bar.open,
            PriceFeature::High => bar.high,
            PriceFeature::Low => bar.low,
            PriceFeature::Close => bar.close,
        }
    }
}

impl fmt::Display for PriceFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PriceFeature::Open => "open",
            PriceFeature::High => "high",
            PriceFeature::Low => "low",
            PriceFeature::Close => "close",
        };
        f.write_str(name)
    }
}

/// Default tracked features: open and close.
pub fn default_features() -> Vec<PriceFeature> {
    vec![PriceFeature::Open, PriceFeature::Close]
}

/// `[bars, features]` matrix of raw prices, rows oldest first.
pub fn feature_matrix(bars: &[PriceBar], features: &[PriceFeature]) -> Array2<f64> {
    Array2::from_shape_fn((bars.len(), features.len()), |(row, col)| {
        features[col].value(&bars[row])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn matrix_follows_feature_order() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let bars = vec![
            PriceBar::new(date, 10.0, 12.0, 9.0, 11.0, 100),
            PriceBar::new(date.succ_opt().unwrap(), 11.0, 13.0, 10.0, 12.5, 100),
        ];
        let m = feature_matrix(&bars, &[PriceFeature::Close, PriceFeature::Open]);
        assert_eq!(m.shape(), &[2, 2]);
        assert_eq!(m[[0, 0]], 11.0);
        assert_eq!(m[[0, 1]], 10.0);
        assert_eq!(m[[1, 0]], 12.5);
    }

    #[test]
    fn feature_names_are_snake_case() {
        let json = serde_json::to_string(&default_features()).unwrap();
        assert_eq!(json, r#"["open","close"]"#);
        assert_eq!(PriceFeature::High.to_string(), "high");
    }
}
