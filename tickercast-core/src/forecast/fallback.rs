//! Naive linear extrapolation used when no step predictor is usable.

use ndarray::Array2;

use super::features::PriceFeature;
use crate::domain::PriceBar;

/// Project each feature forward by its mean daily change over the last
/// `lookback` changes. Returns `[horizon, features]` price rows.
///
/// Uses as many changes as exist when the history is shorter; a single bar
/// projects flat. Projected prices are floored at zero.
pub fn naive_extrapolation(
    bars: &[PriceBar],
    features: &[PriceFeature],
    horizon: usize,
    lookback: usize,
) -> Array2<f64> {
    let mut out = Array2::zeros((horizon, features.len()));
    let Some(last) = bars.last() else {
        return out;
    };

    let changes = lookback.min(bars.len().saturating_sub(1));
    let recent = &bars[bars.len() - 1 - changes..];

    for (col, feature) in features.iter().enumerate() {
        let anchor = feature.value(last);
        let mean_change = if changes == 0 {
            0.0
        } else {
            (anchor - feature.value(&recent[0])) / changes as f64
        };
        for step in 0..horizon {
            out[[step, col]] = (anchor + mean_change * (step + 1) as f64).max(0.0);
        }
    }
    out
}
