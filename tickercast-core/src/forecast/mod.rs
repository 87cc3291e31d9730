//! Multi-step price forecasting.
//!
//! `SequenceForecaster` scales the trailing window of tracked features,
//! drives a `StepPredictor` recursively for `horizon` steps (each
//! prediction is appended and the oldest row dropped), and inverse-scales
//! the result. Dates are business days following the last bar.
//!
//! Recursive prediction compounds error, so each point carries a
//! confidence that decays geometrically with its step index.
//!
//! A missing predictor, a predictor error, a wrong output width, or any
//! non-finite output switches the whole forecast to naive linear
//! extrapolation, tagged `ForecastMode::NaiveFallback`.

pub mod calendar;
pub mod context;
pub mod fallback;
pub mod features;
pub mod scaler;

pub use context::ForecastContext;
pub use features::{default_features, feature_matrix, PriceFeature};
pub use scaler::MinMaxScaler;

use chrono::NaiveDate;
use ndarray::{concatenate, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::PriceSeries;
use crate::error::EngineError;
use crate::predictor::StepPredictor;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Trailing bars fed to the predictor per step.
    pub window: usize,
    /// Default number of future business days.
    pub horizon: usize,
    /// Tracked features; must include `close`.
    pub features: Vec<PriceFeature>,
    /// Changes averaged by the naive fallback.
    pub fallback_lookback: usize,
    /// Fractional confidence lost per step.
    pub confidence_decay: f64,
    /// Starting confidence of a fallback forecast (a model starts at 1.0).
    pub fallback_confidence: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            window: 60,
            horizon: 5,
            features: default_features(),
            fallback_lookback: 5,
            confidence_decay: 0.1,
            fallback_confidence: 0.5,
        }
    }
}

impl ForecastConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.window == 0 {
            return Err(EngineError::InvalidParameter {
                name: "forecast.window",
                reason: "must be >= 1".into(),
            });
        }
        if !self.features.contains(&PriceFeature::Close) {
            return Err(EngineError::InvalidParameter {
                name: "forecast.features",
                reason: "close must be tracked".into(),
            });
        }
        let mut seen = self.features.clone();
        seen.sort_by_key(|f| *f as u8);
        seen.dedup();
        if seen.len() != self.features.len() {
            return Err(EngineError::InvalidParameter {
                name: "forecast.features",
                reason: "duplicate feature".into(),
            });
        }
        if self.fallback_lookback == 0 {
            return Err(EngineError::InvalidParameter {
                name: "forecast.fallback_lookback",
                reason: "must be >= 1".into(),
            });
        }
        if !(0.0..1.0).contains(&self.confidence_decay) {
            return Err(EngineError::InvalidParameter {
                name: "forecast.confidence_decay",
                reason: format!("must be in [0, 1), got {}", self.confidence_decay),
            });
        }
        if !(self.fallback_confidence > 0.0 && self.fallback_confidence <= 1.0) {
            return Err(EngineError::InvalidParameter {
                name: "forecast.fallback_confidence",
                reason: format!("must be in (0, 1], got {}", self.fallback_confidence),
            });
        }
        Ok(())
    }

    fn column_of(&self, feature: PriceFeature) -> Option<usize> {
        self.features.iter().position(|f| *f == feature)
    }
}

/// One forecast step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub predicted_close: f64,
    /// Present when open is a tracked feature.
    pub predicted_open: Option<f64>,
    /// In (0, 1]; decays with the step index.
    pub confidence: f64,
}

/// How a forecast was produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ForecastMode {
    Model { name: String, version: String },
    NaiveFallback { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub symbol: String,
    /// Date of the last known bar.
    pub as_of: NaiveDate,
    pub points: Vec<ForecastPoint>,
    pub mode: ForecastMode,
}

impl ForecastResult {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&ForecastPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&ForecastPoint> {
        self.points.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.predicted_close).collect()
    }

    /// True when the naive fallback produced this forecast.
    pub fn is_degraded(&self) -> bool {
        matches!(self.mode, ForecastMode::NaiveFallback { .. })
    }
}

#[derive(Debug, Clone, Default)]
pub struct SequenceForecaster {
    config: ForecastConfig,
}

impl SequenceForecaster {
    pub fn new(config: ForecastConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Forecast `horizon` business days ahead, using (and on first use
    /// fitting) the scaler registered for the series symbol in `ctx`.
    pub fn forecast(
        &self,
        prices: &PriceSeries,
        horizon: usize,
        ctx: &ForecastContext,
    ) -> Result<ForecastResult, EngineError> {
        self.check_length(prices)?;
        let scaler = ctx.scaler_or_fit(prices.symbol(), || {
            MinMaxScaler::fit(feature_matrix(prices.bars(), &self.config.features).view())
        })?;
        let predictor = ctx.predictor();
        self.forecast_with(prices, horizon, predictor.as_deref(), &scaler)
    }

    /// Forecast with an explicit predictor and scaler.
    pub fn forecast_with(
        &self,
        prices: &PriceSeries,
        horizon: usize,
        predictor: Option<&dyn StepPredictor>,
        scaler: &MinMaxScaler,
    ) -> Result<ForecastResult, EngineError> {
        self.check_length(prices)?;
        let last = prices
            .last()
            .ok_or(EngineError::InsufficientData {
                required: self.config.window,
                actual: 0,
            })?;
        let dates = calendar::business_days_after(last.date, horizon);

        let outcome = match predictor {
            Some(model) => self
                .run_model(prices, horizon, model, scaler)
                .map(|rows| (rows, model_mode(model))),
            None => Err(EngineError::ModelUnavailable("no step predictor installed".into())),
        };

        let (rows, mode, base_confidence) = match outcome {
            Ok((rows, mode)) => (rows, mode, 1.0),
            Err(EngineError::ModelUnavailable(reason)) => {
                warn!(symbol = prices.symbol(), %reason, "step predictor unavailable, using naive extrapolation");
                let rows = fallback::naive_extrapolation(
                    prices.bars(),
                    &self.config.features,
                    horizon,
                    self.config.fallback_lookback,
                );
                (
                    rows,
                    ForecastMode::NaiveFallback { reason },
                    self.config.fallback_confidence,
                )
            }
            Err(other) => return Err(other),
        };

        let points = self.assemble(&dates, &rows, base_confidence);
        if let (Some(first), Some(last)) = (points.first(), points.last()) {
            debug!(
                symbol = prices.symbol(),
                horizon,
                first_confidence = first.confidence,
                last_confidence = last.confidence,
                "forecast confidence decays over the horizon"
            );
        }

        Ok(ForecastResult {
            symbol: prices.symbol().to_string(),
            as_of: last.date,
            points,
            mode,
        })
    }

    fn check_length(&self, prices: &PriceSeries) -> Result<(), EngineError> {
        if prices.len() < self.config.window {
            return Err(EngineError::InsufficientData {
                required: self.config.window,
                actual: prices.len(),
            });
        }
        Ok(())
    }

    /// Recursive prediction; returns `[horizon, features]` price rows.
    /// Every predictor-side failure is reported as `ModelUnavailable`.
    fn run_model(
        &self,
        prices: &PriceSeries,
        horizon: usize,
        model: &dyn StepPredictor,
        scaler: &MinMaxScaler,
    ) -> Result<Array2<f64>, EngineError> {
        let width = self.config.features.len();
        let raw = feature_matrix(prices.tail(self.config.window), &self.config.features);
        let mut window = scaler.transform(raw.view())?;
        let mut scaled = Array2::zeros((horizon, width));

        for step in 0..horizon {
            let next = model.predict_next(window.view()).map_err(|e| {
                EngineError::ModelUnavailable(format!("{} failed at step {step}: {e}", model.name()))
            })?;
            if next.len() != width {
                return Err(EngineError::ModelUnavailable(format!(
                    "{} returned {} values at step {step}, expected {width}",
                    model.name(),
                    next.len()
                )));
            }
            if next.iter().any(|v| !v.is_finite()) {
                return Err(EngineError::ModelUnavailable(format!(
                    "{} returned non-finite output at step {step}",
                    model.name()
                )));
            }

            scaled.row_mut(step).assign(&next);
            window = slide(window.view(), next.view().insert_axis(Axis(0)))?;
        }

        let out = scaler.inverse_transform(scaled.view())?;
        if out.iter().any(|v| !v.is_finite()) {
            return Err(EngineError::ModelUnavailable(
                "inverse scaling produced non-finite prices".into(),
            ));
        }
        Ok(out)
    }

    fn assemble(&self, dates: &[NaiveDate], rows: &Array2<f64>, base: f64) -> Vec<ForecastPoint> {
        let close = self.config.column_of(PriceFeature::Close).unwrap_or(0);
        let open = self.config.column_of(PriceFeature::Open);
        let keep = 1.0 - self.config.confidence_decay;

        dates
            .iter()
            .zip(rows.outer_iter())
            .enumerate()
            .map(|(step, (&date, row))| ForecastPoint {
                date,
                predicted_close: row[close],
                predicted_open: open.map(|j| row[j]),
                confidence: base * keep.powi(step as i32 + 1),
            })
            .collect()
    }
}

fn model_mode(model: &dyn StepPredictor) -> ForecastMode {
    ForecastMode::Model {
        name: model.name().to_string(),
        version: model.version().to_string(),
    }
}

/// Drop the oldest row and append `next`.
fn slide(window: ArrayView2<'_, f64>, next: ArrayView2<'_, f64>) -> Result<Array2<f64>, EngineError> {
    let start = usize::from(window.nrows() > 0);
    concatenate(Axis(0), &[window.slice_axis(Axis(0), (start..).into()), next.view()])
        .map_err(|e| EngineError::ModelUnavailable(format!("window shape error: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::{LinearTrendPredictor, PredictorError};
    use ndarray::{array, Array1};

    fn series(closes: &[f64]) -> PriceSeries {
        PriceSeries::new("TEST", crate::indicators::make_bars(closes)).unwrap()
    }

    struct Failing;

    impl StepPredictor for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn predict_next(&self, _: ArrayView2<'_, f64>) -> Result<Array1<f64>, PredictorError> {
            Err(PredictorError::Failed("boom".into()))
        }
    }

    struct NanOutput;

    impl StepPredictor for NanOutput {
        fn name(&self) -> &str {
            "nan"
        }

        fn predict_next(&self, w: ArrayView2<'_, f64>) -> Result<Array1<f64>, PredictorError> {
            Ok(Array1::from_elem(w.ncols(), f64::NAN))
        }
    }

    struct Narrow;

    impl StepPredictor for Narrow {
        fn name(&self) -> &str {
            "narrow"
        }

        fn predict_next(&self, _: ArrayView2<'_, f64>) -> Result<Array1<f64>, PredictorError> {
            Ok(array![0.5])
        }
    }

    #[test]
    fn short_series_is_insufficient() {
        let err = SequenceForecaster::default()
            .forecast(&series(&[100.0; 59]), 5, &ForecastContext::new())
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::InsufficientData {
                required: 60,
                actual: 59
            }
        ));
    }

    #[test]
    fn no_predictor_falls_back() {
        let result = SequenceForecaster::default()
            .forecast(&series(&[100.0; 60]), 5, &ForecastContext::new())
            .unwrap();
        assert_eq!(result.len(), 5);
        assert!(result.is_degraded());
        assert!(result.closes().iter().all(|&c| c == 100.0));
    }

    #[test]
    fn failing_predictor_falls_back() {
        for model in [
            Box::new(Failing) as Box<dyn StepPredictor>,
            Box::new(NanOutput),
            Box::new(Narrow),
        ] {
            let s = series(&[100.0; 60]);
            let scaler = MinMaxScaler::fit(feature_matrix(s.bars(), &default_features()).view()).unwrap();
            let result = SequenceForecaster::default()
                .forecast_with(&s, 3, Some(model.as_ref()), &scaler)
                .unwrap();
            assert!(result.is_degraded(), "{} should fall back", model.name());
            assert_eq!(result.len(), 3);
        }
    }

    #[test]
    fn model_forecast_is_tagged_and_dated() {
        let closes: Vec<f64> = (0..80).map(|i| 100.0 + i as f64).collect();
        let s = series(&closes);
        let ctx = ForecastContext::with_predictor(std::sync::Arc::new(LinearTrendPredictor::new()));
        let result = SequenceForecaster::default().forecast(&s, 5, &ctx).unwrap();

        assert_eq!(result.len(), 5);
        assert_eq!(
            result.mode,
            ForecastMode::Model {
                name: "linear_trend".into(),
                version: "0".into()
            }
        );
        let last = s.last().unwrap().date;
        assert_eq!(result.as_of, last);
        assert!(result.points[0].date > last);
        assert!(result.points.windows(2).all(|w| w[0].date < w[1].date));
        // a straight line continues exactly
        for (i, p) in result.points.iter().enumerate() {
            assert!((p.predicted_close - (180.0 + i as f64)).abs() < 1e-6);
        }
    }

    #[test]
    fn confidence_decays_per_step() {
        let result = SequenceForecaster::default()
            .forecast(&series(&[100.0; 60]), 4, &ForecastContext::new())
            .unwrap();
        let conf: Vec<f64> = result.points.iter().map(|p| p.confidence).collect();
        assert!(conf.windows(2).all(|w| w[1] < w[0]));
        assert!((conf[0] - 0.5 * 0.9).abs() < 1e-12);
    }

    #[test]
    fn open_is_reported_when_tracked() {
        let result = SequenceForecaster::default()
            .forecast(&series(&[100.0; 60]), 2, &ForecastContext::new())
            .unwrap();
        assert!(result.points.iter().all(|p| p.predicted_open.is_some()));

        let close_only = SequenceForecaster::new(ForecastConfig {
            features: vec![PriceFeature::Close],
            ..ForecastConfig::default()
        });
        let result = close_only
            .forecast(&series(&[100.0; 60]), 2, &ForecastContext::new())
            .unwrap();
        assert!(result.points.iter().all(|p| p.predicted_open.is_none()));
    }

    #[test]
    fn zero_horizon_is_empty() {
        let result = SequenceForecaster::default()
            .forecast(&series(&[100.0; 60]), 0, &ForecastContext::new())
            .unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn config_validation() {
        assert!(ForecastConfig::default().validate().is_ok());
        let no_close = ForecastConfig {
            features: vec![PriceFeature::Open],
            ..ForecastConfig::default()
        };
        assert!(no_close.validate().is_err());
        let dup = ForecastConfig {
            features: vec![PriceFeature::Close, PriceFeature::Close],
            ..ForecastConfig::default()
        };
        assert!(dup.validate().is_err());
        let zero_window = ForecastConfig {
            window: 0,
            ..ForecastConfig::default()
        };
        assert!(zero_window.validate().is_err());
    }

    #[test]
    fn slide_drops_oldest_row() {
        let window = array![[1.0, 2.0], [3.0, 4.0]];
        let next = array![[5.0, 6.0]];
        let slid = slide(window.view(), next.view()).unwrap();
        assert_eq!(slid, array![[3.0, 4.0], [5.0, 6.0]]);
    }
}
