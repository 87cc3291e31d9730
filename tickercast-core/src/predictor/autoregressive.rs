//! Per-feature AR(p) on first differences, fitted with Yule-Walker.
//!
//! For each feature column the model keeps a mean step (drift) and `p`
//! coefficients over the centered differences:
//!
//! d_next = drift + sum_k phi_k * (d_{t+1-k} - drift)
//! x_next = x_t + d_next
//!
//! Coefficients come from Levinson-Durbin over the sample autocovariance.
//! Fitting happens out-of-band on scaled training history; the fitted
//! model is plain data and serializes with serde.

use ndarray::{Array1, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use super::{require_rows, PredictorError, StepPredictor};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoregressivePredictor {
    order: usize,
    version: String,
    drift: Vec<f64>,
    /// One coefficient vector per feature column, lag 1 first.
    coefficients: Vec<Vec<f64>>,
}

impl AutoregressivePredictor {
    /// Fit an AR(`order`) model to each column of `training`
    /// (rows oldest first, already scaled).
    pub fn fit(
        training: ArrayView2<'_, f64>,
        order: usize,
        version: impl Into<String>,
    ) -> Result<Self, PredictorError> {
        if order == 0 {
            return Err(PredictorError::Fit("order must be >= 1".into()));
        }
        if training.ncols() == 0 {
            return Err(PredictorError::Fit("no feature columns".into()));
        }
        // order + 1 differences at minimum
        let required = order + 2;
        if training.nrows() < required {
            return Err(PredictorError::Fit(format!(
                "need at least {required} training rows for order {order}, got {}",
                training.nrows()
            )));
        }
        if training.iter().any(|v| !v.is_finite()) {
            return Err(PredictorError::Fit("training data contains non-finite values".into()));
        }

        let mut drift = Vec::with_capacity(training.ncols());
        let mut coefficients = Vec::with_capacity(training.ncols());
        for column in training.axis_iter(Axis(1)) {
            let diffs = differences(column);
            let mean = diffs.iter().sum::<f64>() / diffs.len() as f64;
            let centered: Vec<f64> = diffs.iter().map(|d| d - mean).collect();
            drift.push(mean);
            coefficients.push(levinson_durbin(&autocovariance(&centered, order), order));
        }

        Ok(Self {
            order,
            version: version.into(),
            drift,
            coefficients,
        })
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn features(&self) -> usize {
        self.drift.len()
    }

    pub fn drift(&self) -> &[f64] {
        &self.drift
    }

    pub fn coefficients(&self) -> &[Vec<f64>] {
        &self.coefficients
    }
}

impl StepPredictor for AutoregressivePredictor {
    fn name(&self) -> &str {
        "autoregressive"
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn predict_next(&self, window: ArrayView2<'_, f64>) -> Result<Array1<f64>, PredictorError> {
        if window.ncols() != self.features() {
            return Err(PredictorError::FeatureMismatch {
                expected: self.features(),
                actual: window.ncols(),
            });
        }
        require_rows(&window, self.order + 1)?;

        let next = window
            .axis_iter(Axis(1))
            .zip(self.drift.iter().zip(&self.coefficients))
            .map(|(column, (&drift, phi))| {
                let diffs = differences(column);
                let last = column[column.len() - 1];
                let step = drift
                    + phi
                        .iter()
                        .zip(diffs.iter().rev())
                        .map(|(p, d)| p * (d - drift))
                        .sum::<f64>();
                last + step
            })
            .collect();
        Ok(next)
    }
}

fn differences(column: ArrayView1<'_, f64>) -> Vec<f64> {
    column
        .iter()
        .zip(column.iter().skip(1))
        .map(|(prev, next)| next - prev)
        .collect()
}

/// Biased sample autocovariance at lags 0..=max_lag.
fn autocovariance(centered: &[f64], max_lag: usize) -> Vec<f64> {
    let n = centered.len();
    (0..=max_lag)
        .map(|k| {
            if k >= n {
                return 0.0;
            }
            (k..n).map(|i| centered[i] * centered[i - k]).sum::<f64>() / n as f64
        })
        .collect()
}

/// Solve the Yule-Walker equations for `order` coefficients.
///
/// A degenerate (zero-variance) series yields all-zero coefficients.
fn levinson_durbin(gamma: &[f64], order: usize) -> Vec<f64> {
    let mut phi = vec![0.0; order];
    let mut error = gamma[0];
    if error.abs() < 1e-14 {
        return phi;
    }

    for k in 0..order {
        let mut acc = gamma[k + 1];
        for j in 0..k {
            acc -= phi[j] * gamma[k - j];
        }
        let reflection = acc / error;
        let previous = phi.clone();
        phi[k] = reflection;
        for j in 0..k {
            phi[j] = previous[j] - reflection * previous[k - 1 - j];
        }
        error *= 1.0 - reflection * reflection;
        if error.abs() < 1e-14 {
            break;
        }
    }
    phi
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;
    use rand::{Rng, SeedableRng};

    fn column_matrix(values: &[f64]) -> Array2<f64> {
        Array2::from_shape_vec((values.len(), 1), values.to_vec()).unwrap()
    }

    #[test]
    fn constant_step_is_pure_drift() {
        let values: Vec<f64> = (0..50).map(|i| i as f64 * 0.01).collect();
        let model = AutoregressivePredictor::fit(column_matrix(&values).view(), 3, "t").unwrap();
        assert!(model.coefficients()[0].iter().all(|&c| c == 0.0));

        let window = column_matrix(&values[40..]);
        let next = model.predict_next(window.view()).unwrap();
        assert!((next[0] - 0.50).abs() < 1e-12, "next={}", next[0]);
    }

    #[test]
    fn recovers_ar1_coefficient() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let mut level = 0.0;
        let mut step = 0.0;
        let mut values = Vec::with_capacity(2000);
        for _ in 0..2000 {
            step = 0.5 * step + rng.gen_range(-1.0..1.0);
            level += step;
            values.push(level);
        }
        let model = AutoregressivePredictor::fit(column_matrix(&values).view(), 1, "t").unwrap();
        let phi = model.coefficients()[0][0];
        assert!((phi - 0.5).abs() < 0.1, "phi={phi}");
    }

    #[test]
    fn rejects_short_training_history() {
        let err = AutoregressivePredictor::fit(column_matrix(&[0.1, 0.2, 0.3]).view(), 2, "t");
        assert!(matches!(err, Err(PredictorError::Fit(_))));
    }

    #[test]
    fn rejects_non_finite_training_data() {
        let err = AutoregressivePredictor::fit(column_matrix(&[0.1, f64::NAN, 0.3, 0.4]).view(), 1, "t");
        assert!(err.is_err());
    }

    #[test]
    fn feature_mismatch_is_reported() {
        let values: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let model = AutoregressivePredictor::fit(column_matrix(&values).view(), 1, "t").unwrap();
        let wide = Array2::<f64>::zeros((5, 2));
        assert_eq!(
            model.predict_next(wide.view()),
            Err(PredictorError::FeatureMismatch {
                expected: 1,
                actual: 2
            })
        );
    }

    #[test]
    fn window_must_cover_the_order() {
        let values: Vec<f64> = (0..20).map(|i| (i as f64).sin()).collect();
        let model = AutoregressivePredictor::fit(column_matrix(&values).view(), 4, "t").unwrap();
        let short = column_matrix(&values[..4]);
        assert!(matches!(
            model.predict_next(short.view()),
            Err(PredictorError::WindowTooShort { required: 5, .. })
        ));
    }

    #[test]
    fn serde_round_trip_preserves_predictions() {
        let values: Vec<f64> = (0..60).map(|i| (i as f64 * 0.2).sin() + i as f64 * 0.01).collect();
        let model = AutoregressivePredictor::fit(column_matrix(&values).view(), 2, "v1").unwrap();
        let json = serde_json::to_string(&model).unwrap();
        let restored: AutoregressivePredictor = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.order(), 2);
        assert_eq!(restored.version(), "v1");

        let window = column_matrix(&values[50..]);
        let a = model.predict_next(window.view()).unwrap();
        let b = restored.predict_next(window.view()).unwrap();
        assert!((a[0] - b[0]).abs() < 1e-12);
    }
}
