//! Step-ahead predictors.
//!
//! A `StepPredictor` sees a scaled `[window, features]` matrix and returns
//! the scaled next row. The forecaster drives it recursively; any error,
//! wrong output width, or non-finite value sends the forecast to the naive
//! fallback.

pub mod autoregressive;
pub mod linear_trend;
pub mod random_walk;

pub use autoregressive::AutoregressivePredictor;
pub use linear_trend::LinearTrendPredictor;
pub use random_walk::RandomWalkPredictor;

use ndarray::{Array1, ArrayView2};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PredictorError {
    #[error("window has {actual} feature columns, model expects {expected}")]
    FeatureMismatch { expected: usize, actual: usize },

    #[error("window has {actual} rows, model needs at least {required}")]
    WindowTooShort { required: usize, actual: usize },

    #[error("cannot fit model: {0}")]
    Fit(String),

    #[error("prediction failed: {0}")]
    Failed(String),
}

/// Pluggable one-step regressor over a scaled feature window.
pub trait StepPredictor: Send + Sync {
    /// Short identifier (e.g., "ar_5", "linear_trend").
    fn name(&self) -> &str;

    /// Version of the trained parameters. Untrained predictors report "0".
    fn version(&self) -> &str {
        "0"
    }

    /// Predict the next scaled feature row from `window` (rows oldest first).
    fn predict_next(&self, window: ArrayView2<'_, f64>) -> Result<Array1<f64>, PredictorError>;
}

impl<P: StepPredictor + ?Sized> StepPredictor for std::sync::Arc<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn version(&self) -> &str {
        (**self).version()
    }

    fn predict_next(&self, window: ArrayView2<'_, f64>) -> Result<Array1<f64>, PredictorError> {
        (**self).predict_next(window)
    }
}

fn require_rows(window: &ArrayView2<'_, f64>, required: usize) -> Result<(), PredictorError> {
    if window.nrows() < required {
        return Err(PredictorError::WindowTooShort {
            required,
            actual: window.nrows(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    struct Constant;

    impl StepPredictor for Constant {
        fn name(&self) -> &str {
            "constant"
        }

        fn predict_next(&self, window: ArrayView2<'_, f64>) -> Result<Array1<f64>, PredictorError> {
            Ok(Array1::from_elem(window.ncols(), 0.5))
        }
    }

    #[test]
    fn default_version_is_zero() {
        assert_eq!(Constant.version(), "0");
    }

    #[test]
    fn arc_forwards_to_inner() {
        let shared: std::sync::Arc<dyn StepPredictor> = std::sync::Arc::new(Constant);
        let window = array![[0.1, 0.2], [0.3, 0.4]];
        let next = shared.predict_next(window.view()).unwrap();
        assert_eq!(next.len(), 2);
        assert_eq!(shared.name(), "constant");
    }

    #[test]
    fn require_rows_reports_shortfall() {
        let window = array![[0.1], [0.2]];
        assert_eq!(
            require_rows(&window.view(), 3),
            Err(PredictorError::WindowTooShort {
                required: 3,
                actual: 2
            })
        );
        assert!(require_rows(&window.view(), 2).is_ok());
    }
}
