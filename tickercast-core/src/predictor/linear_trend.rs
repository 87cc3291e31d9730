//! Per-feature least-squares line, extrapolated one step.

use ndarray::{Array1, ArrayView1, ArrayView2, Axis};

use super::{require_rows, PredictorError, StepPredictor};

/// Fits `y = a + b*t` to each feature column of the window and returns the
/// line's value at the next time index.
#[derive(Debug, Clone, Default)]
pub struct LinearTrendPredictor {
    span: Option<usize>,
}

impl LinearTrendPredictor {
    /// Fit over the whole window.
    pub fn new() -> Self {
        Self { span: None }
    }

    /// Fit over only the most recent `span` rows.
    pub fn with_span(span: usize) -> Self {
        Self {
            span: Some(span.max(1)),
        }
    }
}

impl StepPredictor for LinearTrendPredictor {
    fn name(&self) -> &str {
        "linear_trend"
    }

    fn predict_next(&self, window: ArrayView2<'_, f64>) -> Result<Array1<f64>, PredictorError> {
        require_rows(&window, 1)?;
        let rows = window.nrows();
        let start = self.span.map_or(0, |s| rows.saturating_sub(s));
        let recent = window.slice_axis(Axis(0), (start..rows).into());

        Ok(recent
            .axis_iter(Axis(1))
            .map(extrapolate_column)
            .collect())
    }
}

fn extrapolate_column(column: ArrayView1<'_, f64>) -> f64 {
    let n = column.len() as f64;
    let sum_t: f64 = (0..column.len()).map(|i| i as f64).sum();
    let sum_t2: f64 = (0..column.len()).map(|i| (i * i) as f64).sum();
    let sum_y: f64 = column.sum();
    let sum_ty: f64 = column.iter().enumerate().map(|(i, &y)| i as f64 * y).sum();

    let denominator = n * sum_t2 - sum_t * sum_t;
    if denominator.abs() < 1e-12 {
        // single row: no slope to extrapolate
        return sum_y / n;
    }

    let slope = (n * sum_ty - sum_t * sum_y) / denominator;
    let intercept = (sum_y - slope * sum_t) / n;
    intercept + slope * n
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn extrapolates_a_straight_line() {
        let window = array![[0.0, 1.0], [0.1, 0.9], [0.2, 0.8], [0.3, 0.7]];
        let next = LinearTrendPredictor::new().predict_next(window.view()).unwrap();
        assert!((next[0] - 0.4).abs() < 1e-12);
        assert!((next[1] - 0.6).abs() < 1e-12);
    }

    #[test]
    fn flat_window_stays_flat() {
        let window = array![[0.5], [0.5], [0.5]];
        let next = LinearTrendPredictor::new().predict_next(window.view()).unwrap();
        assert_eq!(next[0], 0.5);
    }

    #[test]
    fn single_row_repeats_itself() {
        let window = array![[0.25, 0.75]];
        let next = LinearTrendPredictor::new().predict_next(window.view()).unwrap();
        assert_eq!(next.to_vec(), vec![0.25, 0.75]);
    }

    #[test]
    fn span_limits_the_fit() {
        // old rows slope down, recent rows slope up
        let window = array![[1.0], [0.5], [0.0], [0.1], [0.2]];
        let next = LinearTrendPredictor::with_span(3)
            .predict_next(window.view())
            .unwrap();
        assert!((next[0] - 0.3).abs() < 1e-12);
    }

    #[test]
    fn empty_window_is_an_error() {
        let window = ndarray::Array2::<f64>::zeros((0, 2));
        assert!(LinearTrendPredictor::new().predict_next(window.view()).is_err());
    }
}
