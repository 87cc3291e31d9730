//! Engine error taxonomy.
//!
//! Only structurally invalid input and short histories reach the caller.
//! A missing or failing step predictor is reported as `ModelUnavailable`
//! inside the forecaster and converted into the naive fallback there.

use thiserror::Error;

use crate::domain::SeriesError;

#[derive(Debug, Error)]
pub enum EngineError {
    /// History shorter than the forecast window. Recoverable by fetching
    /// a longer period.
    #[error("insufficient data: need at least {required} bars, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// Malformed timestamps or values. Not recoverable.
    #[error("invalid series: {0}")]
    InvalidSeries(#[from] SeriesError),

    /// The step predictor is missing or failed. Never escapes `forecast`.
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    /// Parameters that cannot describe a computation (zero window, etc).
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

impl EngineError {
    /// True for errors a caller can fix by requesting more history.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, EngineError::InsufficientData { .. })
    }
}
