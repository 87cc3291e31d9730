//! Per-feature min-max scaling into [0, 1].
//!
//! A column whose fitted range is zero scales to 0.0 and inverts back to
//! its constant value.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    min: Vec<f64>,
    max: Vec<f64>,
}

impl MinMaxScaler {
    /// Fit column ranges over `data` (rows = observations).
    pub fn fit(data: ArrayView2<'_, f64>) -> Result<Self, EngineError> {
        if data.nrows() == 0 || data.ncols() == 0 {
            return Err(EngineError::InvalidParameter {
                name: "scaler",
                reason: format!("cannot fit on a {}x{} matrix", data.nrows(), data.ncols()),
            });
        }
        if data.iter().any(|v| !v.is_finite()) {
            return Err(EngineError::InvalidParameter {
                name: "scaler",
                reason: "fit data contains non-finite values".into(),
            });
        }

        let min = data
            .axis_iter(Axis(1))
            .map(|c| c.iter().copied().fold(f64::INFINITY, f64::min))
            .collect();
        let max = data
            .axis_iter(Axis(1))
            .map(|c| c.iter().copied().fold(f64::NEG_INFINITY, f64::max))
            .collect();
        Ok(Self { min, max })
    }

    pub fn features(&self) -> usize {
        self.min.len()
    }

    pub fn min(&self) -> &[f64] {
        &self.min
    }

    pub fn max(&self) -> &[f64] {
        &self.max
    }

    pub fn transform(&self, data: ArrayView2<'_, f64>) -> Result<Array2<f64>, EngineError> {
        self.check_width(data.ncols())?;
        let mut out = data.to_owned();
        for (j, mut column) in out.axis_iter_mut(Axis(1)).enumerate() {
            let (lo, range) = (self.min[j], self.max[j] - self.min[j]);
            column.mapv_inplace(|x| if range == 0.0 { 0.0 } else { (x - lo) / range });
        }
        Ok(out)
    }

    pub fn inverse_transform(&self, data: ArrayView2<'_, f64>) -> Result<Array2<f64>, EngineError> {
        self.check_width(data.ncols())?;
        let mut out = data.to_owned();
        for (j, mut column) in out.axis_iter_mut(Axis(1)).enumerate() {
            let (lo, range) = (self.min[j], self.max[j] - self.min[j]);
            column.mapv_inplace(|x| x * range + lo);
        }
        Ok(out)
    }

    /// Inverse-scale a single feature row.
    pub fn inverse_row(&self, row: ArrayView1<'_, f64>) -> Result<Array1<f64>, EngineError> {
        self.check_width(row.len())?;
        Ok(row
            .iter()
            .enumerate()
            .map(|(j, &x)| x * (self.max[j] - self.min[j]) + self.min[j])
            .collect())
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    fn check_width(&self, width: usize) -> Result<(), EngineError> {
        if width != self.features() {
            return Err(EngineError::InvalidParameter {
                name: "scaler",
                reason: format!(
                    "fitted on {} features, given {width}",
                    self.features()
                ),
            });
        }
        Ok(())
    }
}
