//! Seeded random walk: last row plus a uniform step per feature.
//!
//! The step is drawn from an RNG seeded by the master seed and the window's
//! contents, so identical windows always produce identical predictions no
//! matter how many forecasts ran before.

use ndarray::{Array1, ArrayView2};
use rand::Rng;

use super::{require_rows, PredictorError, StepPredictor};
use crate::rng::RngHierarchy;

#[derive(Debug, Clone)]
pub struct RandomWalkPredictor {
    rng: RngHierarchy,
    max_step: f64,
}

impl RandomWalkPredictor {
    /// `max_step` is in scaled units; each feature moves by a draw from
    /// `[-max_step, max_step)`.
    pub fn new(seed: u64, max_step: f64) -> Self {
        Self {
            rng: RngHierarchy::new(seed),
            max_step: max_step.abs(),
        }
    }

    pub fn seed(&self) -> u64 {
        self.rng.master_seed()
    }
}

impl StepPredictor for RandomWalkPredictor {
    fn name(&self) -> &str {
        "random_walk"
    }

    fn predict_next(&self, window: ArrayView2<'_, f64>) -> Result<Array1<f64>, PredictorError> {
        require_rows(&window, 1)?;
        let payload: Vec<u8> = window.iter().flat_map(|v| v.to_le_bytes()).collect();
        let mut rng = self.rng.rng_for("random_walk", &payload);

        let last = window.row(window.nrows() - 1);
        Ok(last
            .iter()
            .map(|&v| {
                if self.max_step == 0.0 {
                    v
                } else {
                    v + rng.gen_range(-self.max_step..self.max_step)
                }
            })
            .collect())
    }
}
