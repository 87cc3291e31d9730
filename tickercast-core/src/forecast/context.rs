//! Forecast context: the current step predictor and per-series scalers.
//!
//! Readers take an `Arc` snapshot; installs swap the slot under a short
//! write lock. A forecast keeps the snapshot it started with even if a new
//! model is installed mid-flight.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info};

use super::scaler::MinMaxScaler;
use crate::error::EngineError;
use crate::predictor::StepPredictor;

#[derive(Default)]
pub struct ForecastContext {
    predictor: RwLock<Option<Arc<dyn StepPredictor>>>,
    scalers: RwLock<HashMap<String, Arc<MinMaxScaler>>>,
}

impl ForecastContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_predictor(predictor: Arc<dyn StepPredictor>) -> Self {
        let ctx = Self::new();
        ctx.install_predictor(Some(predictor));
        ctx
    }

    /// Current predictor snapshot, if any.
    pub fn predictor(&self) -> Option<Arc<dyn StepPredictor>> {
        self.predictor
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the predictor; returns the previous one. `None` clears it,
    /// sending later forecasts to the naive fallback.
    pub fn install_predictor(
        &self,
        predictor: Option<Arc<dyn StepPredictor>>,
    ) -> Option<Arc<dyn StepPredictor>> {
        if let Some(p) = &predictor {
            info!(name = p.name(), version = p.version(), "installing step predictor");
        }
        let mut slot = self.predictor.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *slot, predictor)
    }

    pub fn scaler(&self, key: &str) -> Option<Arc<MinMaxScaler>> {
        self.scalers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Register (or replace) the scaler for `key`.
    pub fn install_scaler(&self, key: impl Into<String>, scaler: MinMaxScaler) -> Option<Arc<MinMaxScaler>> {
        self.scalers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), Arc::new(scaler))
    }

    /// Scaler for `key`, fitting it with `fit` on first use only.
    ///
    /// Once registered, a key's scaler is never refit implicitly.
    pub fn scaler_or_fit<F>(&self, key: &str, fit: F) -> Result<Arc<MinMaxScaler>, EngineError>
    where
        F: FnOnce() -> Result<MinMaxScaler, EngineError>,
    {
        if let Some(existing) = self.scaler(key) {
            return Ok(existing);
        }

        let mut scalers = self.scalers.write().unwrap_or_else(PoisonError::into_inner);
        // another thread may have fitted it between the two locks
        if let Some(existing) = scalers.get(key) {
            return Ok(Arc::clone(existing));
        }
        let scaler = Arc::new(fit()?);
        debug!(key, features = scaler.features(), "fitted scaler");
        scalers.insert(key.to_string(), Arc::clone(&scaler));
        Ok(scaler)
    }

    pub fn scaler_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .scalers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        keys.sort();
        keys
    }
}

impl std::fmt::Debug for ForecastContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let predictor = self.predictor().map(|p| format!("{}@{}", p.name(), p.version()));
        f.debug_struct("ForecastContext")
            .field("predictor", &predictor)
            .field("scalers", &self.scaler_keys())
            .finish()
    }
}
