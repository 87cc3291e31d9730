//! Forecast memoization keyed by (ticker, as-of date, horizon).
//!
//! Forecasts for a ticker only change when a new bar arrives, so one entry
//! per trading day is enough. Entries live in memory and, when a directory
//! is given, are mirrored there as one JSON file per key.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use tickercast_core::ForecastResult;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cache entry {}: {source}", path.display())]
    Serde {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub ticker: String,
    pub as_of: NaiveDate,
    pub horizon: usize,
}

impl CacheKey {
    pub fn new(ticker: impl Into<String>, as_of: NaiveDate, horizon: usize) -> Self {
        Self {
            ticker: ticker.into(),
            as_of,
            horizon,
        }
    }

    /// Hex BLAKE3 digest, used as the on-disk file stem.
    pub fn digest(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.ticker.as_bytes());
        hasher.update(self.as_of.to_string().as_bytes());
        hasher.update(&(self.horizon as u64).to_le_bytes());
        hasher.finalize().to_hex().to_string()
    }
}

#[derive(Serialize, Deserialize)]
struct Entry {
    key: CacheKey,
    forecast: ForecastResult,
}

#[derive(Debug, Default)]
pub struct ForecastCache {
    entries: RwLock<HashMap<CacheKey, ForecastResult>>,
    dir: Option<PathBuf>,
}

impl ForecastCache {
    /// Memory-only cache.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Cache mirrored to `dir`, created if missing.
    pub fn persistent(dir: impl AsRef<Path>) -> Result<Self, CacheError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|source| CacheError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self {
            entries: RwLock::default(),
            dir: Some(dir),
        })
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.read_entries().contains_key(key) || self.entry_path(key).is_some_and(|p| p.exists())
    }

    /// Cached forecast, loading from disk into memory on first access.
    pub fn get(&self, key: &CacheKey) -> Result<Option<ForecastResult>, CacheError> {
        if let Some(hit) = self.read_entries().get(key) {
            return Ok(Some(hit.clone()));
        }
        let Some(path) = self.entry_path(key) else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&path).map_err(|source| CacheError::Io {
            path: path.clone(),
            source,
        })?;
        let entry: Entry =
            serde_json::from_str(&json).map_err(|source| CacheError::Serde { path, source })?;
        // digest collision or a hand-edited file
        if entry.key != *key {
            return Ok(None);
        }
        debug!(ticker = %key.ticker, as_of = %key.as_of, "forecast cache hit on disk");
        self.write_entries()
            .insert(key.clone(), entry.forecast.clone());
        Ok(Some(entry.forecast))
    }

    pub fn put(&self, key: CacheKey, forecast: ForecastResult) -> Result<(), CacheError> {
        if let Some(path) = self.entry_path(&key) {
            let entry = Entry {
                key: key.clone(),
                forecast: forecast.clone(),
            };
            let json = serde_json::to_string_pretty(&entry).map_err(|source| CacheError::Serde {
                path: path.clone(),
                source,
            })?;
            fs::write(&path, json).map_err(|source| CacheError::Io { path, source })?;
        }
        self.write_entries().insert(key, forecast);
        Ok(())
    }

    pub fn remove(&self, key: &CacheKey) -> Result<(), CacheError> {
        self.write_entries().remove(key);
        if let Some(path) = self.entry_path(key) {
            if path.exists() {
                fs::remove_file(&path).map_err(|source| CacheError::Io { path, source })?;
            }
        }
        Ok(())
    }

    /// Drop every entry, in memory and on disk.
    pub fn clear(&self) -> Result<(), CacheError> {
        self.write_entries().clear();
        if let Some(dir) = &self.dir {
            let read = fs::read_dir(dir).map_err(|source| CacheError::Io {
                path: dir.clone(),
                source,
            })?;
            for entry in read.flatten() {
                let path = entry.path();
                if path.extension().is_some_and(|ext| ext == "json") {
                    fs::remove_file(&path).map_err(|source| CacheError::Io { path, source })?;
                }
            }
        }
        Ok(())
    }

    /// Entries currently held in memory.
    pub fn len(&self) -> usize {
        self.read_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entry_path(&self, key: &CacheKey) -> Option<PathBuf> {
        self.dir
            .as_ref()
            .map(|dir| dir.join(format!("{}.json", key.digest())))
    }

    fn read_entries(&self) -> std::sync::RwLockReadGuard<'_, HashMap<CacheKey, ForecastResult>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_entries(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<CacheKey, ForecastResult>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}
