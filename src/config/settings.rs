//! Global key-value settings store
//!
//! A flat JSON object on disk. Values are held in memory; `set` only touches
//! memory and `write` persists the whole object.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::constants::{realtime, settings};

#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    values: Map<String, Value>,
}

impl SettingsStore {
    /// Load settings from `path`. A missing or malformed file yields an empty
    /// store; the file is rewritten on the next `write`.
    pub fn load(path: PathBuf) -> Self {
        let values = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<Map<String, Value>>(&contents) {
                Ok(values) => values,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Malformed settings file, using defaults");
                    Map::new()
                }
            },
            Err(_) => Map::new(),
        };
        Self { path, values }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Typed read; values of the wrong shape read as `None`
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.values
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.get_as::<bool>(key).unwrap_or(false)
    }

    pub fn set(&mut self, key: &str, value: impl Serialize) -> Result<()> {
        let value = serde_json::to_value(value)
            .with_context(|| format!("Failed to serialize setting {key}"))?;
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    /// Persist every setting
    pub fn write(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create settings directory {:?}", parent))?;
        }
        let json = serde_json::to_string_pretty(&self.values)
            .context("Failed to serialize settings to JSON")?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write settings to {:?}", self.path))?;
        info!(path = %self.path.display(), "Saved settings");
        Ok(())
    }

    pub fn auto_detect_enabled(&self) -> bool {
        self.get_bool(settings::AUTO_DETECT_SYSTEM_PARAMS)
    }

    pub fn realtime_enabled(&self) -> bool {
        self.get_bool(settings::APPLY_OVERRIDES_REALTIME)
    }

    /// Debounce window for realtime apply, clamped to a sane range
    pub fn realtime_debounce_ms(&self) -> u64 {
        match self.get_as::<u64>(settings::REALTIME_DEBOUNCE_MS) {
            Some(ms) if ms > realtime::MAX_DEBOUNCE_MS => {
                warn!(debounce_ms = ms, max = realtime::MAX_DEBOUNCE_MS, "realtime debounce exceeds maximum, clamping");
                realtime::MAX_DEBOUNCE_MS
            }
            Some(ms) => ms,
            None => realtime::DEFAULT_DEBOUNCE_MS,
        }
    }
}
