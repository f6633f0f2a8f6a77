//! Per-rice override store

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::engine::store::OverrideValue;
use crate::types::HotkeyOverride;

/// Overrides one rice keeps for itself
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScopeOverrides {
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    #[serde(default)]
    pub hotkeys: BTreeMap<String, HotkeyOverride>,
}

impl ScopeOverrides {
    /// Copy with comments stripped and empty entries removed
    pub fn normalized(&self) -> Self {
        Self {
            params: normalize_map(&self.params),
            hotkeys: normalize_map(&self.hotkeys),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty() && self.hotkeys.is_empty()
    }
}

fn normalize_map<V: OverrideValue>(map: &BTreeMap<String, V>) -> BTreeMap<String, V> {
    map.iter()
        .filter_map(|(k, v)| v.normalized().map(|v| (k.clone(), v)))
        .collect()
}

pub fn load(path: &Path) -> ScopeOverrides {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "No overrides for rice");
            return ScopeOverrides::default();
        }
    };
    match serde_json::from_str::<ScopeOverrides>(&contents) {
        Ok(overrides) => overrides.normalized(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Malformed rice overrides, ignoring");
            ScopeOverrides::default()
        }
    }
}

pub fn save(path: &Path, overrides: &ScopeOverrides) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create rice directory {:?}", parent))?;
    }
    let json = serde_json::to_string_pretty(&overrides.normalized())
        .context("Failed to serialize rice overrides")?;
    fs::write(path, json).with_context(|| format!("Failed to write rice overrides to {:?}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_round_trip_drops_empty_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nord").join("overrides.json");

        let overrides = ScopeOverrides {
            params: BTreeMap::from([
                ("general:gaps_in".to_string(), "10 # wider".to_string()),
                ("general:gaps_out".to_string(), String::new()),
                ("decoration:rounding".to_string(), "8".to_string()),
            ]),
            hotkeys: BTreeMap::from([(
                "terminal".to_string(),
                HotkeyOverride::new("terminal", &["SUPER"], "Return", "exec", "foot"),
            )]),
        };
        save(&path, &overrides).unwrap();

        let loaded = load(&path);
        assert_eq!(
            loaded.params,
            BTreeMap::from([
                ("decoration:rounding".to_string(), "8".to_string()),
                ("general:gaps_in".to_string(), "10".to_string()),
            ])
        );
        assert_eq!(loaded.hotkeys["terminal"].args, "foot");
    }

    #[test]
    fn test_missing_and_malformed_read_empty() {
        let dir = TempDir::new().unwrap();
        assert!(load(&dir.path().join("missing.json")).is_empty());

        let path = dir.path().join("bad.json");
        fs::write(&path, "{\"params\": 3}").unwrap();
        assert!(load(&path).is_empty());
    }
}
