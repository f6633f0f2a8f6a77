//! Recommendations file
//!
//! Holds which recommendations the user enabled plus the payload of each
//! enabled one. The file moved from the config dir to the data dir; the
//! legacy copy is migrated on first read.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::types::HotkeyOverride;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationsFile {
    /// Recommendation id -> enabled
    #[serde(default)]
    pub state: BTreeMap<String, bool>,
    #[serde(default)]
    pub extra_lines: Vec<String>,
    #[serde(default)]
    pub hotkeys: BTreeMap<String, HotkeyOverride>,
    #[serde(default)]
    pub param_overrides: BTreeMap<String, String>,
}

impl RecommendationsFile {
    pub fn is_enabled(&self, id: &str) -> bool {
        self.state.get(id).copied().unwrap_or(false)
    }

    /// Copy holding only entries whose recommendation is enabled.
    /// Hotkeys must additionally be flagged global and recommended.
    pub fn enabled_only(&self) -> Self {
        Self {
            state: self.state.clone(),
            extra_lines: self
                .extra_lines
                .iter()
                .filter(|line| self.is_enabled(line))
                .cloned()
                .collect(),
            hotkeys: self
                .hotkeys
                .iter()
                .filter(|(id, hk)| self.is_enabled(id) && hk.is_global && hk.is_recommended)
                .map(|(id, hk)| (id.clone(), hk.clone()))
                .collect(),
            param_overrides: self
                .param_overrides
                .iter()
                .filter(|(path, _)| self.is_enabled(path))
                .map(|(path, value)| (path.clone(), value.clone()))
                .collect(),
        }
    }
}

/// Move the legacy file to its new location, once.
/// Returns true when a migration happened.
pub fn migrate_legacy(legacy: &Path, current: &Path) -> Result<bool> {
    if current.exists() || !legacy.exists() {
        return Ok(false);
    }
    if let Some(parent) = current.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }
    fs::copy(legacy, current)
        .with_context(|| format!("Failed to copy {:?} to {:?}", legacy, current))?;
    fs::remove_file(legacy)
        .with_context(|| format!("Failed to remove legacy file {:?}", legacy))?;
    info!(from = %legacy.display(), to = %current.display(), "Migrated recommendations file");
    Ok(true)
}

/// Read the recommendations file, migrating the legacy location first.
/// Missing or malformed files read as empty.
pub fn load(current: &Path, legacy: &Path) -> RecommendationsFile {
    if let Err(e) = migrate_legacy(legacy, current) {
        warn!(error = ?e, "Recommendations migration failed");
    }

    let contents = match fs::read_to_string(current) {
        Ok(contents) => contents,
        Err(e) => {
            debug!(path = %current.display(), error = %e, "No recommendations file");
            return RecommendationsFile::default();
        }
    };

    serde_json::from_str(&contents).unwrap_or_else(|e| {
        warn!(path = %current.display(), error = %e, "Malformed recommendations file, resetting");
        RecommendationsFile::default()
    })
}

/// Write enabled entries only
pub fn save(path: &Path, file: &RecommendationsFile) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }
    let json = serde_json::to_string_pretty(&file.enabled_only())
        .context("Failed to serialize recommendations")?;
    fs::write(path, json).with_context(|| format!("Failed to write {:?}", path))?;
    Ok(())
}

/// What enabling a recommendation adds
#[derive(Debug, Clone, PartialEq)]
pub enum RecommendationKind {
    Param { path: String, value: String },
    Hotkey(HotkeyOverride),
    ExtraLine(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub title: String,
    pub kind: RecommendationKind,
}

impl Recommendation {
    /// Params are identified by path, hotkeys by id, lines by their text
    pub fn id(&self) -> &str {
        match &self.kind {
            RecommendationKind::Param { path, .. } => path,
            RecommendationKind::Hotkey(hotkey) => &hotkey.id,
            RecommendationKind::ExtraLine(line) => line,
        }
    }
}

pub fn builtin() -> Vec<Recommendation> {
    let hotkey = |id: &str, mods: &[&str], key: &str, dispatcher: &str, args: &str| {
        let mut hotkey = HotkeyOverride::new(id, mods, key, dispatcher, args);
        hotkey.is_global = true;
        hotkey.is_recommended = true;
        hotkey.timestamp = 0;
        RecommendationKind::Hotkey(hotkey)
    };
    let param = |path: &str, value: &str| RecommendationKind::Param {
        path: path.to_string(),
        value: value.to_string(),
    };

    vec![
        Recommendation {
            title: "Enable numlock on login".to_string(),
            kind: param("input:numlock_by_default", "true"),
        },
        Recommendation {
            title: "Hide the default wallpaper logo".to_string(),
            kind: param("misc:disable_hyprland_logo", "true"),
        },
        Recommendation {
            title: "Crisp XWayland apps on scaled monitors".to_string(),
            kind: param("xwayland:force_zero_scaling", "true"),
        },
        Recommendation {
            title: "Show keybindings with SUPER+/".to_string(),
            kind: hotkey("shortcuts", &["SUPER"], "slash", "exec", "hyprrice keybinds"),
        },
        Recommendation {
            title: "Region screenshot with Print".to_string(),
            kind: hotkey("screenshot", &[], "Print", "exec", "grim -g \"$(slurp)\" - | wl-copy"),
        },
        Recommendation {
            title: "Float file pickers".to_string(),
            kind: RecommendationKind::ExtraLine(
                "windowrulev2 = float, title:^(Open File)(.*)$".to_string(),
            ),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> RecommendationsFile {
        let mut hotkey = HotkeyOverride::new("screenshot", &[], "Print", "exec", "grim");
        hotkey.is_global = true;
        hotkey.is_recommended = true;
        let mut unflagged = HotkeyOverride::new("terminal", &["SUPER"], "Return", "exec", "kitty");
        unflagged.is_global = true;

        RecommendationsFile {
            state: BTreeMap::from([
                ("screenshot".to_string(), true),
                ("terminal".to_string(), true),
                ("input:numlock_by_default".to_string(), false),
                ("misc:vfr".to_string(), true),
                ("env = A,B".to_string(), true),
            ]),
            extra_lines: vec!["env = A,B".to_string(), "env = C,D".to_string()],
            hotkeys: BTreeMap::from([
                ("screenshot".to_string(), hotkey),
                ("terminal".to_string(), unflagged),
            ]),
            param_overrides: BTreeMap::from([
                ("input:numlock_by_default".to_string(), "true".to_string()),
                ("misc:vfr".to_string(), "false".to_string()),
            ]),
        }
    }

    #[test]
    fn test_enabled_only_filters_disabled_entries() {
        let filtered = sample().enabled_only();
        assert_eq!(filtered.extra_lines, vec!["env = A,B".to_string()]);
        assert_eq!(filtered.hotkeys.keys().collect::<Vec<_>>(), vec!["screenshot"]);
        assert_eq!(filtered.param_overrides.keys().collect::<Vec<_>>(), vec!["misc:vfr"]);
        assert_eq!(filtered.state.len(), 5);
    }

    #[test]
    fn test_json_field_names() {
        let json = serde_json::to_value(sample().enabled_only()).unwrap();
        assert!(json.get("extraLines").is_some());
        assert!(json.get("paramOverrides").is_some());
        assert_eq!(json["hotkeys"]["screenshot"]["isRecommended"], true);
    }

    #[test]
    fn test_migration_moves_legacy_once() {
        let dir = TempDir::new().unwrap();
        let legacy = dir.path().join("config").join("recommendations.json");
        let current = dir.path().join("data").join("recommendations.json");
        fs::create_dir_all(legacy.parent().unwrap()).unwrap();
        let contents = serde_json::to_string_pretty(&sample()).unwrap();
        fs::write(&legacy, &contents).unwrap();

        let loaded = load(&current, &legacy);
        assert_eq!(loaded, sample());
        assert!(!legacy.exists());
        assert_eq!(fs::read_to_string(&current).unwrap(), contents);

        // Second read has nothing to migrate
        assert!(!migrate_legacy(&legacy, &current).unwrap());
        assert_eq!(load(&current, &legacy), sample());
    }

    #[test]
    fn test_migration_skipped_when_new_file_exists() {
        let dir = TempDir::new().unwrap();
        let legacy = dir.path().join("legacy.json");
        let current = dir.path().join("current.json");
        fs::write(&legacy, "{}").unwrap();
        fs::write(&current, "{\"extraLines\": [\"x\"]}").unwrap();

        let loaded = load(&current, &legacy);
        assert_eq!(loaded.extra_lines, vec!["x".to_string()]);
        assert!(legacy.exists());
    }

    #[test]
    fn test_malformed_file_resets() {
        let dir = TempDir::new().unwrap();
        let current = dir.path().join("recommendations.json");
        fs::write(&current, "[1, 2").unwrap();
        assert_eq!(load(&current, &dir.path().join("none.json")), RecommendationsFile::default());
    }

    #[test]
    fn test_save_drops_disabled() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("recommendations.json");
        save(&path, &sample()).unwrap();

        let reloaded = load(&path, &dir.path().join("none.json"));
        assert!(!reloaded.param_overrides.contains_key("input:numlock_by_default"));
        assert!(!reloaded.hotkeys.contains_key("terminal"));
    }

    #[test]
    fn test_builtin_ids_unique() {
        let recommendations = builtin();
        let mut ids: Vec<&str> = recommendations.iter().map(Recommendation::id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), recommendations.len());
    }
}
