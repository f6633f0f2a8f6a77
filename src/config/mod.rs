//! Persistence gateway
//!
//! Everything the engine reads from or writes to disk goes through
//! [`OverrideStorage`]. [`FileGateway`] is the on-disk implementation:
//! - **settings**: key-value store in the config dir (legacy mirrors live here)
//! - **global**: dedicated cross-theme override store
//! - **scope**: per-rice overrides next to the rice's own `hyprland.conf`
//! - **recommendations**: enabled recommendations, migrated from the config dir

pub mod global;
pub mod recommendations;
pub mod scope;
pub mod settings;

use serde_json::Value;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::constants::{paths, settings as keys};
use crate::engine::store::GlobalLayer;
use crate::types::HotkeyOverride;

pub use global::GlobalOverridesFile;
pub use recommendations::{Recommendation, RecommendationKind, RecommendationsFile};
pub use scope::ScopeOverrides;
pub use settings::SettingsStore;

/// Storage the engine depends on. Writes report success as a bool: a failed
/// write is logged by the implementation and never rolls back memory.
pub trait OverrideStorage {
    fn read_overrides(&self, scope: &str) -> ScopeOverrides;
    fn write_overrides(&self, scope: &str, overrides: &ScopeOverrides) -> bool;

    /// Raw compositor config shipped with the rice
    fn read_theme_config(&self, scope: &str) -> Option<String>;

    fn read_global_hyprland(&self) -> GlobalLayer<String>;
    /// Updates the dedicated store and the `hyprlandOverrides` mirror together
    fn write_global_hyprland(&self, layer: &GlobalLayer<String>) -> bool;

    fn read_global_hotkeys(&self) -> GlobalLayer<HotkeyOverride>;
    /// Updates the dedicated store and the `hotkeyOverrides` mirror together
    fn write_global_hotkeys(&self, layer: &GlobalLayer<HotkeyOverride>) -> bool;

    fn read_recommendations(&self) -> RecommendationsFile;
    fn write_recommendations(&self, file: &RecommendationsFile) -> bool;

    fn get_setting(&self, key: &str) -> Option<Value>;
    /// Set and persist one setting
    fn set_setting(&self, key: &str, value: Value) -> bool;

    /// `autoDetectSystemParams`
    fn auto_detect_enabled(&self) -> bool;

    /// `applyHyprlandOverridesRealtime`
    fn realtime_enabled(&self) -> bool;

    /// `realtimeDebounceMs`, clamped to the accepted range
    fn realtime_debounce_ms(&self) -> u64;
}

/// JSON files under the XDG config and data directories
#[derive(Debug)]
pub struct FileGateway {
    config_dir: PathBuf,
    data_dir: PathBuf,
    settings: RefCell<SettingsStore>,
}

impl FileGateway {
    /// Gateway rooted at `<config_dir>/hyprrice` and `<data_dir>/hyprrice`
    pub fn new(config_dir: PathBuf, data_dir: PathBuf) -> Self {
        let config_dir = config_dir.join(paths::APP_DIR);
        let data_dir = data_dir.join(paths::APP_DIR);
        let settings = SettingsStore::load(config_dir.join(paths::SETTINGS_FILE));
        Self {
            config_dir,
            data_dir,
            settings: RefCell::new(settings),
        }
    }

    /// Gateway on the user's XDG directories
    pub fn from_env() -> Self {
        let config = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        let data = dirs::data_dir().unwrap_or_else(|| config.clone());
        Self::new(config, data)
    }

    pub fn rice_dir(&self, scope: &str) -> PathBuf {
        self.data_dir.join(paths::RICES_DIR).join(scope)
    }

    pub fn global_path(&self) -> PathBuf {
        self.data_dir.join(paths::GLOBAL_OVERRIDES_FILE)
    }

    pub fn recommendations_path(&self) -> PathBuf {
        self.data_dir.join(paths::RECOMMENDATIONS_FILE)
    }

    pub fn legacy_recommendations_path(&self) -> PathBuf {
        self.config_dir.join(paths::RECOMMENDATIONS_FILE)
    }

    /// Read-only view of the settings store
    pub fn settings(&self) -> std::cell::Ref<'_, SettingsStore> {
        self.settings.borrow()
    }

    fn load_global(&self) -> GlobalOverridesFile {
        global::load(&self.global_path()).unwrap_or_default()
    }

    fn save_global(&self, file: &GlobalOverridesFile) -> bool {
        match global::save(&self.global_path(), file) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = ?e, "Failed to save global overrides");
                false
            }
        }
    }

    fn mirror_setting<T: serde::Serialize>(&self, key: &str, value: &T) -> bool {
        let mut settings = self.settings.borrow_mut();
        let result = settings.set(key, value).and_then(|()| settings.write());
        match result {
            Ok(()) => true,
            Err(e) => {
                warn!(key = %key, error = ?e, "Failed to write settings mirror");
                false
            }
        }
    }
}

impl OverrideStorage for FileGateway {
    fn read_overrides(&self, scope: &str) -> ScopeOverrides {
        scope::load(&self.rice_dir(scope).join(paths::SCOPE_OVERRIDES_FILE))
    }

    fn write_overrides(&self, scope: &str, overrides: &ScopeOverrides) -> bool {
        let path = self.rice_dir(scope).join(paths::SCOPE_OVERRIDES_FILE);
        match scope::save(&path, overrides) {
            Ok(()) => true,
            Err(e) => {
                warn!(scope = %scope, error = ?e, "Failed to save rice overrides");
                false
            }
        }
    }

    fn read_theme_config(&self, scope: &str) -> Option<String> {
        let path = self.rice_dir(scope).join(paths::THEME_CONFIG_FILE);
        fs::read_to_string(&path)
            .inspect_err(|e| debug!(path = %path.display(), error = %e, "Cannot read rice config"))
            .ok()
    }

    fn read_global_hyprland(&self) -> GlobalLayer<String> {
        let layer = self.load_global().hyprland;
        if !layer.overrides.is_empty() {
            return layer;
        }
        // Older installs only have the settings mirror
        let legacy: Option<BTreeMap<String, String>> =
            self.settings.borrow().get_as(keys::HYPRLAND_OVERRIDES);
        GlobalLayer {
            overrides: legacy.unwrap_or_default(),
            initiators: BTreeMap::new(),
        }
    }

    fn write_global_hyprland(&self, layer: &GlobalLayer<String>) -> bool {
        let mut file = self.load_global();
        file.hyprland = layer.clone();
        let dedicated = self.save_global(&file);
        let mirror = self.mirror_setting(keys::HYPRLAND_OVERRIDES, &layer.overrides);
        dedicated && mirror
    }

    fn read_global_hotkeys(&self) -> GlobalLayer<HotkeyOverride> {
        let layer = self.load_global().hotkeys;
        if !layer.overrides.is_empty() {
            return layer;
        }
        let legacy: Option<BTreeMap<String, HotkeyOverride>> =
            self.settings.borrow().get_as(keys::HOTKEY_OVERRIDES);
        GlobalLayer {
            overrides: legacy.unwrap_or_default(),
            initiators: BTreeMap::new(),
        }
    }

    fn write_global_hotkeys(&self, layer: &GlobalLayer<HotkeyOverride>) -> bool {
        let mut file = self.load_global();
        file.hotkeys = layer.clone();
        let dedicated = self.save_global(&file);
        let mirror = self.mirror_setting(keys::HOTKEY_OVERRIDES, &layer.overrides);
        dedicated && mirror
    }

    fn read_recommendations(&self) -> RecommendationsFile {
        recommendations::load(
            &self.recommendations_path(),
            &self.legacy_recommendations_path(),
        )
    }

    fn write_recommendations(&self, file: &RecommendationsFile) -> bool {
        match recommendations::save(&self.recommendations_path(), file) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = ?e, "Failed to save recommendations");
                false
            }
        }
    }

    fn get_setting(&self, key: &str) -> Option<Value> {
        self.settings.borrow().get(key).cloned()
    }

    fn set_setting(&self, key: &str, value: Value) -> bool {
        self.mirror_setting(key, &value)
    }

    fn auto_detect_enabled(&self) -> bool {
        self.settings.borrow().auto_detect_enabled()
    }

    fn realtime_enabled(&self) -> bool {
        self.settings.borrow().realtime_enabled()
    }

    fn realtime_debounce_ms(&self) -> u64 {
        self.settings.borrow().realtime_debounce_ms()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn gateway(dir: &TempDir) -> FileGateway {
        FileGateway::new(dir.path().join("config"), dir.path().join("data"))
    }

    #[test]
    fn test_overrides_round_trip() {
        let dir = TempDir::new().unwrap();
        let gateway = gateway(&dir);
        let overrides = ScopeOverrides {
            params: BTreeMap::from([
                ("general:gaps_in".to_string(), " 10 ".to_string()),
                ("general:gaps_out".to_string(), "".to_string()),
            ]),
            hotkeys: BTreeMap::new(),
        };

        assert!(gateway.write_overrides("nord", &overrides));
        let loaded = gateway.read_overrides("nord");
        assert_eq!(
            loaded.params,
            BTreeMap::from([("general:gaps_in".to_string(), "10".to_string())])
        );
        assert!(gateway.read_overrides("gruvbox").is_empty());
    }

    #[test]
    fn test_global_write_updates_mirror() {
        let dir = TempDir::new().unwrap();
        let gateway = gateway(&dir);
        let layer = GlobalLayer {
            overrides: BTreeMap::from([("general:gaps_in".to_string(), "10".to_string())]),
            initiators: BTreeMap::from([("general:gaps_in".to_string(), "nord".to_string())]),
        };

        assert!(gateway.write_global_hyprland(&layer));
        assert_eq!(gateway.read_global_hyprland(), layer);

        let mirror: BTreeMap<String, String> = gateway
            .settings()
            .get_as(keys::HYPRLAND_OVERRIDES)
            .unwrap();
        assert_eq!(mirror, layer.overrides);

        // Another gateway instance sees the same state on disk
        let other = FileGateway::new(dir.path().join("config"), dir.path().join("data"));
        assert_eq!(other.read_global_hyprland(), layer);
    }

    #[test]
    fn test_hotkey_write_keeps_params() {
        let dir = TempDir::new().unwrap();
        let gateway = gateway(&dir);
        let params = GlobalLayer {
            overrides: BTreeMap::from([("a".to_string(), "1".to_string())]),
            initiators: BTreeMap::new(),
        };
        gateway.write_global_hyprland(&params);

        let hotkeys = GlobalLayer {
            overrides: BTreeMap::from([(
                "terminal".to_string(),
                HotkeyOverride::new("terminal", &["SUPER"], "Return", "exec", "kitty"),
            )]),
            initiators: BTreeMap::new(),
        };
        assert!(gateway.write_global_hotkeys(&hotkeys));
        assert_eq!(gateway.read_global_hyprland(), params);
        assert_eq!(gateway.read_global_hotkeys(), hotkeys);
    }

    #[test]
    fn test_legacy_mirror_fallback() {
        let dir = TempDir::new().unwrap();
        let gateway = gateway(&dir);
        assert!(gateway.set_setting(
            keys::HYPRLAND_OVERRIDES,
            serde_json::json!({"general:gaps_out": "30"}),
        ));

        let layer = gateway.read_global_hyprland();
        assert_eq!(layer.overrides.get("general:gaps_out").map(String::as_str), Some("30"));
        assert!(layer.initiators.is_empty());
    }

    #[test]
    fn test_typed_settings_follow_store() {
        let dir = TempDir::new().unwrap();
        let gateway = gateway(&dir);
        assert!(!gateway.realtime_enabled());
        assert!(!gateway.auto_detect_enabled());

        gateway.set_setting(keys::APPLY_OVERRIDES_REALTIME, Value::Bool(true));
        gateway.set_setting(keys::AUTO_DETECT_SYSTEM_PARAMS, Value::Bool(true));
        gateway.set_setting(keys::REALTIME_DEBOUNCE_MS, serde_json::json!(60_000));
        assert!(gateway.realtime_enabled());
        assert!(gateway.auto_detect_enabled());
        assert_eq!(gateway.realtime_debounce_ms(), crate::constants::realtime::MAX_DEBOUNCE_MS);

        // Survives a reload from disk
        let reopened = FileGateway::new(dir.path().join("config"), dir.path().join("data"));
        assert!(reopened.auto_detect_enabled());
    }

    #[test]
    fn test_theme_config_read() {
        let dir = TempDir::new().unwrap();
        let gateway = gateway(&dir);
        assert_eq!(gateway.read_theme_config("nord"), None);

        fs::create_dir_all(gateway.rice_dir("nord")).unwrap();
        fs::write(gateway.rice_dir("nord").join("hyprland.conf"), "general {\n}\n").unwrap();
        assert!(gateway.read_theme_config("nord").is_some());
    }
}
