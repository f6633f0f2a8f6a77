//! Layered override storage with precedence-resolved reads
//!
//! One `Layers` instance belongs to one editing session. Nothing in here does
//! I/O; the session decides when a mutation is persisted or published.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Debug;

use crate::catalog::ParamCatalog;
use crate::types::{strip_comment, HotkeyOverride, ParamType};

/// A value that can live in an override layer
pub trait OverrideValue: Clone + PartialEq + Debug {
    /// Canonical form of the value, or `None` when it means "no override"
    fn normalized(&self) -> Option<Self>;
}

impl OverrideValue for String {
    fn normalized(&self) -> Option<Self> {
        let stripped = strip_comment(self);
        (!stripped.is_empty()).then(|| stripped.to_string())
    }
}

impl OverrideValue for HotkeyOverride {
    fn normalized(&self) -> Option<Self> {
        let key = self.key.trim();
        let dispatcher = self.dispatcher.trim();
        if key.is_empty() && dispatcher.is_empty() {
            return None;
        }
        let mut hotkey = self.clone();
        hotkey.key = key.to_string();
        hotkey.dispatcher = dispatcher.to_string();
        hotkey.args = strip_comment(&self.args).to_string();
        hotkey.modifiers = self
            .modifiers
            .iter()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();
        Some(hotkey)
    }
}

/// Cross-scope overrides plus who promoted each key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalLayer<V> {
    #[serde(default = "BTreeMap::new")]
    pub overrides: BTreeMap<String, V>,
    #[serde(default)]
    pub initiators: BTreeMap<String, String>,
}

impl<V> Default for GlobalLayer<V> {
    fn default() -> Self {
        Self {
            overrides: BTreeMap::new(),
            initiators: BTreeMap::new(),
        }
    }
}

/// Original, per-scope and global layers for one kind of value
#[derive(Debug, Clone)]
pub struct Layers<V> {
    original: BTreeMap<String, V>,
    current: BTreeMap<String, V>,
    global: GlobalLayer<V>,
}

/// Parameter layers, keyed by `full_path`
pub type ValueStore = Layers<String>;

/// Hotkey layers, keyed by hotkey id
pub type HotkeyStore = Layers<HotkeyOverride>;

impl<V: OverrideValue> Default for Layers<V> {
    fn default() -> Self {
        Self::new(BTreeMap::new(), BTreeMap::new(), GlobalLayer::default())
    }
}

impl<V: OverrideValue> Layers<V> {
    /// Build layers from loaded data. Empty entries in the mutable layers are
    /// dropped so that absence stays the only encoding of "no override".
    pub fn new(
        original: BTreeMap<String, V>,
        current: BTreeMap<String, V>,
        global: GlobalLayer<V>,
    ) -> Self {
        let mut layers = Self {
            original,
            current: BTreeMap::new(),
            global: GlobalLayer::default(),
        };
        layers.replace_current(current);
        layers.replace_global(global);
        layers
    }

    /// Effective value: per-scope, then global, then the theme's own value
    pub fn get(&self, key: &str) -> Option<V> {
        self.current
            .get(key)
            .or_else(|| self.global.overrides.get(key))
            .cloned()
            .or_else(|| self.original(key))
    }

    /// Theme baseline with comments stripped
    pub fn original(&self, key: &str) -> Option<V> {
        self.original.get(key).and_then(OverrideValue::normalized)
    }

    pub fn current(&self, key: &str) -> Option<&V> {
        self.current.get(key)
    }

    pub fn global(&self, key: &str) -> Option<&V> {
        self.global.overrides.get(key)
    }

    pub fn initiator(&self, key: &str) -> Option<&str> {
        self.global.initiators.get(key).map(String::as_str)
    }

    /// Presence-based: a key is overridden iff this scope stores a value for it
    pub fn is_overridden(&self, key: &str) -> bool {
        self.current.contains_key(key)
    }

    /// Set or clear a per-scope override. Returns whether anything changed.
    pub fn set(&mut self, key: &str, value: Option<V>) -> bool {
        match value.as_ref().and_then(OverrideValue::normalized) {
            Some(value) => {
                if self.current.get(key) == Some(&value) {
                    return false;
                }
                self.current.insert(key.to_string(), value);
                true
            }
            None => self.current.remove(key).is_some(),
        }
    }

    /// Set or clear a global override, recording `initiator` for set values
    pub fn set_global(&mut self, key: &str, value: Option<V>, initiator: &str) -> bool {
        match value.as_ref().and_then(OverrideValue::normalized) {
            Some(value) => {
                let unchanged = self.global.overrides.get(key) == Some(&value)
                    && self.initiator(key) == Some(initiator);
                if unchanged {
                    return false;
                }
                self.global.overrides.insert(key.to_string(), value);
                self.global
                    .initiators
                    .insert(key.to_string(), initiator.to_string());
                true
            }
            None => {
                self.global.initiators.remove(key);
                self.global.overrides.remove(key).is_some()
            }
        }
    }

    /// Drop every per-scope override, returning the keys that were removed
    pub fn clear_current(&mut self) -> Vec<String> {
        std::mem::take(&mut self.current).into_keys().collect()
    }

    pub fn current_overrides(&self) -> &BTreeMap<String, V> {
        &self.current
    }

    pub fn global_layer(&self) -> &GlobalLayer<V> {
        &self.global
    }

    pub fn originals(&self) -> &BTreeMap<String, V> {
        &self.original
    }

    pub fn replace_current(&mut self, current: BTreeMap<String, V>) {
        self.current = current
            .into_iter()
            .filter_map(|(k, v)| v.normalized().map(|v| (k, v)))
            .collect();
    }

    pub fn replace_global(&mut self, global: GlobalLayer<V>) {
        let overrides: BTreeMap<String, V> = global
            .overrides
            .into_iter()
            .filter_map(|(k, v)| v.normalized().map(|v| (k, v)))
            .collect();
        // Initiators without a value are meaningless
        let initiators = global
            .initiators
            .into_iter()
            .filter(|(k, _)| overrides.contains_key(k))
            .collect();
        self.global = GlobalLayer { overrides, initiators };
    }

    /// Effective value of every key that has a per-scope or global override
    pub fn resolved_overrides(&self) -> BTreeMap<String, V> {
        self.current
            .keys()
            .chain(self.global.overrides.keys())
            .filter_map(|k| self.get(k).map(|v| (k.clone(), v)))
            .collect()
    }
}

impl Layers<String> {
    /// Display hint for an empty input: the global value if one exists,
    /// otherwise the type and default from the catalog
    pub fn placeholder_for(&self, path: &str, catalog: &ParamCatalog) -> String {
        if let Some(global) = self.global(path) {
            return format!("Global: {global}");
        }
        let descriptor = catalog.get(path);
        let param_type = descriptor.map(|d| d.param_type).unwrap_or(ParamType::Str);
        match descriptor.and_then(|d| d.default_value.as_deref()) {
            Some(default) => format!("{param_type}: {default}"),
            None => param_type.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn store(original: &[(&str, &str)], current: &[(&str, &str)], global: &[(&str, &str)]) -> ValueStore {
        Layers::new(
            map(original),
            map(current),
            GlobalLayer {
                overrides: map(global),
                initiators: global.iter().map(|(k, _)| (k.to_string(), "other".to_string())).collect(),
            },
        )
    }

    #[test]
    fn test_current_wins_over_global_and_original() {
        let store = store(
            &[("general:gaps_in", "5")],
            &[("general:gaps_in", "10")],
            &[("general:gaps_in", "20")],
        );
        assert_eq!(store.get("general:gaps_in").as_deref(), Some("10"));
    }

    #[test]
    fn test_global_wins_over_original() {
        let store = store(&[("general:gaps_in", "5")], &[], &[("general:gaps_in", "20")]);
        assert_eq!(store.get("general:gaps_in").as_deref(), Some("20"));
    }

    #[test]
    fn test_original_is_comment_stripped() {
        let store = store(&[("general:gaps_in", " 5 # theme default")], &[], &[]);
        assert_eq!(store.get("general:gaps_in").as_deref(), Some("5"));
        assert_eq!(store.get("general:gaps_out"), None);
    }

    #[test]
    fn test_clearing_with_empty_removes_entry() {
        let mut store = store(&[("general:gaps_in", "5")], &[], &[("general:gaps_in", "20")]);
        assert!(store.set("general:gaps_in", Some("x".to_string())));
        assert!(store.set("general:gaps_in", Some(String::new())));

        assert!(!store.current_overrides().contains_key("general:gaps_in"));
        assert!(!store.is_overridden("general:gaps_in"));
        assert_eq!(store.get("general:gaps_in").as_deref(), Some("20"));
    }

    #[test]
    fn test_comment_only_value_counts_as_empty() {
        let mut store = ValueStore::default();
        assert!(!store.set("general:gaps_in", Some("   # nothing".to_string())));
        assert!(store.current_overrides().is_empty());
    }

    #[test]
    fn test_set_same_value_is_noop() {
        let mut store = ValueStore::default();
        assert!(store.set("general:gaps_in", Some("10".to_string())));
        assert!(!store.set("general:gaps_in", Some("10 # again".to_string())));
        assert!(!store.set("general:gaps_in", None));
        assert!(!store.set("general:gaps_in", None));
    }

    #[test]
    fn test_clear_current_keeps_global() {
        let mut store = store(&[], &[("a", "1"), ("b", "2")], &[("a", "3")]);
        let mut cleared = store.clear_current();
        cleared.sort();
        assert_eq!(cleared, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(store.get("a").as_deref(), Some("3"));
        assert_eq!(store.get("b"), None);
    }

    #[test]
    fn test_loaded_empty_entries_dropped() {
        let store = store(&[], &[("a", ""), ("b", "2")], &[("c", "  ")]);
        assert_eq!(store.current_overrides().len(), 1);
        assert!(store.global_layer().overrides.is_empty());
        assert!(store.global_layer().initiators.is_empty());
    }

    #[test]
    fn test_placeholder_for() {
        let catalog = ParamCatalog::builtin();
        let store = store(&[], &[], &[("general:gaps_out", "30")]);

        assert_eq!(store.placeholder_for("general:gaps_out", &catalog), "Global: 30");
        assert_eq!(store.placeholder_for("general:gaps_in", &catalog), "int: 5");
        assert_eq!(store.placeholder_for("input:kb_variant", &catalog), "str");
        assert_eq!(store.placeholder_for("unknown:key", &catalog), "str");
    }

    #[test]
    fn test_resolved_overrides_only_overridden_keys() {
        let store = store(&[("a", "0"), ("z", "9")], &[("a", "1")], &[("b", "2")]);
        let resolved = store.resolved_overrides();
        assert_eq!(resolved, map(&[("a", "1"), ("b", "2")]));
    }

    #[test]
    fn test_hotkey_normalization() {
        let mut hotkeys = HotkeyStore::default();
        let empty = HotkeyOverride::new("terminal", &[], " ", "", "");
        assert!(!hotkeys.set("terminal", Some(empty)));

        let hotkey = HotkeyOverride::new("terminal", &["SUPER", " "], "Return ", "exec", "kitty # term");
        assert!(hotkeys.set("terminal", Some(hotkey)));
        let stored = hotkeys.get("terminal").unwrap();
        assert_eq!(stored.modifiers, vec!["SUPER".to_string()]);
        assert_eq!(stored.key, "Return");
        assert_eq!(stored.args, "kitty");
    }
}
