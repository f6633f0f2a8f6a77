//! Dig / promotion of per-scope values into the global layer
//!
//! Per key: `Default -> PerRiceOverridden <-> GlobalOverridden`. Both layers
//! may hold a value at once; what a surface renders is whatever
//! [`Layers::get`] resolves.

use tracing::{debug, info};

use super::store::{GlobalLayer, Layers, OverrideValue};

/// Promotion bookkeeping for one session and one kind of value
#[derive(Debug, Clone)]
pub struct Promotions<V> {
    /// Global layer as it was before this session's first promotion
    snapshot: Option<GlobalLayer<V>>,
}

impl<V> Default for Promotions<V> {
    fn default() -> Self {
        Self { snapshot: None }
    }
}

impl<V: OverrideValue> Promotions<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the promote action should be offered for `key`.
    ///
    /// True when this scope overrides the key, or when a global value exists
    /// that another scope promoted. A key this scope already promoted is not
    /// offered again.
    pub fn can_promote(layers: &Layers<V>, key: &str, scope: &str) -> bool {
        layers.is_overridden(key)
            || (layers.global(key).is_some() && layers.initiator(key) != Some(scope))
    }

    /// Copy the scope's value for `key` into the global layer.
    ///
    /// Returns the promoted value, or `None` when there was nothing to promote.
    /// The per-scope override is left in place; callers follow up with
    /// [`Promotions::use_global`].
    pub fn promote(&mut self, layers: &mut Layers<V>, key: &str, scope: &str) -> Option<V> {
        if !layers.is_overridden(key)
            && layers.global(key).is_some()
            && layers.initiator(key) == Some(scope)
        {
            debug!(key = %key, scope = %scope, "key already promoted by this scope");
            return None;
        }

        let value = layers
            .current(key)
            .and_then(OverrideValue::normalized)
            .or_else(|| layers.original(key))
            .or_else(|| layers.get(key));

        let Some(value) = value else {
            debug!(key = %key, "nothing to promote");
            return None;
        };

        if self.snapshot.is_none() {
            self.snapshot = Some(layers.global_layer().clone());
        }

        layers.set_global(key, Some(value.clone()), scope);
        info!(key = %key, scope = %scope, "promoted value to global");
        Some(value)
    }

    /// Drop the per-scope override so the global (or theme) value shows through.
    /// Returns the value now in effect.
    pub fn use_global(layers: &mut Layers<V>, key: &str) -> Option<V> {
        layers.set(key, None);
        layers
            .global(key)
            .cloned()
            .or_else(|| layers.original(key))
    }

    /// Restore the global layer captured before the first promotion.
    /// Returns false when no promotion happened since the last commit.
    pub fn rollback(&mut self, layers: &mut Layers<V>) -> bool {
        match self.snapshot.take() {
            Some(snapshot) => {
                layers.replace_global(snapshot);
                info!("rolled back global promotions");
                true
            }
            None => false,
        }
    }

    /// Keep the promotions made so far; the next one takes a fresh snapshot
    pub fn commit(&mut self) {
        self.snapshot = None;
    }

    pub fn has_snapshot(&self) -> bool {
        self.snapshot.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::store::ValueStore;
    use std::collections::BTreeMap;

    fn layers(original: &[(&str, &str)], current: &[(&str, &str)]) -> ValueStore {
        let to_map = |entries: &[(&str, &str)]| -> BTreeMap<String, String> {
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        };
        Layers::new(to_map(original), to_map(current), GlobalLayer::default())
    }

    #[test]
    fn test_promote_current_value() {
        let mut store = layers(&[("general:gaps_in", "5")], &[("general:gaps_in", "10")]);
        let mut promotions = Promotions::new();

        let promoted = promotions.promote(&mut store, "general:gaps_in", "nord");
        assert_eq!(promoted.as_deref(), Some("10"));
        assert_eq!(store.global("general:gaps_in").map(String::as_str), Some("10"));
        assert_eq!(store.initiator("general:gaps_in"), Some("nord"));
        assert!(promotions.has_snapshot());
    }

    #[test]
    fn test_promote_original_strips_comment() {
        let mut store = layers(&[("general:gaps_in", "7 # theme")], &[]);
        let mut promotions = Promotions::new();

        let promoted = promotions.promote(&mut store, "general:gaps_in", "nord");
        assert_eq!(promoted.as_deref(), Some("7"));
    }

    #[test]
    fn test_promote_empty_is_noop() {
        let mut store = layers(&[("general:gaps_in", "# nothing")], &[]);
        let mut promotions = Promotions::new();

        assert_eq!(promotions.promote(&mut store, "general:gaps_in", "nord"), None);
        assert!(store.global_layer().overrides.is_empty());
        assert!(!promotions.has_snapshot());
    }

    #[test]
    fn test_promote_twice_is_idempotent() {
        let mut store = layers(&[("general:gaps_in", "5")], &[("general:gaps_in", "10")]);
        let mut promotions = Promotions::new();

        promotions.promote(&mut store, "general:gaps_in", "nord");
        Promotions::use_global(&mut store, "general:gaps_in");
        let after_first = store.global_layer().clone();

        promotions.promote(&mut store, "general:gaps_in", "nord");
        Promotions::use_global(&mut store, "general:gaps_in");
        assert_eq!(store.global_layer(), &after_first);
    }

    #[test]
    fn test_use_global_falls_back_to_original() {
        let mut store = layers(&[("general:gaps_in", "5")], &[("general:gaps_in", "10")]);

        let effective = Promotions::use_global(&mut store, "general:gaps_in");
        assert_eq!(effective.as_deref(), Some("5"));
        assert!(!store.is_overridden("general:gaps_in"));
    }

    #[test]
    fn test_can_promote_rules() {
        let mut store = layers(&[("a", "1")], &[("b", "2")]);
        assert!(!Promotions::can_promote(&store, "a", "nord"));
        assert!(Promotions::can_promote(&store, "b", "nord"));

        store.set_global("a", Some("3".to_string()), "nord");
        assert!(!Promotions::can_promote(&store, "a", "nord"));
        assert!(Promotions::can_promote(&store, "a", "gruvbox"));
    }

    #[test]
    fn test_second_scope_takes_over_initiator() {
        let mut store = layers(&[], &[("a", "1")]);
        let mut promotions = Promotions::new();
        promotions.promote(&mut store, "a", "nord");

        store.set("a", Some("2".to_string()));
        promotions.promote(&mut store, "a", "gruvbox");
        assert_eq!(store.initiator("a"), Some("gruvbox"));
        assert_eq!(store.global("a").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_rollback_restores_first_snapshot() {
        let mut store = layers(&[], &[("a", "1"), ("b", "2")]);
        store.set_global("c", Some("keep".to_string()), "other");
        let before = store.global_layer().clone();
        let mut promotions = Promotions::new();

        promotions.promote(&mut store, "a", "nord");
        promotions.promote(&mut store, "b", "nord");
        assert!(promotions.rollback(&mut store));
        assert_eq!(store.global_layer(), &before);
        assert!(!promotions.rollback(&mut store));
    }

    #[test]
    fn test_commit_discards_snapshot() {
        let mut store = layers(&[], &[("a", "1")]);
        let mut promotions = Promotions::new();
        promotions.promote(&mut store, "a", "nord");
        promotions.commit();
        assert!(!promotions.rollback(&mut store));
        assert_eq!(store.global("a").map(String::as_str), Some("1"));
    }
}
