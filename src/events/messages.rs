//! Event types published between editing surfaces

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::constants::events;
use crate::engine::store::GlobalLayer;
use crate::types::HotkeyOverride;

/// Full snapshot of a global layer after it changed
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GlobalOverridesChanged<V> {
    pub overrides: BTreeMap<String, V>,
    pub initiators: BTreeMap<String, String>,
    /// Id of the surface that made the change
    pub emitter: String,
}

impl<V: Clone> GlobalOverridesChanged<V> {
    pub fn from_layer(layer: &GlobalLayer<V>, emitter: &str) -> Self {
        Self {
            overrides: layer.overrides.clone(),
            initiators: layer.initiators.clone(),
            emitter: emitter.to_string(),
        }
    }

    pub fn into_layer(self) -> GlobalLayer<V> {
        GlobalLayer {
            overrides: self.overrides,
            initiators: self.initiators,
        }
    }
}

/// Events carried on the bus
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "event", content = "payload")]
pub enum BusEvent {
    /// Global parameter overrides changed
    #[serde(rename = "HYPRLAND_GLOBAL_OVERRIDES_CHANGED")]
    HyprlandGlobalOverridesChanged(GlobalOverridesChanged<String>),

    /// Global hotkey overrides changed
    #[serde(rename = "HOTKEY_GLOBAL_OVERRIDES_CHANGED")]
    HotkeyGlobalOverridesChanged(GlobalOverridesChanged<HotkeyOverride>),
}

impl BusEvent {
    pub fn name(&self) -> &'static str {
        match self {
            BusEvent::HyprlandGlobalOverridesChanged(_) => events::HYPRLAND_GLOBAL_OVERRIDES_CHANGED,
            BusEvent::HotkeyGlobalOverridesChanged(_) => events::HOTKEY_GLOBAL_OVERRIDES_CHANGED,
        }
    }

    pub fn emitter(&self) -> &str {
        match self {
            BusEvent::HyprlandGlobalOverridesChanged(change) => &change.emitter,
            BusEvent::HotkeyGlobalOverridesChanged(change) => &change.emitter,
        }
    }
}
