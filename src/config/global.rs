//! Dedicated store for cross-theme overrides

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::engine::store::GlobalLayer;
use crate::types::HotkeyOverride;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalOverridesFile {
    #[serde(default)]
    pub hyprland: GlobalLayer<String>,
    #[serde(default)]
    pub hotkeys: GlobalLayer<HotkeyOverride>,
}

/// Returns `None` when the file is missing or unreadable
pub fn load(path: &Path) -> Option<GlobalOverridesFile> {
    let contents = fs::read_to_string(path)
        .inspect_err(|e| debug!(path = %path.display(), error = %e, "No global overrides file"))
        .ok()?;
    serde_json::from_str(&contents)
        .inspect_err(|e| warn!(path = %path.display(), error = %e, "Malformed global overrides file"))
        .ok()
}

pub fn save(path: &Path, file: &GlobalOverridesFile) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }
    let json = serde_json::to_string_pretty(file).context("Failed to serialize global overrides")?;
    fs::write(path, json).with_context(|| format!("Failed to write global overrides to {:?}", path))?;
    Ok(())
}
