//! One-shot probe of host state that seeds override values
//!
//! Detected values are written as ordinary per-scope overrides; the overlay
//! only remembers which paths it filled so surfaces can highlight them and so
//! a later scan never overwrites something the user typed.

use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::constants::autodetect as paths;

/// One connected monitor as reported by the compositor
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorInfo {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub refresh_rate: f64,
    pub x: i32,
    pub y: i32,
    pub scale: f64,
    pub focused: bool,
}

impl MonitorInfo {
    /// `name,WxH@rate,XxY,scale` as used by `monitor =` lines
    pub fn to_config_value(&self) -> String {
        format!(
            "{},{}x{}@{},{}x{},{}",
            self.name,
            self.width,
            self.height,
            trim_float(self.refresh_rate),
            self.x,
            self.y,
            trim_float(self.scale),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyboardLayout {
    pub layout: String,
    pub variant: String,
    pub options: String,
}

/// Read-only probes of the running system. Failures read as `None`.
pub trait SystemProbe {
    fn monitors(&self) -> Option<Vec<MonitorInfo>>;
    fn keyboard(&self) -> Option<KeyboardLayout>;
}

/// Everything the probe can tell us, keyed by parameter path
pub fn detect_values(probe: &dyn SystemProbe) -> BTreeMap<String, String> {
    let mut values = BTreeMap::new();

    match probe.monitors() {
        Some(monitors) => {
            let primary = monitors
                .iter()
                .find(|m| m.focused)
                .or_else(|| monitors.first());
            if let Some(monitor) = primary {
                values.insert(paths::MONITOR.to_string(), monitor.to_config_value());
            }
        }
        None => debug!("monitor probe returned nothing"),
    }

    match probe.keyboard() {
        Some(keyboard) => {
            for (path, value) in [
                (paths::KB_LAYOUT, keyboard.layout),
                (paths::KB_VARIANT, keyboard.variant),
                (paths::KB_OPTIONS, keyboard.options),
            ] {
                if !value.trim().is_empty() {
                    values.insert(path.to_string(), value.trim().to_string());
                }
            }
        }
        None => debug!("keyboard probe returned nothing"),
    }

    values
}

/// Scan guard plus the set of machine-filled paths
#[derive(Debug, Default)]
pub struct AutoDetectOverlay {
    scanning: bool,
    completed: bool,
    detected: BTreeSet<String>,
}

impl AutoDetectOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the scan. False while one is running or after one finished.
    pub fn try_begin(&mut self) -> bool {
        if self.scanning || self.completed {
            return false;
        }
        self.scanning = true;
        true
    }

    pub fn finish(&mut self) {
        self.scanning = false;
        self.completed = true;
    }

    pub fn is_scanning(&self) -> bool {
        self.scanning
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn mark(&mut self, path: &str) {
        self.detected.insert(path.to_string());
    }

    /// The user took over `path`; stop highlighting it
    pub fn unmark(&mut self, path: &str) -> bool {
        self.detected.remove(path)
    }

    pub fn is_auto_detected(&self, path: &str) -> bool {
        self.detected.contains(path)
    }

    pub fn detected(&self) -> &BTreeSet<String> {
        &self.detected
    }

    pub fn clear(&mut self) {
        self.detected.clear();
    }
}

/// Shortest decimal form with at most two fractional digits
fn trim_float(value: f64) -> String {
    let formatted = format!("{value:.2}");
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}
