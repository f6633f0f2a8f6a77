//! Application-wide constants
//!
//! This module contains all magic numbers and string literals used throughout
//! the application, providing a single source of truth for constant values.

/// Filesystem layout constants
pub mod paths {
    /// Directory name under the XDG config/data directories
    pub const APP_DIR: &str = "hyprrice";

    /// Key-value settings store (config dir)
    pub const SETTINGS_FILE: &str = "settings.json";

    /// Dedicated cross-theme override store (data dir)
    pub const GLOBAL_OVERRIDES_FILE: &str = "global_overrides.json";

    /// Recommendations file (data dir; legacy copy lived in the config dir)
    pub const RECOMMENDATIONS_FILE: &str = "recommendations.json";

    /// Directory holding one subdirectory per installed rice (data dir)
    pub const RICES_DIR: &str = "rices";

    /// Per-rice override file
    pub const SCOPE_OVERRIDES_FILE: &str = "overrides.json";

    /// Per-rice compositor configuration (source of original values)
    pub const THEME_CONFIG_FILE: &str = "hyprland.conf";
}

/// Keys consumed and produced in the settings store
pub mod settings {
    /// Legacy mirror of global parameter overrides
    pub const HYPRLAND_OVERRIDES: &str = "hyprlandOverrides";

    /// Legacy mirror of global hotkey overrides
    pub const HOTKEY_OVERRIDES: &str = "hotkeyOverrides";

    /// Run the auto-detect overlay when a surface opens
    pub const AUTO_DETECT_SYSTEM_PARAMS: &str = "autoDetectSystemParams";

    /// Push every committed override to the running compositor
    pub const APPLY_OVERRIDES_REALTIME: &str = "applyHyprlandOverridesRealtime";

    /// Debounce window for realtime apply, in milliseconds
    pub const REALTIME_DEBOUNCE_MS: &str = "realtimeDebounceMs";
}

/// Pub/sub event names
pub mod events {
    pub const HYPRLAND_GLOBAL_OVERRIDES_CHANGED: &str = "HYPRLAND_GLOBAL_OVERRIDES_CHANGED";
    pub const HOTKEY_GLOBAL_OVERRIDES_CHANGED: &str = "HOTKEY_GLOBAL_OVERRIDES_CHANGED";
}

/// Scope names
pub mod scope {
    /// Scope name of the global-settings surface
    pub const GLOBAL: &str = "global";

    /// Initiator recorded for values written by enabling a recommendation
    pub const RECOMMENDATIONS: &str = "recommendations";
}

/// Realtime apply constants
pub mod realtime {
    /// Default debounce window before queued overrides are pushed
    pub const DEFAULT_DEBOUNCE_MS: u64 = 120;

    /// Upper bound accepted from the settings store
    pub const MAX_DEBOUNCE_MS: u64 = 5_000;
}

/// Auto-detected parameter paths
pub mod autodetect {
    pub const MONITOR: &str = "monitor";
    pub const KB_LAYOUT: &str = "input:kb_layout";
    pub const KB_VARIANT: &str = "input:kb_variant";
    pub const KB_OPTIONS: &str = "input:kb_options";
}

/// External commands
pub mod commands {
    pub const HYPRCTL: &str = "hyprctl";
    pub const SETXKBMAP: &str = "setxkbmap";
    pub const LOCALECTL: &str = "localectl";

    /// Successful reply printed by `hyprctl keyword`
    pub const HYPRCTL_OK: &str = "ok";
}

/// Classifier scoring weights
pub mod scoring {
    /// Keyword equals the first token of the command
    pub const FIRST_TOKEN: i32 = 8;

    /// Keyword equals a later token of the command
    pub const LATER_TOKEN: i32 = 5;

    /// Tie bias per matched modifier/key hint
    pub const HINT_BIAS: i32 = 1;
}
