//! Parameter catalog
//!
//! Descriptors for the compositor keys the engine knows about. The catalog is
//! only consulted for display hints and value checks, never for resolution:
//! unknown keys resolve through the override layers like any other.

use std::collections::BTreeMap;

use crate::types::{ParamDescriptor, ParamType};

#[derive(Debug, Clone, Default)]
pub struct ParamCatalog {
    params: BTreeMap<String, ParamDescriptor>,
}

impl ParamCatalog {
    pub fn new(descriptors: impl IntoIterator<Item = ParamDescriptor>) -> Self {
        Self {
            params: descriptors
                .into_iter()
                .map(|d| (d.full_path.clone(), d))
                .collect(),
        }
    }

    pub fn get(&self, full_path: &str) -> Option<&ParamDescriptor> {
        self.params.get(full_path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParamDescriptor> {
        self.params.values()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Catalog of commonly themed Hyprland keys
    pub fn builtin() -> Self {
        use ParamType::*;
        Self::new([
            param("general:gaps_in", Int, Some((0.0, 100.0)), Some("5"), "Gaps between windows"),
            param("general:gaps_out", Int, Some((0.0, 200.0)), Some("20"), "Gaps between windows and monitor edges"),
            param("general:border_size", Int, Some((0.0, 20.0)), Some("1"), "Window border width"),
            param("general:col.active_border", Str, None, Some("0xffffffff"), "Border color of the focused window"),
            param("general:col.inactive_border", Str, None, Some("0xff444444"), "Border color of unfocused windows"),
            param("general:resize_on_border", Bool, None, Some("false"), "Resize windows by dragging their border"),
            param("general:allow_tearing", Bool, None, Some("false"), "Allow tearing for fullscreen games"),
            param("decoration:rounding", Int, Some((0.0, 50.0)), Some("0"), "Corner radius"),
            param("decoration:active_opacity", Float, Some((0.0, 1.0)), Some("1.0"), "Opacity of the focused window"),
            param("decoration:inactive_opacity", Float, Some((0.0, 1.0)), Some("1.0"), "Opacity of unfocused windows"),
            param("decoration:blur:enabled", Bool, None, Some("true"), "Background blur"),
            param("decoration:blur:size", Int, Some((1.0, 50.0)), Some("8"), "Blur radius"),
            param("decoration:blur:passes", Int, Some((1.0, 10.0)), Some("1"), "Blur passes"),
            param("animations:enabled", Bool, None, Some("true"), "Enable animations"),
            param("input:kb_layout", Str, None, Some("us"), "Keyboard layout"),
            param("input:kb_variant", Str, None, None, "Keyboard layout variant"),
            param("input:kb_options", Str, None, None, "XKB options"),
            param("input:follow_mouse", Int, Some((0.0, 3.0)), Some("1"), "Focus follows mouse mode"),
            param("input:sensitivity", Float, Some((-1.0, 1.0)), Some("0.0"), "Pointer sensitivity"),
            param("input:numlock_by_default", Bool, None, Some("false"), "Enable numlock on startup"),
            param("input:touchpad:natural_scroll", Bool, None, Some("false"), "Natural touchpad scrolling"),
            param("gestures:workspace_swipe", Bool, None, Some("false"), "Swipe between workspaces"),
            param("gestures:workspace_swipe_invert", Bool, None, Some("true"), "Invert swipe direction"),
            param("misc:disable_hyprland_logo", Bool, None, Some("false"), "Hide the default wallpaper logo"),
            param("misc:vfr", Bool, None, Some("true"), "Variable frame rate"),
            param("monitor", Str, None, None, "Monitor layout line"),
            param("xwayland:force_zero_scaling", Bool, None, Some("false"), "Do not scale XWayland windows"),
        ])
    }
}

fn param(
    full_path: &str,
    param_type: ParamType,
    range: Option<(f64, f64)>,
    default_value: Option<&str>,
    description: &str,
) -> ParamDescriptor {
    let (section, name) = match full_path.rsplit_once(':') {
        Some((section, name)) => (section, name),
        None => ("", full_path),
    };
    ParamDescriptor {
        full_path: full_path.to_string(),
        name: name.to_string(),
        section: section.to_string(),
        param_type,
        min: range.map(|(min, _)| min),
        max: range.map(|(_, max)| max),
        options: Vec::new(),
        default_value: default_value.map(str::to_string),
        description: description.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_splits_sections() {
        let catalog = ParamCatalog::builtin();
        let blur = catalog.get("decoration:blur:size").unwrap();
        assert_eq!(blur.section, "decoration:blur");
        assert_eq!(blur.name, "size");

        let monitor = catalog.get("monitor").unwrap();
        assert_eq!(monitor.section, "");
        assert_eq!(monitor.default_value, None);
    }

    #[test]
    fn test_unknown_path() {
        assert!(ParamCatalog::builtin().get("general:nonexistent").is_none());
        assert!(ParamCatalog::default().is_empty());
    }
}
