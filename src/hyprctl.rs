//! Adapter for the running compositor and host probes
//!
//! Shells out to `hyprctl` (and keyboard tools as fallback). Every probe is
//! best effort: failures are logged at debug level and read as `None`.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::process::Command;
use tracing::debug;

use crate::constants::commands;
use crate::engine::autodetect::{KeyboardLayout, MonitorInfo, SystemProbe};
use crate::engine::realtime::LiveApply;

/// Live compositor reached through the `hyprctl` binary
#[derive(Debug, Clone, Copy, Default)]
pub struct Hyprctl;

impl LiveApply for Hyprctl {
    fn apply_keyword(&self, path: &str, value: &str) -> Result<()> {
        let output = Command::new(commands::HYPRCTL)
            .args(["keyword", path, value])
            .output()
            .with_context(|| format!("Failed to run hyprctl keyword {path}"))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() || stdout.trim() != commands::HYPRCTL_OK {
            bail!("hyprctl keyword {path} rejected: {}", stdout.trim());
        }
        Ok(())
    }
}

impl SystemProbe for Hyprctl {
    fn monitors(&self) -> Option<Vec<MonitorInfo>> {
        let json = run(commands::HYPRCTL, &["monitors", "-j"])?;
        parse_monitors(&json)
    }

    fn keyboard(&self) -> Option<KeyboardLayout> {
        let option = |name: &str| {
            run(commands::HYPRCTL, &["getoption", name, "-j"])
                .and_then(|json| parse_option(&json))
                .unwrap_or_default()
        };
        let from_compositor = KeyboardLayout {
            layout: option("input:kb_layout"),
            variant: option("input:kb_variant"),
            options: option("input:kb_options"),
        };
        if !from_compositor.layout.is_empty() {
            return Some(from_compositor);
        }

        debug!("compositor has no keyboard layout, trying shell probes");
        run(commands::SETXKBMAP, &["-query"])
            .map(|out| parse_setxkbmap(&out))
            .filter(|kb| !kb.layout.is_empty())
            .or_else(|| {
                run(commands::LOCALECTL, &["status"])
                    .map(|out| parse_localectl(&out))
                    .filter(|kb| !kb.layout.is_empty())
            })
    }
}

/// Run a command and return stdout if it succeeded
fn run(program: &str, args: &[&str]) -> Option<String> {
    match Command::new(program).args(args).output() {
        Ok(output) if output.status.success() => {
            Some(String::from_utf8_lossy(&output.stdout).into_owned())
        }
        Ok(output) => {
            debug!(program, ?args, status = ?output.status, "probe exited with failure");
            None
        }
        Err(e) => {
            debug!(program, ?args, error = %e, "probe could not be started");
            None
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HyprMonitor {
    name: String,
    width: u32,
    height: u32,
    #[serde(default)]
    refresh_rate: f64,
    #[serde(default)]
    x: i32,
    #[serde(default)]
    y: i32,
    #[serde(default = "default_scale")]
    scale: f64,
    #[serde(default)]
    focused: bool,
}

fn default_scale() -> f64 {
    1.0
}

/// Parse `hyprctl monitors -j`
pub fn parse_monitors(json: &str) -> Option<Vec<MonitorInfo>> {
    let monitors: Vec<HyprMonitor> = serde_json::from_str(json)
        .inspect_err(|e| debug!(error = %e, "unexpected monitors json"))
        .ok()?;
    Some(
        monitors
            .into_iter()
            .map(|m| MonitorInfo {
                name: m.name,
                width: m.width,
                height: m.height,
                refresh_rate: m.refresh_rate,
                x: m.x,
                y: m.y,
                scale: m.scale,
                focused: m.focused,
            })
            .collect(),
    )
}

#[derive(Deserialize)]
struct HyprOption {
    #[serde(default, rename = "str")]
    string: Option<String>,
}

/// Parse `hyprctl getoption <name> -j`, returning the string value if set
pub fn parse_option(json: &str) -> Option<String> {
    let option: HyprOption = serde_json::from_str(json).ok()?;
    option
        .string
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && s != "[[EMPTY]]")
}

/// Parse `setxkbmap -query` (`layout:     us`)
pub fn parse_setxkbmap(output: &str) -> KeyboardLayout {
    let mut keyboard = KeyboardLayout::default();
    for line in output.lines() {
        let Some((field, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim().to_string();
        match field.trim() {
            "layout" => keyboard.layout = value,
            "variant" => keyboard.variant = value,
            "options" => keyboard.options = value,
            _ => {}
        }
    }
    keyboard
}

/// Parse `localectl status` (`X11 Layout: us`)
pub fn parse_localectl(output: &str) -> KeyboardLayout {
    let mut keyboard = KeyboardLayout::default();
    for line in output.lines() {
        let Some((field, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim().to_string();
        match field.trim() {
            "X11 Layout" => keyboard.layout = value,
            "X11 Variant" => keyboard.variant = value,
            "X11 Options" => keyboard.options = value,
            _ => {}
        }
    }
    keyboard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_monitors() {
        let json = r#"[
            {"id": 0, "name": "DP-1", "width": 2560, "height": 1440, "refreshRate": 143.99,
             "x": 0, "y": 0, "scale": 1.00, "focused": true},
            {"id": 1, "name": "eDP-1", "width": 1920, "height": 1080, "refreshRate": 60.0,
             "x": 2560, "y": 0, "scale": 1.25, "focused": false}
        ]"#;
        let monitors = parse_monitors(json).unwrap();
        assert_eq!(monitors.len(), 2);
        assert_eq!(monitors[0].to_config_value(), "DP-1,2560x1440@143.99,0x0,1");
        assert_eq!(monitors[1].to_config_value(), "eDP-1,1920x1080@60,2560x0,1.25");
    }

    #[test]
    fn test_parse_monitors_garbage() {
        assert_eq!(parse_monitors("HYPRLAND_INSTANCE_SIGNATURE not set"), None);
    }

    #[test]
    fn test_parse_option() {
        assert_eq!(
            parse_option(r#"{"option": "input:kb_layout", "str": "us,de", "set": true}"#).as_deref(),
            Some("us,de")
        );
        assert_eq!(parse_option(r#"{"option": "input:kb_variant", "str": "", "set": false}"#), None);
        assert_eq!(parse_option(r#"{"option": "input:kb_options", "str": "[[EMPTY]]"}"#), None);
        assert_eq!(parse_option(r#"{"option": "general:gaps_in", "int": 5}"#), None);
    }

    #[test]
    fn test_parse_setxkbmap() {
        let out = "rules:      evdev\nmodel:      pc105\nlayout:     us,ru\nvariant:    ,\noptions:    grp:win_space_toggle\n";
        let keyboard = parse_setxkbmap(out);
        assert_eq!(keyboard.layout, "us,ru");
        assert_eq!(keyboard.variant, ",");
        assert_eq!(keyboard.options, "grp:win_space_toggle");
    }

    #[test]
    fn test_parse_localectl() {
        let out = "   System Locale: LANG=en_US.UTF-8\n       VC Keymap: de\n      X11 Layout: de\n       X11 Model: pc105\n";
        let keyboard = parse_localectl(out);
        assert_eq!(keyboard.layout, "de");
        assert_eq!(keyboard.variant, "");
    }
}
