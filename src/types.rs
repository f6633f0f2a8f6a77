use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Remove a trailing `#` comment and surrounding whitespace from a raw value.
///
/// A `#` only starts a comment at the beginning of the value or after
/// whitespace, so `rgba(33ccffee)` and `a#b` survive untouched.
/// Applying it twice yields the same result as applying it once.
pub fn strip_comment(raw: &str) -> &str {
    let bytes = raw.as_bytes();
    let cut = bytes
        .iter()
        .enumerate()
        .find(|&(i, &b)| b == b'#' && (i == 0 || bytes[i - 1].is_ascii_whitespace()))
        .map(|(i, _)| i)
        .unwrap_or(bytes.len());
    raw[..cut].trim()
}

/// Value type of a compositor parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    Bool,
    Int,
    Float,
    Str,
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParamType::Bool => "bool",
            ParamType::Int => "int",
            ParamType::Float => "float",
            ParamType::Str => "str",
        };
        f.write_str(name)
    }
}

/// Immutable description of one compositor parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamDescriptor {
    /// Stable key, e.g. `general:gaps_in`
    pub full_path: String,
    pub name: String,
    pub section: String,
    #[serde(rename = "type")]
    pub param_type: ParamType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default)]
    pub description: String,
}

impl ParamDescriptor {
    /// Describe why `value` does not fit this parameter, if it doesn't.
    /// Empty values always fit (they mean "no override").
    pub fn check(&self, value: &str) -> Option<String> {
        let value = strip_comment(value);
        if value.is_empty() {
            return None;
        }

        if !self.options.is_empty() && !self.options.iter().any(|o| o == value) {
            return Some(format!("expected one of {:?}", self.options));
        }

        let number = match self.param_type {
            ParamType::Bool => {
                return match value {
                    "true" | "false" | "yes" | "no" | "on" | "off" | "1" | "0" => None,
                    _ => Some("expected a boolean".to_string()),
                };
            }
            ParamType::Str => return None,
            ParamType::Int => match value.parse::<i64>() {
                Ok(n) => n as f64,
                Err(_) => return Some("expected an integer".to_string()),
            },
            ParamType::Float => match value.parse::<f64>() {
                Ok(n) => n,
                Err(_) => return Some("expected a number".to_string()),
            },
        };

        if let Some(min) = self.min.filter(|&min| number < min) {
            return Some(format!("below minimum {min}"));
        }
        if let Some(max) = self.max.filter(|&max| number > max) {
            return Some(format!("above maximum {max}"));
        }
        None
    }
}

/// A keybinding override, keyed by `id`. Equality ignores `timestamp`, so
/// re-saving the same binding is not a change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotkeyOverride {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub modifiers: Vec<String>,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub dispatcher: String,
    #[serde(default)]
    pub args: String,
    #[serde(default)]
    pub is_global: bool,
    #[serde(default)]
    pub is_recommended: bool,
    /// Milliseconds since the Unix epoch of the last edit
    #[serde(default)]
    pub timestamp: u64,
}

impl HotkeyOverride {
    pub fn new(id: &str, modifiers: &[&str], key: &str, dispatcher: &str, args: &str) -> Self {
        Self {
            id: id.to_string(),
            modifiers: modifiers.iter().map(|m| m.to_string()).collect(),
            key: key.to_string(),
            dispatcher: dispatcher.to_string(),
            args: args.to_string(),
            is_global: false,
            is_recommended: false,
            timestamp: now_millis(),
        }
    }

    /// `SUPER SHIFT, Q` style combo used in compositor bind lines
    pub fn combo(&self) -> String {
        format!("{}, {}", self.modifiers.join(" "), self.key)
    }

    /// Full `bind = ...` line for this hotkey
    pub fn to_bind_line(&self) -> String {
        if self.args.is_empty() {
            format!("bind = {}, {}", self.combo(), self.dispatcher)
        } else {
            format!("bind = {}, {}, {}", self.combo(), self.dispatcher, self.args)
        }
    }
}

impl PartialEq for HotkeyOverride {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.modifiers == other.modifiers
            && self.key == other.key
            && self.dispatcher == other.dispatcher
            && self.args == other.args
            && self.is_global == other.is_global
            && self.is_recommended == other.is_recommended
    }
}

impl Eq for HotkeyOverride {}

pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_comment_removes_trailing_comment() {
        assert_eq!(strip_comment("  5   # inner gap"), "5");
        assert_eq!(strip_comment("# only a comment"), "");
        assert_eq!(strip_comment("rgba(33ccffee)"), "rgba(33ccffee)");
    }

    #[test]
    fn test_strip_comment_keeps_embedded_hash() {
        assert_eq!(strip_comment("a#b"), "a#b");
        assert_eq!(strip_comment("a#b #c"), "a#b");
    }

    #[test]
    fn test_strip_comment_idempotent() {
        for raw in ["  10 # x", "a#b #c", "", "   ", "#", "x\t#y", "kitty --class a#b"] {
            let once = strip_comment(raw);
            assert_eq!(strip_comment(once), once, "not idempotent for {raw:?}");
        }
    }

    #[test]
    fn test_descriptor_check_int_bounds() {
        let desc = ParamDescriptor {
            full_path: "general:gaps_in".to_string(),
            name: "gaps_in".to_string(),
            section: "general".to_string(),
            param_type: ParamType::Int,
            min: Some(0.0),
            max: Some(100.0),
            options: Vec::new(),
            default_value: Some("5".to_string()),
            description: String::new(),
        };

        assert_eq!(desc.check("10"), None);
        assert_eq!(desc.check(""), None);
        assert!(desc.check("abc").is_some());
        assert!(desc.check("250").is_some());
        assert!(desc.check("-1").is_some());
    }

    #[test]
    fn test_hotkey_bind_line() {
        let hotkey = HotkeyOverride::new("terminal", &["SUPER"], "Return", "exec", "kitty");
        assert_eq!(hotkey.to_bind_line(), "bind = SUPER, Return, exec, kitty");

        let close = HotkeyOverride::new("close", &["SUPER", "SHIFT"], "Q", "killactive", "");
        assert_eq!(close.to_bind_line(), "bind = SUPER SHIFT, Q, killactive");
    }

    #[test]
    fn test_hotkey_equality_ignores_timestamp() {
        let mut earlier = HotkeyOverride::new("terminal", &["SUPER"], "Return", "exec", "kitty");
        earlier.timestamp = 1;
        let mut later = earlier.clone();
        later.timestamp = 2;
        assert_eq!(earlier, later);

        later.args = "foot".to_string();
        assert_ne!(earlier, later);
    }
}
