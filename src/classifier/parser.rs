//! Extraction of binds and parameter values from compositor config text

use serde::Serialize;
use std::collections::BTreeMap;

use crate::types::{strip_comment, HotkeyOverride};

/// One `bind*` line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HotkeyRecord {
    /// `bind`, `bindm`, `binde`, ...
    pub bind_type: String,
    pub modifiers: Vec<String>,
    pub key: String,
    pub dispatcher: String,
    pub args: String,
    /// 1-based line number in the source text
    pub line: usize,
}

impl HotkeyRecord {
    pub fn new(modifiers: &[&str], key: &str, dispatcher: &str, args: &str) -> Self {
        Self {
            bind_type: "bind".to_string(),
            modifiers: modifiers.iter().map(|m| m.to_uppercase()).collect(),
            key: key.to_string(),
            dispatcher: dispatcher.to_string(),
            args: args.to_string(),
            line: 0,
        }
    }

    /// Lowercased modifiers followed by the key
    pub fn combo_parts(&self) -> Vec<String> {
        self.modifiers
            .iter()
            .chain(std::iter::once(&self.key))
            .map(|part| part.to_lowercase())
            .collect()
    }

    pub fn is_mouse_bind(&self) -> bool {
        self.bind_type.starts_with("bind") && self.bind_type[4..].contains('m')
    }

    pub fn to_override(&self, id: &str) -> HotkeyOverride {
        HotkeyOverride {
            id: id.to_string(),
            modifiers: self.modifiers.clone(),
            key: self.key.clone(),
            dispatcher: self.dispatcher.clone(),
            args: self.args.clone(),
            is_global: false,
            is_recommended: false,
            timestamp: 0,
        }
    }
}

/// Keywords that may repeat and never name a single parameter
const KEYWORD_LINES: &[&str] = &[
    "animation", "bezier", "env", "exec", "exec-once", "execr", "execr-once", "gesture",
    "layerrule", "plugin", "source", "submap", "unbind", "windowrule", "windowrulev2", "workspace",
];

/// `$name = value` definitions, each resolved against earlier ones
pub fn parse_variables(text: &str) -> BTreeMap<String, String> {
    let mut vars = BTreeMap::new();
    for line in text.lines() {
        let line = strip_comment(line);
        let Some(rest) = line.strip_prefix('$') else {
            continue;
        };
        let Some((name, value)) = rest.split_once('=') else {
            continue;
        };
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        let value = substitute(value.trim(), &vars);
        vars.insert(name.to_string(), value);
    }
    vars
}

/// Replace `$name` references, longest names first so `$term` does not
/// clobber `$terminal`
pub fn substitute(text: &str, vars: &BTreeMap<String, String>) -> String {
    if !text.contains('$') {
        return text.to_string();
    }
    let mut names: Vec<&String> = vars.keys().collect();
    names.sort_by_key(|name| std::cmp::Reverse(name.len()));

    let mut out = text.to_string();
    for name in names {
        out = out.replace(&format!("${name}"), &vars[name]);
    }
    out
}

/// Every bind line in `text`, with variables resolved
pub fn parse_hotkeys(text: &str) -> Vec<HotkeyRecord> {
    let vars = parse_variables(text);
    let mut records = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = strip_comment(raw);
        let Some((lhs, rhs)) = line.split_once('=') else {
            continue;
        };
        let bind_type = lhs.trim();
        let Some(flags) = bind_type.strip_prefix("bind") else {
            continue;
        };
        if !flags.chars().all(|c| c.is_ascii_alphabetic()) {
            continue;
        }

        let rhs = substitute(rhs.trim(), &vars);
        // `bindd` carries a description between key and dispatcher
        let has_description = flags.contains('d');
        let field_count = if has_description { 5 } else { 4 };
        let mut fields: Vec<&str> = rhs.splitn(field_count, ',').map(str::trim).collect();
        if has_description && fields.len() >= 3 {
            fields.remove(2);
        }
        if fields.len() < 3 {
            continue;
        }

        records.push(HotkeyRecord {
            bind_type: bind_type.to_string(),
            modifiers: split_modifiers(fields[0]),
            key: fields[1].to_string(),
            dispatcher: fields[2].to_string(),
            args: fields.get(3).map(|s| s.to_string()).unwrap_or_default(),
            line: index + 1,
        });
    }
    records
}

fn split_modifiers(mods: &str) -> Vec<String> {
    mods.split(|c: char| c.is_whitespace() || c == '_' || c == '&' || c == '+')
        .filter(|m| !m.is_empty())
        .map(str::to_uppercase)
        .collect()
}

/// `section { key = value }` blocks and `section:key = value` lines,
/// flattened to `full_path -> value`. Later assignments win.
pub fn scrape_params(text: &str) -> BTreeMap<String, String> {
    let vars = parse_variables(text);
    let mut params = BTreeMap::new();
    let mut sections: Vec<String> = Vec::new();

    for raw in text.lines() {
        let line = strip_comment(raw);
        if line.is_empty() || line.starts_with('$') {
            continue;
        }

        if let Some(name) = line.strip_suffix('{') {
            sections.push(name.trim().to_string());
            continue;
        }
        if line == "}" {
            sections.pop();
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() || key.starts_with("bind") || KEYWORD_LINES.contains(&key) {
            continue;
        }

        let full_path = if sections.is_empty() {
            key.to_string()
        } else {
            format!("{}:{}", sections.join(":"), key)
        };
        params.insert(full_path, substitute(value.trim(), &vars));
    }
    params
}
