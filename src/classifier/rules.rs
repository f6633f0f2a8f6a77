//! Scoring rules for semantic keybinding actions
//!
//! Each action is a plain data record processed by [`score`]. Weights reflect
//! how distinctive a signal is: a dedicated dispatcher (`killactive`) is
//! conclusive, a generic word in a command line is only a hint.

use serde::Serialize;
use std::fmt;

use super::parser::HotkeyRecord;
use super::tokenize::tokenize;
use crate::constants::scoring;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SemanticAction {
    Terminal,
    FileManager,
    Screenshot,
    CloseWindow,
    Fullscreen,
    SingleWindow,
    MoveWindow,
    MoveToWorkspace,
    ManualResize,
    ShortcutsList,
}

impl SemanticAction {
    pub const ALL: [SemanticAction; 10] = [
        SemanticAction::Terminal,
        SemanticAction::FileManager,
        SemanticAction::Screenshot,
        SemanticAction::CloseWindow,
        SemanticAction::Fullscreen,
        SemanticAction::SingleWindow,
        SemanticAction::MoveWindow,
        SemanticAction::MoveToWorkspace,
        SemanticAction::ManualResize,
        SemanticAction::ShortcutsList,
    ];

    /// Stable id, also used as the hotkey override id
    pub fn id(&self) -> &'static str {
        match self {
            SemanticAction::Terminal => "terminal",
            SemanticAction::FileManager => "file-manager",
            SemanticAction::Screenshot => "screenshot",
            SemanticAction::CloseWindow => "close-window",
            SemanticAction::Fullscreen => "fullscreen",
            SemanticAction::SingleWindow => "single-window",
            SemanticAction::MoveWindow => "move-window",
            SemanticAction::MoveToWorkspace => "move-to-workspace",
            SemanticAction::ManualResize => "manual-resize",
            SemanticAction::ShortcutsList => "shortcuts",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.id() == id)
    }

    pub fn rule(&self) -> &'static ActionRule {
        &RULES[*self as usize]
    }
}

impl fmt::Display for SemanticAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Which argument strings a dispatcher match accepts
#[derive(Debug, Clone, Copy)]
pub enum ArgsMatch {
    Any,
    OneOf(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy)]
pub struct DispatcherMatch {
    pub name: &'static str,
    pub args: ArgsMatch,
    pub weight: i32,
}

const fn dispatcher(name: &'static str, weight: i32) -> DispatcherMatch {
    DispatcherMatch { name, args: ArgsMatch::Any, weight }
}

const fn dispatcher_with(name: &'static str, args: &'static [&'static str], weight: i32) -> DispatcherMatch {
    DispatcherMatch { name, args: ArgsMatch::OneOf(args), weight }
}

#[derive(Debug)]
pub struct ActionRule {
    pub action: SemanticAction,
    /// Program names compared with the tokens of `exec` commands
    pub keywords: &'static [&'static str],
    /// Substrings of the lowercased `dispatcher args` text
    pub substrings: &'static [(&'static str, i32)],
    pub dispatchers: &'static [DispatcherMatch],
    /// Modifiers/keys a conventional binding for this action uses
    pub tiebreak_hints: &'static [&'static str],
}

/// One rule per action, in declaration order of [`SemanticAction`]
pub static RULES: [ActionRule; SemanticAction::ALL.len()] = [
    ActionRule {
        action: SemanticAction::Terminal,
        keywords: &[
            "kitty", "alacritty", "foot", "footclient", "wezterm", "ghostty", "konsole",
            "gnome-terminal", "kgx", "xfce4-terminal", "terminator", "tilix", "xterm", "urxvt",
            "st", "rio", "warp-terminal",
        ],
        substrings: &[("terminal", 4)],
        dispatchers: &[],
        tiebreak_hints: &["return", "enter", "t", "q"],
    },
    ActionRule {
        action: SemanticAction::FileManager,
        keywords: &[
            "thunar", "nautilus", "dolphin", "pcmanfm", "pcmanfm-qt", "nemo", "caja", "yazi",
            "ranger", "lf", "nnn", "superfile", "spacefm",
        ],
        substrings: &[("filemanager", 6), ("file-manager", 6), ("files", 4)],
        dispatchers: &[],
        tiebreak_hints: &["e", "f"],
    },
    ActionRule {
        action: SemanticAction::Screenshot,
        keywords: &["grim", "grimblast", "hyprshot", "flameshot", "spectacle", "swappy", "satty"],
        substrings: &[
            ("hyprshot", 30),
            ("grimblast", 30),
            ("flameshot", 30),
            ("screenshot", 6),
            ("grim", 6),
            ("slurp", 4),
        ],
        dispatchers: &[],
        tiebreak_hints: &["print", "s"],
    },
    ActionRule {
        action: SemanticAction::CloseWindow,
        keywords: &[],
        substrings: &[],
        dispatchers: &[
            dispatcher("killactive", 30),
            dispatcher("forcekillactive", 30),
            dispatcher("closewindow", 6),
        ],
        tiebreak_hints: &["q", "c", "super"],
    },
    ActionRule {
        action: SemanticAction::Fullscreen,
        keywords: &[],
        substrings: &[],
        dispatchers: &[
            dispatcher_with("fullscreen", &["", "0"], 30),
            dispatcher("fullscreenstate", 6),
        ],
        tiebreak_hints: &["f", "f11"],
    },
    ActionRule {
        action: SemanticAction::SingleWindow,
        keywords: &[],
        substrings: &[("maximize", 6), ("monocle", 6)],
        dispatchers: &[dispatcher_with("fullscreen", &["1"], 30)],
        tiebreak_hints: &["m", "shift"],
    },
    ActionRule {
        action: SemanticAction::MoveWindow,
        keywords: &[],
        substrings: &[],
        dispatchers: &[dispatcher("movewindow", 30)],
        tiebreak_hints: &["super", "mouse"],
    },
    ActionRule {
        action: SemanticAction::MoveToWorkspace,
        keywords: &[],
        substrings: &[],
        dispatchers: &[
            dispatcher("movetoworkspace", 30),
            dispatcher("movetoworkspacesilent", 30),
        ],
        tiebreak_hints: &["super", "shift"],
    },
    ActionRule {
        action: SemanticAction::ManualResize,
        keywords: &[],
        substrings: &[],
        dispatchers: &[
            dispatcher("resizewindow", 30),
            dispatcher("resizeactive", 6),
            dispatcher_with("submap", &["resize"], 6),
        ],
        tiebreak_hints: &["mouse:273", "super"],
    },
    ActionRule {
        action: SemanticAction::ShortcutsList,
        keywords: &[],
        substrings: &[("keybind", 6), ("cheatsheet", 6), ("shortcut", 6), ("hotkey", 4)],
        dispatchers: &[],
        tiebreak_hints: &["slash", "f1", "question"],
    },
];

/// Score of one record for one rule
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Score {
    /// Keyword and dispatcher evidence; `<= 0` means no match
    pub weight: i32,
    /// Tie bias from conventional modifiers/keys
    pub bias: i32,
}

fn is_exec(dispatcher: &str) -> bool {
    matches!(dispatcher, "exec" | "execr" | "exec-once")
}

pub fn score(rule: &ActionRule, record: &HotkeyRecord) -> Score {
    let dispatcher = record.dispatcher.to_lowercase();
    let args = record.args.trim().to_lowercase();
    let mut weight = 0;

    if is_exec(&dispatcher) && !rule.keywords.is_empty() {
        let tokens = tokenize(&args);
        if let Some(first) = tokens.first() {
            if rule.keywords.contains(&first.as_str()) {
                weight += scoring::FIRST_TOKEN;
            } else if tokens[1..].iter().any(|t| rule.keywords.contains(&t.as_str())) {
                weight += scoring::LATER_TOKEN;
            }
        }
    }

    let text = format!("{dispatcher} {args}");
    weight += rule
        .substrings
        .iter()
        .filter(|(needle, _)| text.contains(needle))
        .map(|(_, w)| w)
        .sum::<i32>();

    weight += rule
        .dispatchers
        .iter()
        .filter(|m| m.name == dispatcher)
        .filter(|m| match m.args {
            ArgsMatch::Any => true,
            ArgsMatch::OneOf(accepted) => accepted.contains(&args.as_str()),
        })
        .map(|m| m.weight)
        .sum::<i32>();

    if weight <= 0 {
        return Score::default();
    }

    let parts = record.combo_parts();
    let bias = rule
        .tiebreak_hints
        .iter()
        .filter(|hint| parts.iter().any(|part| hint_matches(part, hint)))
        .count() as i32
        * scoring::HINT_BIAS;

    Score { weight, bias }
}

/// Single-letter hints must equal the part; longer hints may be contained
/// (`mouse` matches `mouse:272`)
fn hint_matches(part: &str, hint: &str) -> bool {
    if hint.len() <= 1 {
        part == hint
    } else {
        part.contains(hint)
    }
}
