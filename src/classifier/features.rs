//! Boolean feature flags read from raw config lines
//!
//! Each feature has up to three kinds of evidence. An explicit line wins over
//! an animation that implies the feature, which wins over a bare flag.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

use crate::types::strip_comment;

/// `gesture = 3, horizontal, workspace`
static GESTURE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^gesture\s*=\s*\d+\s*,\s*(horizontal|vertical)\s*,\s*workspace\b")
        .expect("gesture regex")
});

/// `animation = workspaces, 1, 6, default, slidevert`
static WORKSPACE_ANIMATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^animation\s*=\s*workspaces\s*,\s*([01])\s*,.*\b(slidefadevert|slidevert|slidefade|slide)\b")
        .expect("animation regex")
});

/// `workspace_swipe = true`, bare or as `gestures:workspace_swipe`
static SWIPE_FLAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:gestures:)?workspace_swipe\s*=\s*(\S+)").expect("swipe flag regex")
});

/// `bindm = SUPER, mouse:273, resizewindow` or `binde = ..., resizeactive, ...`
static RESIZE_BIND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^bind[a-z]*\s*=.*,\s*(resizewindow|resizeactive)\b").expect("resize bind regex")
});

/// `resize_on_border = true`
static RESIZE_FLAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:general:)?resize_on_border\s*=\s*(\S+)").expect("resize flag regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SwipeDirection {
    Horizontal,
    Vertical,
}

/// Which kind of evidence decided a feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetectionSource {
    ExplicitLine,
    Animation,
    Flag,
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SwipeDetection {
    pub enabled: bool,
    pub direction: Option<SwipeDirection>,
    pub source: DetectionSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResizeDetection {
    pub available: bool,
    pub source: DetectionSource,
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim_end_matches(',').to_ascii_lowercase().as_str(),
        "true" | "yes" | "on" | "1"
    )
}

fn lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(strip_comment).filter(|line| !line.is_empty())
}

pub fn detect_swipe(text: &str) -> SwipeDetection {
    let mut explicit = None;
    let mut animation = None;
    let mut flag = None;

    // Later lines override earlier ones, as the compositor reads them
    for line in lines(text) {
        if let Some(caps) = GESTURE_LINE.captures(line) {
            explicit = Some(match &caps[1] {
                "vertical" => SwipeDirection::Vertical,
                _ => SwipeDirection::Horizontal,
            });
        } else if let Some(caps) = WORKSPACE_ANIMATION.captures(line) {
            animation = (&caps[1] == "1").then(|| {
                if caps[2].ends_with("vert") {
                    SwipeDirection::Vertical
                } else {
                    SwipeDirection::Horizontal
                }
            });
        } else if let Some(caps) = SWIPE_FLAG.captures(line) {
            flag = Some(parse_flag(&caps[1]));
        }
    }

    if let Some(direction) = explicit {
        return SwipeDetection {
            enabled: true,
            direction: Some(direction),
            source: DetectionSource::ExplicitLine,
        };
    }
    if let Some(direction) = animation {
        return SwipeDetection {
            enabled: flag.unwrap_or(false),
            direction: Some(direction),
            source: DetectionSource::Animation,
        };
    }
    match flag {
        Some(enabled) => SwipeDetection {
            enabled,
            direction: enabled.then_some(SwipeDirection::Horizontal),
            source: DetectionSource::Flag,
        },
        None => SwipeDetection {
            enabled: false,
            direction: None,
            source: DetectionSource::NotFound,
        },
    }
}

pub fn detect_manual_resize(text: &str) -> ResizeDetection {
    let mut flag = None;
    for line in lines(text) {
        if RESIZE_BIND.is_match(line) {
            return ResizeDetection {
                available: true,
                source: DetectionSource::ExplicitLine,
            };
        }
        if let Some(caps) = RESIZE_FLAG.captures(line) {
            flag = Some(parse_flag(&caps[1]));
        }
    }

    match flag {
        Some(available) => ResizeDetection {
            available,
            source: DetectionSource::Flag,
        },
        None => ResizeDetection {
            available: false,
            source: DetectionSource::NotFound,
        },
    }
}
