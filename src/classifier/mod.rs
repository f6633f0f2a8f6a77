//! Heuristic classification of a theme's compositor config
//!
//! Maps bind lines to semantic actions and reads a couple of feature flags.
//! Everything here is a pure function of the input text.

pub mod features;
pub mod parser;
pub mod rules;
pub mod tokenize;

pub use features::{detect_manual_resize, detect_swipe, DetectionSource, ResizeDetection, SwipeDetection, SwipeDirection};
pub use parser::{parse_hotkeys, scrape_params, HotkeyRecord};
pub use rules::{score, SemanticAction, Score};

use serde::Serialize;
use std::collections::BTreeMap;

use crate::types::HotkeyOverride;

/// Best record found for one action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoredMatch {
    pub record: HotkeyRecord,
    pub score: Score,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    /// Actions without a positive score are absent
    pub actions: BTreeMap<SemanticAction, ScoredMatch>,
    pub swipe: SwipeDetection,
    pub manual_resize: ResizeDetection,
}

impl Classification {
    pub fn get(&self, action: SemanticAction) -> Option<&ScoredMatch> {
        self.actions.get(&action)
    }

    /// Matched binds as hotkey overrides keyed by action id
    pub fn theme_hotkeys(&self) -> BTreeMap<String, HotkeyOverride> {
        self.actions
            .iter()
            .map(|(action, found)| (action.id().to_string(), found.record.to_override(action.id())))
            .collect()
    }
}

/// Best record for `action`; on equal score and bias the earlier record stays
pub fn best_match(action: SemanticAction, records: &[HotkeyRecord]) -> Option<ScoredMatch> {
    let rule = action.rule();
    let mut best: Option<ScoredMatch> = None;

    for record in records {
        let score = score(rule, record);
        if score.weight <= 0 {
            continue;
        }
        if best.as_ref().is_none_or(|b| score > b.score) {
            best = Some(ScoredMatch { record: record.clone(), score });
        }
    }
    best
}

pub fn classify(records: &[HotkeyRecord], text: &str) -> Classification {
    let actions = SemanticAction::ALL
        .into_iter()
        .filter_map(|action| best_match(action, records).map(|found| (action, found)))
        .collect();

    Classification {
        actions,
        swipe: detect_swipe(text),
        manual_resize: detect_manual_resize(text),
    }
}

/// Parse binds out of `text` and classify them
pub fn classify_text(text: &str) -> Classification {
    classify(&parse_hotkeys(text), text)
}
