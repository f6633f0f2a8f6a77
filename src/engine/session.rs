//! One editing surface
//!
//! An [`EditingSession`] owns the layers for one scope (a rice, or the global
//! settings surface) and wires every mutation to persistence, the event bus
//! and the realtime scheduler. Sessions never share maps; they converge
//! through [`BusEvent`]s drained in [`EditingSession::pump_events`].

use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::autodetect::{detect_values, AutoDetectOverlay, SystemProbe};
use super::promotion::Promotions;
use super::realtime::{Clock, LiveApply, RealtimeScheduler};
use super::store::{GlobalLayer, HotkeyStore, OverrideValue, ValueStore};
use crate::catalog::ParamCatalog;
use crate::classifier::{classify_text, scrape_params};
use crate::config::{OverrideStorage, Recommendation, RecommendationKind, RecommendationsFile, ScopeOverrides};
use crate::constants::{scope as scope_names, settings as keys};
use crate::events::{BusEvent, EventBus, GlobalOverridesChanged, Subscription};
use crate::types::{now_millis, HotkeyOverride};

/// What a session edits
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// The global-settings surface; edits go straight to the global layer
    Global,
    Rice(String),
}

impl Scope {
    pub fn parse(name: &str) -> Self {
        if name == scope_names::GLOBAL {
            Scope::Global
        } else {
            Scope::Rice(name.to_string())
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Scope::Global => scope_names::GLOBAL,
            Scope::Rice(name) => name,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Collaborators shared by every session of one process
#[derive(Clone)]
pub struct SessionContext {
    pub storage: Rc<dyn OverrideStorage>,
    pub applier: Rc<dyn LiveApply>,
    pub clock: Rc<dyn Clock>,
    pub catalog: Rc<ParamCatalog>,
    pub bus: EventBus,
}

pub struct EditingSession {
    scope: Scope,
    /// Unique per open surface, carried on published events
    emitter: String,
    params: ValueStore,
    hotkeys: HotkeyStore,
    param_promotions: Promotions<String>,
    hotkey_promotions: Promotions<HotkeyOverride>,
    recommendations: RecommendationsFile,
    autodetect: AutoDetectOverlay,
    /// One-shot scan requested by `autoDetectSystemParams`, run by the host
    /// after the surface opens
    auto_detect_pending: bool,
    realtime: RealtimeScheduler,
    ctx: SessionContext,
    subscription: Subscription,
}

impl EditingSession {
    /// Build the layers for `scope` from storage and subscribe to the bus
    pub fn open(scope: Scope, ctx: SessionContext) -> Self {
        let storage = Rc::clone(&ctx.storage);
        let subscription = ctx.bus.subscribe();
        let emitter = format!("{}#{}", scope, subscription.id());

        let (original_params, original_hotkeys) = match &scope {
            Scope::Rice(name) => match storage.read_theme_config(name) {
                Some(text) => (scrape_params(&text), classify_text(&text).theme_hotkeys()),
                None => {
                    debug!(scope = %name, "rice has no config, originals are empty");
                    Default::default()
                }
            },
            Scope::Global => Default::default(),
        };
        let stored = match &scope {
            Scope::Rice(name) => storage.read_overrides(name),
            Scope::Global => ScopeOverrides::default(),
        };

        let recommendations = storage.read_recommendations();
        let enabled = recommendations.enabled_only();
        let mut global_params = storage.read_global_hyprland();
        let mut global_hotkeys = storage.read_global_hotkeys();
        merge_recommended(&mut global_params, enabled.param_overrides);
        merge_recommended(&mut global_hotkeys, enabled.hotkeys);

        let mut realtime =
            RealtimeScheduler::new(Duration::from_millis(storage.realtime_debounce_ms()));
        if storage.realtime_enabled() {
            realtime.resume();
        }
        let auto_detect_pending = matches!(scope, Scope::Rice(_)) && storage.auto_detect_enabled();

        let params = ValueStore::new(original_params, stored.params, global_params);
        let hotkeys = HotkeyStore::new(original_hotkeys, stored.hotkeys, global_hotkeys);

        info!(
            scope = %scope,
            emitter = %emitter,
            originals = params.originals().len(),
            overrides = params.current_overrides().len(),
            global = params.global_layer().overrides.len(),
            theme_hotkeys = hotkeys.originals().len(),
            "Opened editing session"
        );

        Self {
            scope,
            emitter,
            params,
            hotkeys,
            param_promotions: Promotions::new(),
            hotkey_promotions: Promotions::new(),
            recommendations,
            autodetect: AutoDetectOverlay::new(),
            auto_detect_pending,
            realtime,
            ctx,
            subscription,
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn emitter(&self) -> &str {
        &self.emitter
    }

    pub fn params(&self) -> &ValueStore {
        &self.params
    }

    pub fn hotkeys(&self) -> &HotkeyStore {
        &self.hotkeys
    }

    pub fn recommendations(&self) -> &RecommendationsFile {
        &self.recommendations
    }

    pub fn extra_lines(&self) -> &[String] {
        &self.recommendations.extra_lines
    }

    pub fn realtime(&self) -> &RealtimeScheduler {
        &self.realtime
    }

    // ===== Parameters =====

    pub fn get(&self, path: &str) -> Option<String> {
        self.params.get(path)
    }

    pub fn is_overridden(&self, path: &str) -> bool {
        self.params.is_overridden(path)
    }

    pub fn placeholder_for(&self, path: &str) -> String {
        self.params.placeholder_for(path, &self.ctx.catalog)
    }

    /// Set (or with an empty value, clear) this scope's override for `path`.
    /// Returns false when nothing changed.
    pub fn set(&mut self, path: &str, value: &str) -> bool {
        if self.scope == Scope::Global {
            return self.set_global(path, value);
        }
        self.warn_on_mismatch(path, value);
        self.autodetect.unmark(path);

        if !self.params.set(path, Some(value.to_string())) {
            return false;
        }
        debug!(scope = %self.scope, path = %path, value = %value, "set override");
        self.persist_scope();
        self.queue_live(path);
        true
    }

    /// Drop every per-scope override. Returns how many were removed.
    pub fn clear_all(&mut self) -> usize {
        let params = self.params.clear_current();
        let hotkeys = self.hotkeys.clear_current();
        self.autodetect.clear();
        if params.is_empty() && hotkeys.is_empty() {
            return 0;
        }

        info!(scope = %self.scope, params = params.len(), hotkeys = hotkeys.len(), "cleared overrides");
        self.persist_scope();
        for path in &params {
            self.queue_live(path);
        }
        params.len() + hotkeys.len()
    }

    /// Edit the global layer directly, as the global-settings surface does
    pub fn set_global(&mut self, path: &str, value: &str) -> bool {
        self.warn_on_mismatch(path, value);
        let initiator = self.scope.name().to_string();
        if !self.params.set_global(path, Some(value.to_string()), &initiator) {
            return false;
        }
        debug!(path = %path, value = %value, initiator = %initiator, "set global override");
        self.sync_global_params();
        self.queue_resolved(path);
        true
    }

    pub fn can_promote(&self, path: &str) -> bool {
        self.scope != Scope::Global && Promotions::can_promote(&self.params, path, self.scope.name())
    }

    /// Promote this scope's value for `path` to every rice, then fall back to
    /// it. Returns the promoted value.
    pub fn promote(&mut self, path: &str) -> Option<String> {
        if self.scope == Scope::Global {
            return None;
        }
        let value = self
            .param_promotions
            .promote(&mut self.params, path, self.scope.name())?;
        self.sync_global_params();
        self.use_global(path);
        Some(value)
    }

    /// Discard this scope's override so the global or theme value applies.
    /// Returns the value now in effect.
    pub fn use_global(&mut self, path: &str) -> Option<String> {
        let had_override = self.params.is_overridden(path);
        let effective = Promotions::use_global(&mut self.params, path);
        if had_override {
            self.persist_scope();
            self.queue_resolved(path);
        }
        effective
    }

    /// Undo every promotion since the last commit, for params and hotkeys
    pub fn rollback(&mut self) -> bool {
        let mut touched: BTreeSet<String> =
            self.params.global_layer().overrides.keys().cloned().collect();
        let params = self.param_promotions.rollback(&mut self.params);
        if params {
            self.sync_global_params();
            touched.extend(self.params.global_layer().overrides.keys().cloned());
            for path in &touched {
                self.queue_resolved(path);
            }
        }
        let hotkeys = self.hotkey_promotions.rollback(&mut self.hotkeys);
        if hotkeys {
            self.sync_global_hotkeys();
        }
        params || hotkeys
    }

    pub fn commit(&mut self) {
        self.param_promotions.commit();
        self.hotkey_promotions.commit();
    }

    // ===== Hotkeys =====

    pub fn hotkey(&self, id: &str) -> Option<HotkeyOverride> {
        self.hotkeys.get(id)
    }

    /// Set or clear this scope's override for hotkey `id`
    pub fn set_hotkey(&mut self, id: &str, hotkey: Option<HotkeyOverride>) -> bool {
        if self.scope == Scope::Global {
            return self.set_global_hotkey(id, hotkey);
        }
        let hotkey = hotkey.map(|hk| stamp(hk, id));
        if !self.hotkeys.set(id, hotkey) {
            return false;
        }
        debug!(scope = %self.scope, id = %id, "set hotkey override");
        self.persist_scope();
        true
    }

    pub fn set_global_hotkey(&mut self, id: &str, hotkey: Option<HotkeyOverride>) -> bool {
        let hotkey = hotkey.map(|hk| {
            let mut hk = stamp(hk, id);
            hk.is_global = true;
            hk
        });
        let initiator = self.scope.name().to_string();
        if !self.hotkeys.set_global(id, hotkey, &initiator) {
            return false;
        }
        self.sync_global_hotkeys();
        true
    }

    pub fn can_promote_hotkey(&self, id: &str) -> bool {
        self.scope != Scope::Global && Promotions::can_promote(&self.hotkeys, id, self.scope.name())
    }

    pub fn promote_hotkey(&mut self, id: &str) -> Option<HotkeyOverride> {
        if self.scope == Scope::Global {
            return None;
        }
        let hotkey = self
            .hotkey_promotions
            .promote(&mut self.hotkeys, id, self.scope.name())?;
        self.sync_global_hotkeys();
        self.use_global_hotkey(id);
        Some(hotkey)
    }

    pub fn use_global_hotkey(&mut self, id: &str) -> Option<HotkeyOverride> {
        let had_override = self.hotkeys.is_overridden(id);
        let effective = Promotions::use_global(&mut self.hotkeys, id);
        if had_override {
            self.persist_scope();
        }
        effective
    }

    // ===== Realtime apply =====

    /// Persist the realtime preference. Turning it on replays every resolved
    /// override; returns the number of keywords pushed.
    pub fn set_realtime_enabled(&mut self, enabled: bool) -> usize {
        self.ctx
            .storage
            .set_setting(keys::APPLY_OVERRIDES_REALTIME, Value::Bool(enabled));
        if enabled {
            let resolved = self.params.resolved_overrides();
            self.realtime.enable(&resolved, self.ctx.applier.as_ref())
        } else {
            self.realtime.disable();
            0
        }
    }

    /// Fire the debounce timer if it is due
    pub fn poll_realtime(&mut self) -> usize {
        let now = self.ctx.clock.now();
        let params = &self.params;
        self.realtime
            .poll(now, |path| params.original(path), self.ctx.applier.as_ref())
    }

    /// Push queued values now, ignoring the debounce window
    pub fn flush_realtime(&mut self) -> usize {
        let params = &self.params;
        self.realtime
            .flush(|path| params.original(path), self.ctx.applier.as_ref())
    }

    pub fn next_realtime_deadline(&self) -> Option<Instant> {
        self.realtime.next_deadline()
    }

    /// Push every resolved override once, whether or not realtime is on
    pub fn apply_now(&self) -> usize {
        RealtimeScheduler::replay(&self.params.resolved_overrides(), self.ctx.applier.as_ref())
    }

    /// Queue this scope's own override for `path`. A cleared key queues an
    /// empty value, which restores the theme's original on fire.
    fn queue_live(&mut self, path: &str) {
        let value = self.params.current(path).cloned().unwrap_or_default();
        let now = self.ctx.clock.now();
        self.realtime.enqueue(path, &value, now);
    }

    /// Queue the scope-visible value after the global layer moved under it
    fn queue_resolved(&mut self, path: &str) {
        let value = self
            .params
            .current(path)
            .or_else(|| self.params.global(path))
            .cloned()
            .unwrap_or_default();
        let now = self.ctx.clock.now();
        self.realtime.enqueue(path, &value, now);
    }

    // ===== Cross-surface sync =====

    /// Apply global snapshots published by other surfaces.
    /// Returns how many events were applied.
    pub fn pump_events(&mut self) -> usize {
        let mut applied = 0;
        for event in self.subscription.drain() {
            if event.emitter() == self.emitter {
                continue;
            }
            debug!(scope = %self.scope, event = event.name(), from = event.emitter(), "received event");
            match event {
                BusEvent::HyprlandGlobalOverridesChanged(change) => {
                    self.params.replace_global(change.into_layer());
                }
                BusEvent::HotkeyGlobalOverridesChanged(change) => {
                    self.hotkeys.replace_global(change.into_layer());
                }
            }
            applied += 1;
        }

        if applied > 0 {
            self.reload_current();
        }
        applied
    }

    /// Another surface may have rewritten this rice's overrides
    fn reload_current(&mut self) {
        if let Scope::Rice(name) = &self.scope {
            let stored = self.ctx.storage.read_overrides(name);
            self.params.replace_current(stored.params);
            self.hotkeys.replace_current(stored.hotkeys);
        }
    }

    fn sync_global_params(&self) {
        let layer = self.params.global_layer();
        if !self.ctx.storage.write_global_hyprland(layer) {
            warn!(scope = %self.scope, "global overrides not persisted, keeping in-memory state");
        }
        self.ctx.bus.publish(BusEvent::HyprlandGlobalOverridesChanged(
            GlobalOverridesChanged::from_layer(layer, &self.emitter),
        ));
    }

    fn sync_global_hotkeys(&self) {
        let layer = self.hotkeys.global_layer();
        if !self.ctx.storage.write_global_hotkeys(layer) {
            warn!(scope = %self.scope, "global hotkeys not persisted, keeping in-memory state");
        }
        self.ctx.bus.publish(BusEvent::HotkeyGlobalOverridesChanged(
            GlobalOverridesChanged::from_layer(layer, &self.emitter),
        ));
    }

    fn persist_scope(&self) -> bool {
        let Scope::Rice(name) = &self.scope else {
            return true;
        };
        let overrides = ScopeOverrides {
            params: self.params.current_overrides().clone(),
            hotkeys: self.hotkeys.current_overrides().clone(),
        };
        self.ctx.storage.write_overrides(name, &overrides)
    }

    fn warn_on_mismatch(&self, path: &str, value: &str) {
        if let Some(problem) = self.ctx.catalog.get(path).and_then(|d| d.check(value)) {
            warn!(path = %path, value = %value, problem = %problem, "value does not fit parameter");
        }
    }

    // ===== Auto-detect =====

    /// Whether the user asked for auto-detect when a surface opens
    pub fn auto_detect_enabled(&self) -> bool {
        self.ctx.storage.auto_detect_enabled()
    }

    /// Persist `autoDetectSystemParams`. Affects sessions opened afterwards.
    pub fn set_auto_detect_enabled(&self, enabled: bool) -> bool {
        self.ctx
            .storage
            .set_setting(keys::AUTO_DETECT_SYSTEM_PARAMS, Value::Bool(enabled))
    }

    pub fn auto_detect_pending(&self) -> bool {
        self.auto_detect_pending
    }

    /// Drop the scan scheduled at open, if it has not run yet
    pub fn cancel_auto_detect(&mut self) {
        if std::mem::take(&mut self.auto_detect_pending) {
            debug!(scope = %self.scope, "deferred auto-detect cancelled");
        }
    }

    /// Run the scan scheduled at open. A no-op unless `autoDetectSystemParams`
    /// was on when the session opened, and after the first call.
    pub fn run_deferred_auto_detect(&mut self, probe: &dyn SystemProbe) -> usize {
        if !std::mem::take(&mut self.auto_detect_pending) {
            return 0;
        }
        self.run_auto_detect(probe)
    }

    /// Seed monitor and keyboard values from the host. Runs once per session;
    /// never overwrites a value the user set. Returns how many were seeded.
    pub fn run_auto_detect(&mut self, probe: &dyn SystemProbe) -> usize {
        if self.scope == Scope::Global {
            debug!("auto-detect only applies to rices");
            return 0;
        }
        if !self.autodetect.try_begin() {
            debug!(scope = %self.scope, "auto-detect already ran or is running");
            return 0;
        }

        let mut seeded = 0;
        for (path, value) in detect_values(probe) {
            if self.params.is_overridden(&path) && !self.autodetect.is_auto_detected(&path) {
                debug!(path = %path, "keeping user value over detected one");
                continue;
            }
            if self.params.set(&path, Some(value)) {
                self.queue_live(&path);
                seeded += 1;
            }
            self.autodetect.mark(&path);
        }

        if seeded > 0 {
            self.persist_scope();
        }
        self.autodetect.finish();
        info!(scope = %self.scope, seeded, "auto-detect finished");
        seeded
    }

    pub fn is_auto_detected(&self, path: &str) -> bool {
        self.autodetect.is_auto_detected(path)
    }

    pub fn is_scanning(&self) -> bool {
        self.autodetect.is_scanning()
    }

    // ===== Recommendations =====

    pub fn is_recommendation_enabled(&self, recommendation: &Recommendation) -> bool {
        self.recommendations.is_enabled(recommendation.id())
    }

    /// Apply or withdraw one recommendation and rewrite the recommendations
    /// file. Withdrawing only removes global values the recommendation itself
    /// wrote.
    pub fn set_recommendation(&mut self, recommendation: &Recommendation, enabled: bool) -> bool {
        let id = recommendation.id().to_string();
        if self.recommendations.is_enabled(&id) == enabled {
            return false;
        }

        match &recommendation.kind {
            RecommendationKind::Param { path, value } => {
                self.recommendations.state.insert(id, enabled);
                let changed = if enabled {
                    self.recommendations
                        .param_overrides
                        .insert(path.clone(), value.clone());
                    self.params
                        .set_global(path, Some(value.clone()), scope_names::RECOMMENDATIONS)
                } else {
                    self.recommendations.param_overrides.remove(path);
                    self.params.initiator(path) == Some(scope_names::RECOMMENDATIONS)
                        && self.params.set_global(path, None, scope_names::RECOMMENDATIONS)
                };
                if changed {
                    self.sync_global_params();
                    self.queue_resolved(path);
                }
            }
            RecommendationKind::Hotkey(hotkey) => {
                self.recommendations.state.insert(id.clone(), enabled);
                let changed = if enabled {
                    let mut hotkey = stamp(hotkey.clone(), &id);
                    hotkey.is_global = true;
                    hotkey.is_recommended = true;
                    self.recommendations.hotkeys.insert(id.clone(), hotkey.clone());
                    self.hotkeys
                        .set_global(&id, Some(hotkey), scope_names::RECOMMENDATIONS)
                } else {
                    self.recommendations.hotkeys.remove(&id);
                    self.hotkeys.initiator(&id) == Some(scope_names::RECOMMENDATIONS)
                        && self.hotkeys.set_global(&id, None, scope_names::RECOMMENDATIONS)
                };
                if changed {
                    self.sync_global_hotkeys();
                }
            }
            RecommendationKind::ExtraLine(line) => {
                return if enabled {
                    self.add_extra_line(line)
                } else {
                    self.remove_extra_line(line)
                };
            }
        }

        info!(recommendation = %recommendation.title, enabled, "recommendation toggled");
        self.write_recommendations();
        true
    }

    /// Append a config line; duplicates are ignored
    pub fn add_extra_line(&mut self, line: &str) -> bool {
        let line = line.trim();
        if line.is_empty() || self.recommendations.extra_lines.iter().any(|l| l == line) {
            return false;
        }
        self.recommendations.extra_lines.push(line.to_string());
        self.recommendations.state.insert(line.to_string(), true);
        self.write_recommendations();
        true
    }

    pub fn remove_extra_line(&mut self, line: &str) -> bool {
        let line = line.trim();
        let before = self.recommendations.extra_lines.len();
        self.recommendations.extra_lines.retain(|l| l != line);
        if self.recommendations.extra_lines.len() == before {
            return false;
        }
        self.recommendations.state.remove(line);
        self.write_recommendations();
        true
    }

    fn write_recommendations(&self) {
        if !self.ctx.storage.write_recommendations(&self.recommendations) {
            warn!("recommendations not persisted, keeping in-memory state");
        }
    }
}

impl Drop for EditingSession {
    fn drop(&mut self) {
        self.realtime.cancel();
        debug!(scope = %self.scope, emitter = %self.emitter, "closed editing session");
    }
}

/// Fill keys the global layer does not have yet with recommended values
fn merge_recommended<V: OverrideValue>(layer: &mut GlobalLayer<V>, recommended: BTreeMap<String, V>) {
    for (key, value) in recommended {
        if layer.overrides.contains_key(&key) {
            continue;
        }
        layer
            .initiators
            .insert(key.clone(), scope_names::RECOMMENDATIONS.to_string());
        layer.overrides.insert(key, value);
    }
}

fn stamp(mut hotkey: HotkeyOverride, id: &str) -> HotkeyOverride {
    hotkey.id = id.to_string();
    hotkey.timestamp = now_millis();
    hotkey
}
