//! Debounced, best-effort push of overrides into the running compositor

use anyhow::Result;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::constants::realtime::DEFAULT_DEBOUNCE_MS;

/// Sets a compositor keyword on the live session
pub trait LiveApply {
    fn apply_keyword(&self, path: &str, value: &str) -> Result<()>;
}

/// Time source for the debounce timer
pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Single-slot cancellable timer. Arming replaces any pending deadline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebounceTimer {
    deadline: Option<Instant>,
}

impl DebounceTimer {
    pub fn arm(&mut self, deadline: Instant) {
        self.deadline = Some(deadline);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Disarm and report true if the deadline has passed
    fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Queue of overrides waiting to be pushed to the compositor
#[derive(Debug)]
pub struct RealtimeScheduler {
    enabled: bool,
    debounce: Duration,
    /// Last written value per path; empty means "cleared"
    pending: BTreeMap<String, String>,
    timer: DebounceTimer,
}

impl Default for RealtimeScheduler {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_DEBOUNCE_MS))
    }
}

impl RealtimeScheduler {
    pub fn new(debounce: Duration) -> Self {
        Self {
            enabled: false,
            debounce,
            pending: BTreeMap::new(),
            timer: DebounceTimer::default(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    pub fn pending(&self) -> &BTreeMap<String, String> {
        &self.pending
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timer.deadline()
    }

    /// Queue `value` for `path` and restart the debounce window.
    /// Ignored while realtime mode is off.
    pub fn enqueue(&mut self, path: &str, value: &str, now: Instant) {
        if !self.enabled {
            return;
        }
        self.pending.insert(path.to_string(), value.to_string());
        self.timer.arm(now + self.debounce);
        debug!(path = %path, pending = self.pending.len(), "queued live apply");
    }

    /// Turn realtime mode on. Switching from off replays every resolved
    /// override once so the compositor catches up with edits made while off.
    /// Returns the number of successful live-apply calls.
    pub fn enable(&mut self, resolved: &BTreeMap<String, String>, applier: &dyn LiveApply) -> usize {
        if self.enabled {
            return 0;
        }
        self.enabled = true;
        info!(count = resolved.len(), "realtime apply enabled, replaying overrides");
        Self::replay(resolved, applier)
    }

    /// Mark realtime mode on without replaying, for a session opened with
    /// the setting already on
    pub fn resume(&mut self) {
        self.enabled = true;
    }

    /// Push every value in `resolved` immediately
    pub fn replay(resolved: &BTreeMap<String, String>, applier: &dyn LiveApply) -> usize {
        resolved
            .iter()
            .filter(|(path, value)| apply_one(applier, path, value))
            .count()
    }

    /// Turn realtime mode off and drop anything still queued
    pub fn disable(&mut self) {
        self.enabled = false;
        self.cancel();
    }

    /// Cancel the timer and forget queued values
    pub fn cancel(&mut self) {
        self.timer.cancel();
        self.pending.clear();
    }

    /// Flush the queue if the debounce window has elapsed.
    /// `baseline` yields the theme's original value for a path.
    pub fn poll(
        &mut self,
        now: Instant,
        baseline: impl Fn(&str) -> Option<String>,
        applier: &dyn LiveApply,
    ) -> usize {
        if !self.timer.fire_if_due(now) {
            return 0;
        }
        self.flush(baseline, applier)
    }

    /// Push every queued value now. A cleared value restores the theme's
    /// original value; paths with neither are skipped.
    pub fn flush(&mut self, baseline: impl Fn(&str) -> Option<String>, applier: &dyn LiveApply) -> usize {
        self.timer.cancel();
        let pending = std::mem::take(&mut self.pending);
        let mut applied = 0;

        for (path, value) in pending {
            let value = if value.is_empty() {
                match baseline(&path).filter(|v| !v.is_empty()) {
                    Some(original) => original,
                    None => {
                        debug!(path = %path, "no override and no theme value, skipping live apply");
                        continue;
                    }
                }
            } else {
                value
            };

            if apply_one(applier, &path, &value) {
                applied += 1;
            }
        }
        applied
    }
}

fn apply_one(applier: &dyn LiveApply, path: &str, value: &str) -> bool {
    match applier.apply_keyword(path, value) {
        Ok(()) => {
            debug!(path = %path, value = %value, "applied keyword live");
            true
        }
        Err(e) => {
            warn!(path = %path, value = %value, error = ?e, "live apply failed");
            false
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use anyhow::bail;
    use std::cell::{Cell, RefCell};
    use std::collections::HashSet;
    use std::rc::Rc;

    /// Records every live-apply call; paths in `failing` return an error
    #[derive(Default)]
    pub(crate) struct RecordingApplier {
        pub calls: RefCell<Vec<(String, String)>>,
        pub failing: HashSet<String>,
    }

    impl LiveApply for RecordingApplier {
        fn apply_keyword(&self, path: &str, value: &str) -> Result<()> {
            self.calls.borrow_mut().push((path.to_string(), value.to_string()));
            if self.failing.contains(path) {
                bail!("hyprctl refused {path}");
            }
            Ok(())
        }
    }

    impl LiveApply for Rc<RecordingApplier> {
        fn apply_keyword(&self, path: &str, value: &str) -> Result<()> {
            self.as_ref().apply_keyword(path, value)
        }
    }

    /// Clock advanced by hand
    #[derive(Clone)]
    pub(crate) struct ManualClock {
        now: Rc<Cell<Instant>>,
    }

    impl ManualClock {
        pub fn new() -> Self {
            Self {
                now: Rc::new(Cell::new(Instant::now())),
            }
        }

        pub fn advance(&self, by: Duration) {
            self.now.set(self.now.get() + by);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            self.now.get()
        }
    }

    fn no_baseline(_: &str) -> Option<String> {
        None
    }

    fn enabled_scheduler() -> RealtimeScheduler {
        let mut scheduler = RealtimeScheduler::default();
        scheduler.enable(&BTreeMap::new(), &RecordingApplier::default());
        scheduler
    }

    #[test]
    fn test_disabled_scheduler_ignores_edits() {
        let mut scheduler = RealtimeScheduler::default();
        let start = Instant::now();
        scheduler.enqueue("general:gaps_in", "10", start);
        assert!(scheduler.pending().is_empty());
        assert_eq!(scheduler.next_deadline(), None);
    }

    #[test]
    fn test_coalesces_writes_to_same_path() {
        let applier = RecordingApplier::default();
        let mut scheduler = enabled_scheduler();
        let start = Instant::now();

        scheduler.enqueue("general:gaps_in", "1", start);
        scheduler.enqueue("general:gaps_in", "2", start + Duration::from_millis(40));
        scheduler.enqueue("general:gaps_in", "3", start + Duration::from_millis(80));

        // Still inside the window re-armed by the last edit
        let before = start + Duration::from_millis(150);
        assert_eq!(scheduler.poll(before, no_baseline, &applier), 0);

        let after = start + Duration::from_millis(80 + 120);
        assert_eq!(scheduler.poll(after, no_baseline, &applier), 1);
        assert_eq!(
            *applier.calls.borrow(),
            vec![("general:gaps_in".to_string(), "3".to_string())]
        );
        assert!(scheduler.pending().is_empty());
        assert_eq!(scheduler.next_deadline(), None);
    }

    #[test]
    fn test_cleared_value_restores_baseline() {
        let applier = RecordingApplier::default();
        let mut scheduler = enabled_scheduler();
        let start = Instant::now();

        scheduler.enqueue("general:gaps_in", "", start);
        scheduler.enqueue("general:gaps_out", "", start);
        let baseline = |path: &str| (path == "general:gaps_in").then(|| "5".to_string());

        assert_eq!(scheduler.poll(start + scheduler.debounce(), baseline, &applier), 1);
        assert_eq!(
            *applier.calls.borrow(),
            vec![("general:gaps_in".to_string(), "5".to_string())]
        );
    }

    #[test]
    fn test_failure_does_not_block_other_keys() {
        let applier = RecordingApplier {
            failing: HashSet::from(["decoration:rounding".to_string()]),
            ..Default::default()
        };
        let mut scheduler = enabled_scheduler();
        let start = Instant::now();

        scheduler.enqueue("decoration:rounding", "8", start);
        scheduler.enqueue("general:gaps_in", "10", start);

        assert_eq!(scheduler.poll(start + scheduler.debounce(), no_baseline, &applier), 1);
        assert_eq!(applier.calls.borrow().len(), 2);
    }

    #[test]
    fn test_enable_replays_resolved_once() {
        let applier = RecordingApplier::default();
        let mut scheduler = RealtimeScheduler::default();
        let resolved = BTreeMap::from([
            ("general:gaps_in".to_string(), "10".to_string()),
            ("decoration:rounding".to_string(), "4".to_string()),
        ]);

        assert_eq!(scheduler.enable(&resolved, &applier), 2);
        assert_eq!(scheduler.enable(&resolved, &applier), 0);
        assert_eq!(applier.calls.borrow().len(), 2);
    }

    #[test]
    fn test_disable_cancels_pending() {
        let applier = RecordingApplier::default();
        let mut scheduler = enabled_scheduler();
        let start = Instant::now();

        scheduler.enqueue("general:gaps_in", "10", start);
        scheduler.disable();
        assert_eq!(scheduler.poll(start + Duration::from_secs(1), no_baseline, &applier), 0);
        assert!(applier.calls.borrow().is_empty());
    }
}
