//! Attention quality engine
//!
//! The engine owns the global attention state, the two leaf monitors and one
//! timer/scroll-tracker pair per observed section. Host notifications flow in
//! through its methods, pause/resume/reset commands flow down to the timers and
//! completed dwell intervals flow out to the injected [`DwellSink`].
//!
//! Every method takes the current time explicitly; the engine never reads the
//! system clock. All handlers apply their effects inline, so a pause or resume
//! is always visible to the next tick.

use crate::activity::ActivityMonitor;
use crate::config::AttentionConfig;
use crate::scroll::ScrollTracker;
use crate::sink::{DiagnosticSink, DwellSink};
use crate::timer::{SectionTimer, TickOutcome};
use crate::types::{
    Activity, Diagnostic, DiagnosticReason, DwellEvent, GlobalAttentionState, SectionSnapshot,
    SignalKind, Visibility,
};
use crate::visibility::VisibilityMonitor;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Which signals the host environment can actually deliver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostCapabilities {
    /// Initial page visibility, or `None` when the host cannot report it
    pub visibility: Option<Visibility>,
    /// Whether the host delivers interaction events
    pub interaction_events: bool,
}

impl Default for HostCapabilities {
    fn default() -> Self {
        Self {
            visibility: Some(Visibility::Visible),
            interaction_events: true,
        }
    }
}

struct Section {
    timer: SectionTimer,
    scroll: ScrollTracker,
}

/// Root orchestrator for section dwell tracking
pub struct AttentionEngine<S: DwellSink> {
    config: AttentionConfig,
    state: GlobalAttentionState,
    visibility: VisibilityMonitor,
    activity: ActivityMonitor,
    sections: BTreeMap<String, Section>,
    sink: S,
    diagnostics: Option<Box<dyn DiagnosticSink>>,
    destroyed: bool,
}

impl<S: DwellSink> AttentionEngine<S> {
    /// Create an engine for a host that reports visibility and interactions
    pub fn new(config: AttentionConfig, sink: S, now: DateTime<Utc>) -> Self {
        Self::with_host(config, sink, HostCapabilities::default(), now)
    }

    /// Create an engine for a host with the given capabilities.
    ///
    /// Missing signals fail open: the engine behaves as if the page were
    /// permanently visible or the user permanently active.
    pub fn with_host(
        config: AttentionConfig,
        sink: S,
        host: HostCapabilities,
        now: DateTime<Utc>,
    ) -> Self {
        let config = config.normalized();
        let visibility = VisibilityMonitor::new(host.visibility);
        let activity = if host.interaction_events {
            ActivityMonitor::new(config.idle_timeout_ms, config.tick_interval_ms, now)
        } else {
            ActivityMonitor::unsupported(now)
        };
        let state = GlobalAttentionState::new(visibility.current(), now);

        log::debug!(
            "attention engine created: visibility={:?} interaction_events={} emit_interval_ms={} max_duration_ms={}",
            state.visibility,
            host.interaction_events,
            config.emit_interval_ms,
            config.max_duration_ms
        );

        Self {
            config,
            state,
            visibility,
            activity,
            sections: BTreeMap::new(),
            sink,
            diagnostics: None,
            destroyed: false,
        }
    }

    /// Attach a diagnostic receiver
    pub fn with_diagnostics(mut self, diagnostics: impl DiagnosticSink + 'static) -> Self {
        self.diagnostics = Some(Box::new(diagnostics));
        self
    }

    pub fn config(&self) -> &AttentionConfig {
        &self.config
    }

    pub fn state(&self) -> GlobalAttentionState {
        self.state
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Cadence at which the host should call [`AttentionEngine::tick`]
    pub fn recommended_tick_interval_ms(&self) -> u64 {
        match self.activity.check_interval_ms() {
            0 => self.config.tick_interval_ms,
            check => check.min(self.config.tick_interval_ms),
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn is_tracking(&self, section_id: &str) -> bool {
        self.sections.contains_key(section_id)
    }

    /// Ids of every tracked section, in sorted order
    pub fn tracked_sections(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    /// Snapshot of one section's tracking state
    pub fn section(&self, section_id: &str) -> Option<SectionSnapshot> {
        self.sections
            .get(section_id)
            .map(|section| snapshot(section_id, section))
    }

    /// Snapshots of every tracked section
    pub fn sections(&self) -> Vec<SectionSnapshot> {
        self.sections
            .iter()
            .map(|(id, section)| snapshot(id, section))
            .collect()
    }

    /// Start tracking a section. Already tracked sections are left untouched.
    pub fn observe_section(&mut self, section_id: &str, now: DateTime<Utc>) {
        if self.destroyed || self.sections.contains_key(section_id) {
            return;
        }

        let mut section = Section {
            timer: SectionTimer::new(&self.config),
            scroll: ScrollTracker::new(self.config.scroll_reset_threshold_px),
        };
        if self.state.runnable() {
            section.timer.resume(now);
        }

        log::debug!(
            "observing section {} (running={})",
            section_id,
            self.state.runnable()
        );
        self.sections.insert(section_id.to_string(), section);
    }

    /// Stop tracking a section, discarding any partial interval.
    ///
    /// Returns `false` when the section was not tracked.
    pub fn unobserve_section(&mut self, section_id: &str) -> bool {
        match self.sections.remove(section_id) {
            Some(section) => {
                log::debug!(
                    "unobserved section {}, discarding {} ms unemitted",
                    section_id,
                    section.timer.accumulated_ms() - section.timer.last_emitted_ms()
                );
                true
            }
            None => false,
        }
    }

    /// Feed a scroll delta for a section. Crossing the threshold fully resets
    /// the section's dwell accounting.
    pub fn report_scroll(&mut self, section_id: &str, delta_px: f64, now: DateTime<Utc>) {
        if self.destroyed {
            return;
        }

        let runnable = self.state.runnable();
        let Some(section) = self.sections.get_mut(section_id) else {
            return;
        };

        if section.scroll.add_delta(delta_px) {
            log::debug!(
                "section {} scrolled {} px (threshold {} px), resetting",
                section_id,
                section.scroll.delta_px(),
                section.scroll.threshold_px()
            );
            section.scroll.reset();
            section.timer.reset(now, runnable);
            self.diagnose(DiagnosticReason::ScrollReset, Some(section_id), now);
        }
    }

    /// Feed a raw interaction signal to the activity monitor
    pub fn record_interaction(&mut self, kind: SignalKind, now: DateTime<Utc>) {
        if self.destroyed {
            return;
        }

        let transition = self.activity.record_signal(kind, now);
        self.state.last_activity_at = self.activity.last_activity_at();
        if let Some(activity) = transition {
            self.on_activity_change(activity.is_active(), now);
        }
    }

    /// Host visibility notification. Repeated identical states are ignored.
    pub fn on_visibility_change(&mut self, visible: bool, now: DateTime<Utc>) {
        if self.destroyed {
            return;
        }

        let was_runnable = self.state.runnable();
        let Some(visibility) = self.visibility.set_visible(visible) else {
            return;
        };

        self.state.visibility = visibility;
        let reason = match visibility {
            Visibility::Visible => DiagnosticReason::PageVisible,
            Visibility::Hidden => DiagnosticReason::PageHidden,
        };
        self.diagnose(reason, None, now);
        self.apply_runnable(was_runnable, now);
    }

    /// Periodic host tick: idle check first, then every section timer
    pub fn tick(&mut self, now: DateTime<Utc>) {
        if self.destroyed {
            return;
        }

        if let Some(activity) = self.activity.check_idle(now) {
            self.on_activity_change(activity.is_active(), now);
        }

        let outcomes: Vec<(String, TickOutcome)> = self
            .sections
            .iter_mut()
            .map(|(id, section)| (id.clone(), section.timer.tick(now)))
            .filter(|(_, outcome)| *outcome != TickOutcome::default())
            .collect();

        for (section_id, outcome) in outcomes {
            self.dispatch(&section_id, outcome, now);
        }
    }

    /// Tear down: detach listeners and drop every section without flushing.
    /// Every later call is a no-op.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }

        self.activity.detach();
        let dropped = self.sections.len();
        self.sections.clear();
        self.destroyed = true;
        log::debug!("attention engine destroyed, dropped {} sections", dropped);
    }

    fn on_activity_change(&mut self, active: bool, now: DateTime<Utc>) {
        let activity = Activity::from_active(active);
        if self.state.activity == activity {
            return;
        }

        let was_runnable = self.state.runnable();
        self.state.activity = activity;
        let reason = match activity {
            Activity::Active => DiagnosticReason::UserActive,
            Activity::Idle => DiagnosticReason::UserIdle,
        };
        self.diagnose(reason, None, now);
        self.apply_runnable(was_runnable, now);
    }

    /// Broadcast pause/resume, but only when the derived predicate flipped
    fn apply_runnable(&mut self, was_runnable: bool, now: DateTime<Utc>) {
        let runnable = self.state.runnable();
        if runnable == was_runnable {
            return;
        }

        if runnable {
            for section in self.sections.values_mut() {
                section.timer.resume(now);
            }
            return;
        }

        let outcomes: Vec<(String, TickOutcome)> = self
            .sections
            .iter_mut()
            .map(|(id, section)| (id.clone(), section.timer.pause(now)))
            .filter(|(_, outcome)| *outcome != TickOutcome::default())
            .collect();

        for (section_id, outcome) in outcomes {
            self.dispatch(&section_id, outcome, now);
        }
    }

    fn dispatch(&mut self, section_id: &str, outcome: TickOutcome, now: DateTime<Utc>) {
        for _ in 0..outcome.intervals {
            log::trace!(
                "section {} emitted {} ms",
                section_id,
                self.config.emit_interval_ms
            );
            self.sink.emit(DwellEvent {
                section_id: section_id.to_string(),
                duration_ms: self.config.emit_interval_ms,
                emitted_at: now,
            });
        }

        if outcome.reached_cap {
            self.diagnose(DiagnosticReason::DurationCapReached, Some(section_id), now);
        }
    }

    fn diagnose(&mut self, reason: DiagnosticReason, section_id: Option<&str>, now: DateTime<Utc>) {
        match section_id {
            Some(id) => log::debug!("{} (section {})", reason.as_str(), id),
            None => log::debug!("{}", reason.as_str()),
        }

        if let Some(diagnostics) = self.diagnostics.as_mut() {
            diagnostics.record(&Diagnostic {
                reason,
                section_id: section_id.map(str::to_string),
                at: now,
            });
        }
    }
}

fn snapshot(section_id: &str, section: &Section) -> SectionSnapshot {
    SectionSnapshot {
        section_id: section_id.to_string(),
        phase: section.timer.phase(),
        accumulated_ms: section.timer.accumulated_ms(),
        last_emitted_ms: section.timer.last_emitted_ms(),
        scroll_delta_px: section.scroll.delta_px(),
        capped: section.timer.is_capped(),
        running_since: section.timer.running_since(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CatchUpPolicy;
    use crate::types::TimerPhase;
    use chrono::{Duration, TimeZone};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 14, 0, 0).unwrap()
    }

    fn at(ms: i64) -> DateTime<Utc> {
        t0() + Duration::milliseconds(ms)
    }

    fn engine() -> AttentionEngine<Vec<DwellEvent>> {
        AttentionEngine::new(AttentionConfig::default(), Vec::new(), t0())
    }

    fn engine_with_diagnostics() -> (
        AttentionEngine<Vec<DwellEvent>>,
        Rc<RefCell<Vec<Diagnostic>>>,
    ) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let recorder = Rc::clone(&log);
        let engine = engine()
            .with_diagnostics(move |d: &Diagnostic| recorder.borrow_mut().push(d.clone()));
        (engine, log)
    }

    /// Tick every second in `(from, to]`, keeping the user active
    fn run_active(engine: &mut AttentionEngine<Vec<DwellEvent>>, from: i64, to: i64) {
        let mut ms = from + 1_000;
        while ms <= to {
            engine.record_interaction(SignalKind::PointerMove, at(ms));
            engine.tick(at(ms));
            ms += 1_000;
        }
    }

    fn reasons(log: &Rc<RefCell<Vec<Diagnostic>>>) -> Vec<DiagnosticReason> {
        log.borrow().iter().map(|d| d.reason).collect()
    }

    #[test]
    fn test_observe_starts_running_when_runnable() {
        let mut engine = engine();
        engine.observe_section("hero", t0());

        let snapshot = engine.section("hero").unwrap();
        assert_eq!(snapshot.phase, TimerPhase::Running);
        assert_eq!(snapshot.running_since, Some(t0()));
    }

    #[test]
    fn test_observe_is_idempotent() {
        let mut engine = engine();
        engine.observe_section("hero", t0());
        engine.tick(at(2_000));
        engine.observe_section("hero", at(2_000));

        assert_eq!(engine.section("hero").unwrap().accumulated_ms, 2_000);
        assert_eq!(engine.tracked_sections().count(), 1);
    }

    #[test]
    fn test_observe_while_hidden_waits_for_visibility() {
        let mut engine = AttentionEngine::with_host(
            AttentionConfig::default(),
            Vec::new(),
            HostCapabilities {
                visibility: Some(Visibility::Hidden),
                interaction_events: true,
            },
            t0(),
        );
        engine.observe_section("hero", t0());
        assert_eq!(engine.section("hero").unwrap().phase, TimerPhase::Unstarted);

        engine.on_visibility_change(true, at(1_000));
        let snapshot = engine.section("hero").unwrap();
        assert_eq!(snapshot.phase, TimerPhase::Running);
        assert_eq!(snapshot.running_since, Some(at(1_000)));
    }

    #[test]
    fn test_cap_boundary_emits_exactly_three_intervals() {
        let (mut engine, log) = engine_with_diagnostics();
        engine.observe_section("hero", t0());

        run_active(&mut engine, 0, 12_000);
        assert_eq!(engine.sink().len(), 3);
        assert!(engine.sink().iter().all(|e| e.duration_ms == 3_000 && e.section_id == "hero"));

        run_active(&mut engine, 12_000, 60_000);
        assert_eq!(engine.sink().len(), 3);

        let snapshot = engine.section("hero").unwrap();
        assert!(snapshot.capped);
        assert_eq!(snapshot.accumulated_ms, 9_000);
        assert_eq!(snapshot.running_since, None);
        assert_eq!(reasons(&log), vec![DiagnosticReason::DurationCapReached]);
    }

    #[test]
    fn test_hidden_period_contributes_nothing() {
        let mut engine = engine();
        engine.observe_section("hero", t0());
        run_active(&mut engine, 0, 2_000);

        engine.on_visibility_change(false, at(2_000));
        let mut ms = 3_000;
        while ms <= 62_000 {
            engine.tick(at(ms));
            ms += 1_000;
        }
        assert_eq!(engine.section("hero").unwrap().accumulated_ms, 2_000);

        engine.on_visibility_change(true, at(62_000));
        engine.record_interaction(SignalKind::PointerMove, at(62_000));

        engine.tick(at(62_500));
        let snapshot = engine.section("hero").unwrap();
        assert_eq!(snapshot.accumulated_ms, 2_500);
        assert!(engine.sink().is_empty());

        // Reaching exactly one interval completes it
        engine.tick(at(63_000));
        assert_eq!(engine.section("hero").unwrap().accumulated_ms, 3_000);
        assert_eq!(engine.sink().len(), 1);
        assert_eq!(engine.sink()[0].emitted_at, at(63_000));
    }

    #[test]
    fn test_pause_flush_completes_interval_without_emitting() {
        let mut engine = engine();
        engine.observe_section("hero", t0());
        run_active(&mut engine, 0, 2_000);

        engine.on_visibility_change(false, at(2_000));
        engine.tick(at(32_000));
        engine.on_visibility_change(true, at(62_000));
        engine.record_interaction(SignalKind::PointerMove, at(62_000));

        // Hidden again before the next tick: the flush alone completes the interval
        engine.on_visibility_change(false, at(63_000));
        let snapshot = engine.section("hero").unwrap();
        assert_eq!(snapshot.phase, TimerPhase::Paused);
        assert_eq!(snapshot.accumulated_ms, 3_000);
        assert_eq!(snapshot.last_emitted_ms, 0);
        assert!(engine.sink().is_empty());

        engine.on_visibility_change(true, at(64_000));
        engine.tick(at(64_000));
        assert_eq!(engine.sink().len(), 1);
        assert_eq!(engine.sink()[0].duration_ms, 3_000);
        assert_eq!(engine.sink()[0].emitted_at, at(64_000));
        assert_eq!(engine.section("hero").unwrap().accumulated_ms, 3_000);
    }

    #[test]
    fn test_pause_reaching_cap_drains_remaining_intervals() {
        let (mut engine, log) = engine_with_diagnostics();
        engine.observe_section("hero", t0());
        run_active(&mut engine, 0, 8_000);
        assert_eq!(engine.sink().len(), 2);

        engine.on_visibility_change(false, at(9_500));
        assert_eq!(engine.sink().len(), 3);
        assert!(engine.section("hero").unwrap().capped);
        assert_eq!(
            reasons(&log),
            vec![
                DiagnosticReason::PageHidden,
                DiagnosticReason::DurationCapReached
            ]
        );
    }

    #[test]
    fn test_idle_pauses_within_one_check_and_pointer_move_resumes() {
        let config = AttentionConfig {
            max_duration_ms: 60_000,
            ..Default::default()
        };
        let log = Rc::new(RefCell::new(Vec::new()));
        let recorder = Rc::clone(&log);
        let mut engine = AttentionEngine::new(config, Vec::new(), t0())
            .with_diagnostics(move |d: &Diagnostic| recorder.borrow_mut().push(d.clone()));
        engine.observe_section("hero", t0());
        engine.observe_section("faq", t0());

        let check = engine.recommended_tick_interval_ms() as i64;
        let mut ms = 0;
        while ms < 30_000 {
            ms += check;
            engine.tick(at(ms));
        }

        assert_eq!(engine.state().activity, Activity::Idle);
        for snapshot in engine.sections() {
            assert_eq!(snapshot.phase, TimerPhase::Paused);
            assert_eq!(snapshot.accumulated_ms, 30_000);
        }

        engine.tick(at(45_000));
        engine.record_interaction(SignalKind::PointerMove, at(45_000));
        assert_eq!(engine.state().activity, Activity::Active);
        for snapshot in engine.sections() {
            assert_eq!(snapshot.phase, TimerPhase::Running);
            assert_eq!(snapshot.running_since, Some(at(45_000)));
            assert_eq!(snapshot.accumulated_ms, 30_000);
        }

        assert_eq!(
            reasons(&log),
            vec![DiagnosticReason::UserIdle, DiagnosticReason::UserActive]
        );
    }

    #[test]
    fn test_duplicate_visibility_notifications_are_ignored() {
        let (mut engine, log) = engine_with_diagnostics();
        engine.observe_section("hero", t0());

        engine.on_visibility_change(false, at(1_000));
        engine.on_visibility_change(false, at(2_000));
        assert_eq!(engine.section("hero").unwrap().accumulated_ms, 1_000);

        engine.on_visibility_change(true, at(3_000));
        engine.on_visibility_change(true, at(4_000));
        assert_eq!(engine.section("hero").unwrap().running_since, Some(at(3_000)));

        assert_eq!(
            reasons(&log),
            vec![DiagnosticReason::PageHidden, DiagnosticReason::PageVisible]
        );
    }

    #[test]
    fn test_pause_broadcast_only_on_derived_change() {
        let mut engine = engine();
        engine.observe_section("hero", t0());

        engine.on_visibility_change(false, at(1_000));
        // Idle while already hidden changes nothing for the timers
        engine.tick(at(31_000));
        assert_eq!(engine.state().activity, Activity::Idle);

        // Visible but still idle stays paused
        engine.on_visibility_change(true, at(40_000));
        assert_eq!(engine.section("hero").unwrap().phase, TimerPhase::Paused);

        engine.record_interaction(SignalKind::KeyDown, at(41_000));
        let snapshot = engine.section("hero").unwrap();
        assert_eq!(snapshot.phase, TimerPhase::Running);
        assert_eq!(snapshot.running_since, Some(at(41_000)));
        assert_eq!(snapshot.accumulated_ms, 1_000);
    }

    #[test]
    fn test_scroll_threshold_resets_after_third_delta() {
        let (mut engine, log) = engine_with_diagnostics();
        engine.observe_section("hero", t0());
        run_active(&mut engine, 0, 2_000);

        engine.report_scroll("hero", 40.0, at(2_100));
        engine.report_scroll("hero", -40.0, at(2_200));
        assert_eq!(engine.section("hero").unwrap().scroll_delta_px, 80.0);
        assert_eq!(engine.section("hero").unwrap().accumulated_ms, 2_000);
        assert!(log.borrow().is_empty());

        engine.report_scroll("hero", 40.0, at(2_300));
        let snapshot = engine.section("hero").unwrap();
        assert_eq!(snapshot.accumulated_ms, 0);
        assert_eq!(snapshot.scroll_delta_px, 0.0);
        assert_eq!(snapshot.running_since, Some(at(2_300)));

        let entries = log.borrow();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].reason, DiagnosticReason::ScrollReset);
        assert_eq!(entries[0].section_id.as_deref(), Some("hero"));
    }

    #[test]
    fn test_scroll_reset_clears_cap() {
        let mut engine = engine();
        engine.observe_section("hero", t0());
        run_active(&mut engine, 0, 12_000);
        assert!(engine.section("hero").unwrap().capped);

        engine.report_scroll("hero", 150.0, at(12_000));
        let snapshot = engine.section("hero").unwrap();
        assert_eq!(snapshot.phase, TimerPhase::Running);
        assert_eq!(snapshot.accumulated_ms, 0);
        assert!(!snapshot.capped);

        run_active(&mut engine, 12_000, 15_000);
        assert_eq!(engine.sink().len(), 4);
    }

    #[test]
    fn test_scroll_reset_while_hidden_stays_paused() {
        let mut engine = engine();
        engine.observe_section("hero", t0());
        engine.on_visibility_change(false, at(2_000));

        engine.report_scroll("hero", 200.0, at(3_000));
        let snapshot = engine.section("hero").unwrap();
        assert_eq!(snapshot.phase, TimerPhase::Paused);
        assert_eq!(snapshot.accumulated_ms, 0);

        engine.on_visibility_change(true, at(4_000));
        assert_eq!(engine.section("hero").unwrap().running_since, Some(at(4_000)));
    }

    #[test]
    fn test_scroll_for_unknown_section_is_ignored() {
        let mut engine = engine();
        engine.report_scroll("missing", 500.0, t0());
        assert!(!engine.is_tracking("missing"));
    }

    #[test]
    fn test_unobserve_discards_partial_progress() {
        let mut engine = engine();
        engine.observe_section("hero", t0());
        run_active(&mut engine, 0, 5_000);
        assert_eq!(engine.sink().len(), 1);

        assert!(engine.unobserve_section("hero"));
        assert!(!engine.unobserve_section("hero"));
        run_active(&mut engine, 5_000, 20_000);
        assert_eq!(engine.sink().len(), 1);
    }

    #[test]
    fn test_sections_are_tracked_independently() {
        let mut engine = engine();
        engine.observe_section("hero", t0());
        run_active(&mut engine, 0, 2_000);
        engine.observe_section("faq", at(2_000));
        run_active(&mut engine, 2_000, 6_000);

        let ids: Vec<&str> = engine.sink().iter().map(|e| e.section_id.as_str()).collect();
        assert_eq!(ids, vec!["hero", "faq", "hero"]);
        assert_eq!(engine.section("faq").unwrap().accumulated_ms, 4_000);
    }

    #[test]
    fn test_destroy_stops_everything() {
        let mut engine = engine();
        engine.observe_section("hero", t0());
        run_active(&mut engine, 0, 2_500);
        engine.destroy();

        assert!(engine.is_destroyed());
        assert_eq!(engine.tracked_sections().count(), 0);

        engine.observe_section("hero", at(3_000));
        run_active(&mut engine, 3_000, 20_000);
        assert!(engine.sink().is_empty());
        assert!(!engine.is_tracking("hero"));
    }

    #[test]
    fn test_host_without_signals_fails_open() {
        let mut engine = AttentionEngine::with_host(
            AttentionConfig::default(),
            Vec::new(),
            HostCapabilities {
                visibility: None,
                interaction_events: false,
            },
            t0(),
        );
        engine.observe_section("hero", t0());

        engine.on_visibility_change(false, at(1_000));
        let mut ms = 0;
        while ms < 120_000 {
            ms += 1_000;
            engine.tick(at(ms));
        }

        assert!(engine.state().runnable());
        assert_eq!(engine.sink().len(), 3);
        assert_eq!(engine.recommended_tick_interval_ms(), 1_000);
    }

    #[test]
    fn test_fn_sink_receives_plain_callbacks() {
        let received = Rc::new(RefCell::new(Vec::new()));
        let recorder = Rc::clone(&received);
        let sink = crate::sink::FnSink(move |id: &str, ms: u64| {
            recorder.borrow_mut().push((id.to_string(), ms))
        });
        let mut engine = AttentionEngine::new(AttentionConfig::default(), sink, t0());
        engine.observe_section("hero", t0());
        engine.tick(at(3_000));

        assert_eq!(*received.borrow(), vec![("hero".to_string(), 3_000)]);
    }

    #[test]
    fn test_malformed_config_is_normalized() {
        let config = AttentionConfig {
            emit_interval_ms: 2_000,
            max_duration_ms: 5_000,
            catch_up: CatchUpPolicy::Burst,
            ..Default::default()
        };
        let mut engine = AttentionEngine::new(config, Vec::new(), t0());
        assert_eq!(engine.config().max_duration_ms, 4_000);

        engine.observe_section("hero", t0());
        engine.tick(at(10_000));
        assert_eq!(engine.sink().len(), 2);
        assert!(engine.sink().iter().all(|e| e.duration_ms == 2_000));
    }

    #[test]
    fn test_invariants_hold_through_mixed_signals() {
        let mut engine = engine();
        engine.observe_section("hero", t0());
        engine.observe_section("faq", t0());

        for step in 1..=200i64 {
            let now = at(step * 700);
            match step % 11 {
                0 => engine.on_visibility_change(step % 2 == 0, now),
                3 => engine.report_scroll("hero", 35.0, now),
                5 => engine.record_interaction(SignalKind::Touch, now),
                _ => engine.tick(now),
            }

            for snapshot in engine.sections() {
                assert!(snapshot.accumulated_ms <= 9_000);
                assert_eq!(snapshot.last_emitted_ms % 3_000, 0);
                assert!(snapshot.last_emitted_ms <= snapshot.accumulated_ms);
                assert_eq!(snapshot.capped, snapshot.accumulated_ms == 9_000);
            }
        }
        assert!(engine.sink().iter().all(|e| e.duration_ms == 3_000));
    }
}
