//! Per-section dwell timer
//!
//! A section timer owns the accumulated active dwell-time for one section, the
//! duration cap and the emit cadence. It only advances while the engine says
//! the page is runnable, and reports completed intervals back to the engine
//! through [`TickOutcome`].

use crate::config::{AttentionConfig, CatchUpPolicy};
use crate::types::TimerPhase;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerState {
    Unstarted,
    Running { since: DateTime<Utc> },
    Paused,
    Capped,
}

/// What a timer did while advancing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutcome {
    /// Number of full emit intervals completed, each `emit_interval_ms` long
    pub intervals: u64,
    /// The timer hit `max_duration_ms` during this advance
    pub reached_cap: bool,
}

/// Dwell-time accounting for a single section
#[derive(Debug, Clone)]
pub struct SectionTimer {
    state: TimerState,
    accumulated_ms: u64,
    last_emitted_ms: u64,
    emit_interval_ms: u64,
    max_duration_ms: u64,
    catch_up: CatchUpPolicy,
}

impl SectionTimer {
    /// Create an unstarted timer. `config` is expected to be normalized.
    pub fn new(config: &AttentionConfig) -> Self {
        Self {
            state: TimerState::Unstarted,
            accumulated_ms: 0,
            last_emitted_ms: 0,
            emit_interval_ms: config.emit_interval_ms,
            max_duration_ms: config.max_duration_ms,
            catch_up: config.catch_up,
        }
    }

    pub fn phase(&self) -> TimerPhase {
        match self.state {
            TimerState::Unstarted => TimerPhase::Unstarted,
            TimerState::Running { .. } => TimerPhase::Running,
            TimerState::Paused => TimerPhase::Paused,
            TimerState::Capped => TimerPhase::Capped,
        }
    }

    pub fn accumulated_ms(&self) -> u64 {
        self.accumulated_ms
    }

    pub fn last_emitted_ms(&self) -> u64 {
        self.last_emitted_ms
    }

    pub fn is_capped(&self) -> bool {
        self.state == TimerState::Capped
    }

    pub fn running_since(&self) -> Option<DateTime<Utc>> {
        match self.state {
            TimerState::Running { since } => Some(since),
            _ => None,
        }
    }

    /// Start or restart accumulation. No-op while running or capped.
    pub fn resume(&mut self, now: DateTime<Utc>) {
        if matches!(self.state, TimerState::Unstarted | TimerState::Paused) {
            self.state = TimerState::Running { since: now };
        }
    }

    /// Stop accumulation, folding the partial interval into the total.
    ///
    /// Completed intervals stay pending for the first tick after resume. The
    /// one exception is a flush that reaches the cap: a capped timer never
    /// ticks again, so everything it completed is reported here.
    pub fn pause(&mut self, now: DateTime<Utc>) -> TickOutcome {
        let TimerState::Running { since } = self.state else {
            return TickOutcome::default();
        };

        self.fold_elapsed(since, now);
        if self.accumulated_ms == self.max_duration_ms {
            return self.emit_completed();
        }

        self.state = TimerState::Paused;
        TickOutcome::default()
    }

    /// Periodic advance while running
    pub fn tick(&mut self, now: DateTime<Utc>) -> TickOutcome {
        if !matches!(self.state, TimerState::Running { .. }) {
            return TickOutcome::default();
        }
        self.advance(now)
    }

    /// Zero all counters. Runs again immediately when `runnable`, otherwise
    /// waits paused for the next resume.
    pub fn reset(&mut self, now: DateTime<Utc>, runnable: bool) {
        self.accumulated_ms = 0;
        self.last_emitted_ms = 0;
        self.state = if runnable {
            TimerState::Running { since: now }
        } else {
            TimerState::Paused
        };
    }

    fn advance(&mut self, now: DateTime<Utc>) -> TickOutcome {
        let TimerState::Running { since } = self.state else {
            return TickOutcome::default();
        };

        self.fold_elapsed(since, now);
        self.state = TimerState::Running { since: now };
        self.emit_completed()
    }

    fn fold_elapsed(&mut self, since: DateTime<Utc>, now: DateTime<Utc>) {
        // Clock skew must never shrink the total
        let elapsed_ms = (now - since).num_milliseconds().max(0) as u64;
        self.accumulated_ms = self
            .accumulated_ms
            .saturating_add(elapsed_ms)
            .min(self.max_duration_ms);
    }

    fn emit_completed(&mut self) -> TickOutcome {
        let mut outcome = TickOutcome::default();
        let reached_cap = self.accumulated_ms == self.max_duration_ms;

        // Once capped no later tick can emit, so the cap drains every completed interval
        let drain_all = reached_cap || self.catch_up == CatchUpPolicy::Burst;
        while self.accumulated_ms - self.last_emitted_ms >= self.emit_interval_ms {
            self.last_emitted_ms += self.emit_interval_ms;
            outcome.intervals += 1;
            if !drain_all {
                break;
            }
        }

        if reached_cap {
            self.state = TimerState::Capped;
            outcome.reached_cap = true;
        }
        outcome
    }
}
