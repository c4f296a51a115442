//! User activity monitor
//!
//! Derives a binary active/idle state from raw interaction signals and an idle
//! timeout. Raw signals never leave this module; only the derived transitions
//! are handed back to the engine.

use crate::types::{Activity, SignalKind};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

/// Tracks the most recent interaction and flips to idle after the timeout
#[derive(Debug, Clone)]
pub struct ActivityMonitor {
    state: Activity,
    last_activity_at: DateTime<Utc>,
    idle_timeout_ms: u64,
    check_interval_ms: u64,
    listeners: BTreeSet<SignalKind>,
    supported: bool,
}

impl ActivityMonitor {
    /// Create an attached monitor listening to every [`SignalKind`].
    ///
    /// The idle check interval is the tick cadence, but never longer than half
    /// the idle timeout.
    pub fn new(idle_timeout_ms: u64, tick_interval_ms: u64, now: DateTime<Utc>) -> Self {
        let check_interval_ms = tick_interval_ms.min(idle_timeout_ms / 2).max(1);
        let mut monitor = Self {
            state: Activity::Active,
            last_activity_at: now,
            idle_timeout_ms,
            check_interval_ms,
            listeners: BTreeSet::new(),
            supported: true,
        };
        monitor.attach();
        monitor
    }

    /// Monitor for a host without interaction events: permanently active
    pub fn unsupported(now: DateTime<Utc>) -> Self {
        Self {
            state: Activity::Active,
            last_activity_at: now,
            idle_timeout_ms: 0,
            check_interval_ms: 0,
            listeners: BTreeSet::new(),
            supported: false,
        }
    }

    /// Register listeners for every signal kind. Calling it twice is a no-op.
    pub fn attach(&mut self) {
        if !self.supported {
            return;
        }
        self.listeners.extend(SignalKind::ALL);
    }

    /// Remove every listener
    pub fn detach(&mut self) {
        self.listeners.clear();
    }

    pub fn is_attached(&self) -> bool {
        !self.listeners.is_empty()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn state(&self) -> Activity {
        self.state
    }

    pub fn last_activity_at(&self) -> DateTime<Utc> {
        self.last_activity_at
    }

    pub fn check_interval_ms(&self) -> u64 {
        self.check_interval_ms
    }

    /// Record a raw interaction.
    ///
    /// Returns `Some(Activity::Active)` only when the monitor was idle.
    pub fn record_signal(&mut self, kind: SignalKind, now: DateTime<Utc>) -> Option<Activity> {
        if !self.listeners.contains(&kind) {
            return None;
        }

        if now > self.last_activity_at {
            self.last_activity_at = now;
        }

        if self.state == Activity::Idle {
            self.state = Activity::Active;
            return Some(Activity::Active);
        }
        None
    }

    /// Periodic idle check.
    ///
    /// Returns `Some(Activity::Idle)` the first time the idle timeout elapses.
    pub fn check_idle(&mut self, now: DateTime<Utc>) -> Option<Activity> {
        if !self.is_attached() || self.state == Activity::Idle {
            return None;
        }

        let quiet_ms = (now - self.last_activity_at).num_milliseconds().max(0) as u64;
        if quiet_ms >= self.idle_timeout_ms {
            self.state = Activity::Idle;
            return Some(Activity::Idle);
        }
        None
    }
}
