//! Core data types shared by the monitors, timers and the engine
//!
//! This module defines the global attention state, the per-section snapshot,
//! the emitted dwell events and the diagnostic vocabulary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Page visibility as reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Visible,
    Hidden,
}

impl Visibility {
    pub fn from_visible(visible: bool) -> Self {
        if visible {
            Visibility::Visible
        } else {
            Visibility::Hidden
        }
    }

    pub fn is_visible(self) -> bool {
        self == Visibility::Visible
    }
}

/// User activity derived from interaction signals and the idle timeout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    Active,
    Idle,
}

impl Activity {
    pub fn from_active(active: bool) -> Self {
        if active {
            Activity::Active
        } else {
            Activity::Idle
        }
    }

    pub fn is_active(self) -> bool {
        self == Activity::Active
    }
}

/// Raw interaction signal kinds that count as user activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    PointerMove,
    KeyDown,
    Touch,
    Scroll,
    Click,
}

impl SignalKind {
    /// Every signal kind the activity monitor listens for
    pub const ALL: [SignalKind; 5] = [
        SignalKind::PointerMove,
        SignalKind::KeyDown,
        SignalKind::Touch,
        SignalKind::Scroll,
        SignalKind::Click,
    ];
}

/// Global pause state shared by every tracked section.
///
/// Owned by the engine and written only through its visibility and activity
/// handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalAttentionState {
    pub visibility: Visibility,
    pub activity: Activity,
    /// Most recent qualifying interaction
    pub last_activity_at: DateTime<Utc>,
}

impl GlobalAttentionState {
    pub fn new(visibility: Visibility, now: DateTime<Utc>) -> Self {
        Self {
            visibility,
            activity: Activity::Active,
            last_activity_at: now,
        }
    }

    /// Sections may accumulate only while the page is visible AND the user is active
    pub fn runnable(&self) -> bool {
        self.visibility.is_visible() && self.activity.is_active()
    }
}

/// Phase of a section timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerPhase {
    Unstarted,
    Running,
    Paused,
    Capped,
}

/// Read-only view of a section's tracking state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionSnapshot {
    pub section_id: String,
    pub phase: TimerPhase,
    /// Active dwell-time since creation or the last reset
    pub accumulated_ms: u64,
    /// Accumulated value at the last emitted event
    pub last_emitted_ms: u64,
    /// Unsigned scroll distance since the last reset
    pub scroll_delta_px: f64,
    pub capped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub running_since: Option<DateTime<Utc>>,
}

/// One completed dwell interval for a section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DwellEvent {
    pub section_id: String,
    pub duration_ms: u64,
    pub emitted_at: DateTime<Utc>,
}

/// Fixed vocabulary for the diagnostic channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticReason {
    PageHidden,
    PageVisible,
    UserIdle,
    UserActive,
    DurationCapReached,
    ScrollReset,
}

impl DiagnosticReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticReason::PageHidden => "page_hidden",
            DiagnosticReason::PageVisible => "page_visible",
            DiagnosticReason::UserIdle => "user_idle",
            DiagnosticReason::UserActive => "user_active",
            DiagnosticReason::DurationCapReached => "duration_cap_reached",
            DiagnosticReason::ScrollReset => "scroll_reset",
        }
    }
}

/// Structured diagnostic entry. Observational only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub reason: DiagnosticReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_id: Option<String>,
    pub at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_runnable_is_a_conjunction() {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 14, 0, 0).unwrap();
        let mut state = GlobalAttentionState::new(Visibility::Visible, now);
        assert!(state.runnable());

        state.activity = Activity::Idle;
        assert!(!state.runnable());

        state.visibility = Visibility::Hidden;
        assert!(!state.runnable());

        state.activity = Activity::Active;
        assert!(!state.runnable());
    }

    #[test]
    fn test_diagnostic_reason_serialization() {
        for reason in [
            DiagnosticReason::PageHidden,
            DiagnosticReason::PageVisible,
            DiagnosticReason::UserIdle,
            DiagnosticReason::UserActive,
            DiagnosticReason::DurationCapReached,
            DiagnosticReason::ScrollReset,
        ] {
            let json = serde_json::to_string(&reason).unwrap();
            assert_eq!(json, format!("\"{}\"", reason.as_str()));
        }
    }

    #[test]
    fn test_signal_kind_snake_case() {
        let kind: SignalKind = serde_json::from_str("\"pointer_move\"").unwrap();
        assert_eq!(kind, SignalKind::PointerMove);
        assert_eq!(serde_json::to_string(&SignalKind::KeyDown).unwrap(), "\"key_down\"");
    }
}
