//! Engine configuration
//!
//! All options have defaults and malformed values are normalized at
//! construction instead of being rejected, so a bad remote config can never
//! produce asymmetric dwell durations downstream.

use crate::error::AttentionError;
use serde::{Deserialize, Serialize};

/// Default inactivity threshold before the user is considered idle
pub const DEFAULT_IDLE_TIMEOUT_MS: u64 = 30_000;

/// Default cumulative scroll distance that resets a section
pub const DEFAULT_SCROLL_RESET_THRESHOLD_PX: f64 = 100.0;

/// Default size of each emitted dwell slice
pub const DEFAULT_EMIT_INTERVAL_MS: u64 = 3_000;

/// Default cap per uninterrupted section view (3 emit intervals)
pub const DEFAULT_MAX_DURATION_MS: u64 = 9_000;

/// Default cadence at which the host is expected to call `tick`
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1_000;

/// How a timer reports intervals that were skipped during a long stall
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatchUpPolicy {
    /// At most one interval per tick
    #[default]
    Single,
    /// Every completed interval is emitted in the same tick
    Burst,
}

/// Recognized engine options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttentionConfig {
    pub idle_timeout_ms: u64,
    pub scroll_reset_threshold_px: f64,
    pub emit_interval_ms: u64,
    /// Must be an integer multiple of `emit_interval_ms`
    pub max_duration_ms: u64,
    pub tick_interval_ms: u64,
    pub catch_up: CatchUpPolicy,
}

impl Default for AttentionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_ms: DEFAULT_IDLE_TIMEOUT_MS,
            scroll_reset_threshold_px: DEFAULT_SCROLL_RESET_THRESHOLD_PX,
            emit_interval_ms: DEFAULT_EMIT_INTERVAL_MS,
            max_duration_ms: DEFAULT_MAX_DURATION_MS,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            catch_up: CatchUpPolicy::Single,
        }
    }
}

impl AttentionConfig {
    /// Parse configuration JSON and normalize it
    pub fn from_json(json: &str) -> Result<Self, AttentionError> {
        let config: AttentionConfig = serde_json::from_str(json)
            .map_err(|e| AttentionError::InvalidConfig(e.to_string()))?;
        Ok(config.normalized())
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Return a copy with every option forced into its valid range
    pub fn normalized(mut self) -> Self {
        if self.emit_interval_ms == 0 {
            log::warn!(
                "emit_interval_ms must be positive, using {}",
                DEFAULT_EMIT_INTERVAL_MS
            );
            self.emit_interval_ms = DEFAULT_EMIT_INTERVAL_MS;
        }

        let rounded = (self.max_duration_ms / self.emit_interval_ms) * self.emit_interval_ms;
        let rounded = rounded.max(self.emit_interval_ms);
        if rounded != self.max_duration_ms {
            log::warn!(
                "max_duration_ms {} is not a positive multiple of emit_interval_ms {}, using {}",
                self.max_duration_ms,
                self.emit_interval_ms,
                rounded
            );
            self.max_duration_ms = rounded;
        }

        if !self.scroll_reset_threshold_px.is_finite() || self.scroll_reset_threshold_px <= 0.0 {
            log::warn!(
                "scroll_reset_threshold_px {} is invalid, using {}",
                self.scroll_reset_threshold_px,
                DEFAULT_SCROLL_RESET_THRESHOLD_PX
            );
            self.scroll_reset_threshold_px = DEFAULT_SCROLL_RESET_THRESHOLD_PX;
        }

        if self.idle_timeout_ms == 0 {
            log::warn!("idle_timeout_ms must be positive, using {}", DEFAULT_IDLE_TIMEOUT_MS);
            self.idle_timeout_ms = DEFAULT_IDLE_TIMEOUT_MS;
        }

        if self.tick_interval_ms == 0 {
            log::warn!("tick_interval_ms must be positive, using {}", DEFAULT_TICK_INTERVAL_MS);
            self.tick_interval_ms = DEFAULT_TICK_INTERVAL_MS;
        }

        self
    }

    /// Number of emit intervals that fit under the cap
    pub fn intervals_per_view(&self) -> u64 {
        self.max_duration_ms / self.emit_interval_ms.max(1)
    }
}
