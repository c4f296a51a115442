//! attn.signal.v1 schema definition
//!
//! One record per host notification:
//! - viewport input (observe, unobserve, scroll)
//! - interaction and visibility signals
//! - periodic ticks and page teardown

use crate::types::SignalKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current schema version
pub const SCHEMA_VERSION: &str = "attn.signal.v1";

/// Notification carried by a signal record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SignalPayload {
    /// Section entered the observable set
    Observe { section_id: String },
    /// Section left the observable set
    Unobserve { section_id: String },
    /// Scroll displacement attributed to a section
    Scroll { section_id: String, delta_px: f64 },
    /// Raw user interaction
    Interaction { signal: SignalKind },
    /// Page visibility change
    Visibility { visible: bool },
    /// Periodic timer tick
    Tick,
    /// Page unload
    Destroy,
}

impl SignalPayload {
    pub fn type_name(&self) -> &'static str {
        match self {
            SignalPayload::Observe { .. } => "observe",
            SignalPayload::Unobserve { .. } => "unobserve",
            SignalPayload::Scroll { .. } => "scroll",
            SignalPayload::Interaction { .. } => "interaction",
            SignalPayload::Visibility { .. } => "visibility",
            SignalPayload::Tick => "tick",
            SignalPayload::Destroy => "destroy",
        }
    }

    pub fn section_id(&self) -> Option<&str> {
        match self {
            SignalPayload::Observe { section_id }
            | SignalPayload::Unobserve { section_id }
            | SignalPayload::Scroll { section_id, .. } => Some(section_id),
            _ => None,
        }
    }
}

/// A timestamped host notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttentionSignal {
    /// Schema version (must be "attn.signal.v1")
    pub schema_version: String,
    /// Unique signal identifier (optional, for deduplication)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal_id: Option<String>,
    /// When the host observed the notification (UTC)
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub payload: SignalPayload,
}

impl AttentionSignal {
    pub fn new(at: DateTime<Utc>, payload: SignalPayload) -> Self {
        AttentionSignal {
            schema_version: SCHEMA_VERSION.to_string(),
            signal_id: Some(uuid::Uuid::new_v4().to_string()),
            at,
            payload,
        }
    }

    pub fn observe(at: DateTime<Utc>, section_id: impl Into<String>) -> Self {
        Self::new(
            at,
            SignalPayload::Observe {
                section_id: section_id.into(),
            },
        )
    }

    pub fn unobserve(at: DateTime<Utc>, section_id: impl Into<String>) -> Self {
        Self::new(
            at,
            SignalPayload::Unobserve {
                section_id: section_id.into(),
            },
        )
    }

    pub fn scroll(at: DateTime<Utc>, section_id: impl Into<String>, delta_px: f64) -> Self {
        Self::new(
            at,
            SignalPayload::Scroll {
                section_id: section_id.into(),
                delta_px,
            },
        )
    }

    pub fn interaction(at: DateTime<Utc>, signal: SignalKind) -> Self {
        Self::new(at, SignalPayload::Interaction { signal })
    }

    pub fn visibility(at: DateTime<Utc>, visible: bool) -> Self {
        Self::new(at, SignalPayload::Visibility { visible })
    }

    pub fn tick(at: DateTime<Utc>) -> Self {
        Self::new(at, SignalPayload::Tick)
    }

    pub fn destroy(at: DateTime<Utc>) -> Self {
        Self::new(at, SignalPayload::Destroy)
    }

    /// Validate a single signal record
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(ValidationError::InvalidSchemaVersion {
                expected: SCHEMA_VERSION.to_string(),
                actual: self.schema_version.clone(),
            });
        }

        if let Some(section_id) = self.payload.section_id() {
            if section_id.trim().is_empty() {
                return Err(ValidationError::EmptySectionId {
                    signal_type: self.payload.type_name().to_string(),
                });
            }
        }

        if let SignalPayload::Scroll {
            section_id,
            delta_px,
        } = &self.payload
        {
            if !delta_px.is_finite() {
                return Err(ValidationError::NonFiniteScroll {
                    section_id: section_id.clone(),
                });
            }
        }

        Ok(())
    }
}

/// Validation errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid schema version: expected {expected}, got {actual}")]
    InvalidSchemaVersion { expected: String, actual: String },

    #[error("Empty section_id on {signal_type} signal")]
    EmptySectionId { signal_type: String },

    #[error("Scroll delta for section {section_id} is not a finite number")]
    NonFiniteScroll { section_id: String },

    #[error("Signal at {current} is earlier than the previous signal at {previous}")]
    OutOfOrder {
        previous: DateTime<Utc>,
        current: DateTime<Utc>,
    },
}
