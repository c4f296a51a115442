//! Replay pipeline
//!
//! Drives an [`AttentionEngine`] from recorded attn.signal.v1 streams. This is
//! the public API used by the CLI and the FFI layer, and a convenient way to
//! reproduce a user session offline.

use crate::config::AttentionConfig;
use crate::engine::AttentionEngine;
use crate::error::AttentionError;
use crate::schema::{AttentionSignal, SignalAdapter, SignalPayload, ValidationError};
use crate::sink::DwellSink;
use crate::types::{DwellEvent, SectionSnapshot};
use crate::{ENGINE_VERSION, PRODUCER_NAME};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Producer metadata attached to every report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Producer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

impl Producer {
    fn new() -> Self {
        Self {
            name: PRODUCER_NAME.to_string(),
            version: ENGINE_VERSION.to_string(),
            instance_id: Uuid::new_v4().to_string(),
        }
    }
}

/// Result of replaying a signal stream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DwellReport {
    pub producer: Producer,
    pub config: AttentionConfig,
    pub events: Vec<DwellEvent>,
    /// Sections still tracked at the end of the stream
    pub sections: Vec<SectionSnapshot>,
    pub total_dwell_ms: u64,
}

/// Apply one signal to an engine
pub fn apply_signal<S: DwellSink>(
    engine: &mut AttentionEngine<S>,
    signal: &AttentionSignal,
) -> Result<(), AttentionError> {
    if engine.is_destroyed() {
        return Err(AttentionError::EngineDestroyed);
    }
    signal.validate()?;

    let now = signal.at;
    match &signal.payload {
        SignalPayload::Observe { section_id } => engine.observe_section(section_id, now),
        SignalPayload::Unobserve { section_id } => {
            engine.unobserve_section(section_id);
        }
        SignalPayload::Scroll {
            section_id,
            delta_px,
        } => engine.report_scroll(section_id, *delta_px, now),
        SignalPayload::Interaction { signal } => engine.record_interaction(*signal, now),
        SignalPayload::Visibility { visible } => engine.on_visibility_change(*visible, now),
        SignalPayload::Tick => engine.tick(now),
        SignalPayload::Destroy => engine.destroy(),
    }
    Ok(())
}

/// Replay a JSON array of signals with the default configuration (stateless, one-shot).
///
/// # Returns
/// [`DwellReport`] JSON string
///
/// # Example
/// ```ignore
/// let report_json = replay_to_dwell(signals_json)?;
/// ```
pub fn replay_to_dwell(signals_json: String) -> Result<String, AttentionError> {
    replay_with_config(&signals_json, AttentionConfig::default())
}

/// Replay a JSON array of signals with an explicit configuration
pub fn replay_with_config(
    signals_json: &str,
    config: AttentionConfig,
) -> Result<String, AttentionError> {
    let signals = SignalAdapter::parse_array(signals_json)?;
    let report = replay_signals(&signals, config)?;
    Ok(serde_json::to_string(&report)?)
}

/// Replay already parsed signals into a report
pub fn replay_signals(
    signals: &[AttentionSignal],
    config: AttentionConfig,
) -> Result<DwellReport, AttentionError> {
    if let Some(invalid) = SignalAdapter::validate_signals(signals).into_iter().next() {
        if let Some(error) = invalid.result {
            return Err(error.into());
        }
    }

    let mut processor = ReplayProcessor::with_config(config);
    for signal in signals {
        processor.process_signal(signal)?;
    }
    Ok(processor.report())
}

/// Stateful processor for streaming replay.
///
/// The engine is created lazily at the timestamp of the first signal.
pub struct ReplayProcessor {
    config: AttentionConfig,
    engine: Option<AttentionEngine<Vec<DwellEvent>>>,
    producer: Producer,
    events: Vec<DwellEvent>,
    last_at: Option<DateTime<Utc>>,
}

impl Default for ReplayProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplayProcessor {
    /// Create a processor with the default configuration
    pub fn new() -> Self {
        Self::with_config(AttentionConfig::default())
    }

    /// Create a processor with a specific configuration (normalized here)
    pub fn with_config(config: AttentionConfig) -> Self {
        Self {
            config: config.normalized(),
            engine: None,
            producer: Producer::new(),
            events: Vec::new(),
            last_at: None,
        }
    }

    pub fn config(&self) -> &AttentionConfig {
        &self.config
    }

    pub fn is_destroyed(&self) -> bool {
        self.engine.as_ref().is_some_and(|engine| engine.is_destroyed())
    }

    /// Process one signal and return the dwell events it produced
    pub fn process_signal(
        &mut self,
        signal: &AttentionSignal,
    ) -> Result<Vec<DwellEvent>, AttentionError> {
        if let Some(previous) = self.last_at {
            if signal.at < previous {
                return Err(ValidationError::OutOfOrder {
                    previous,
                    current: signal.at,
                }
                .into());
            }
        }

        let config = &self.config;
        let engine = self
            .engine
            .get_or_insert_with(|| AttentionEngine::new(config.clone(), Vec::new(), signal.at));
        apply_signal(engine, signal)?;
        self.last_at = Some(signal.at);

        let emitted: Vec<DwellEvent> = std::mem::take(engine.sink_mut());
        self.events.extend(emitted.iter().cloned());
        Ok(emitted)
    }

    /// Parse and process one NDJSON line
    pub fn process_line(&mut self, line: &str) -> Result<Vec<DwellEvent>, AttentionError> {
        let signal: AttentionSignal = serde_json::from_str(line.trim())
            .map_err(|e| AttentionError::ParseError(format!("Failed to parse signal: {}", e)))?;
        self.process_signal(&signal)
    }

    /// Every event emitted so far
    pub fn events(&self) -> &[DwellEvent] {
        &self.events
    }

    /// Hand over accumulated events, leaving the processor's history empty
    pub fn drain_events(&mut self) -> Vec<DwellEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn sections(&self) -> Vec<SectionSnapshot> {
        self.engine
            .as_ref()
            .map(|engine| engine.sections())
            .unwrap_or_default()
    }

    pub fn section(&self, section_id: &str) -> Result<SectionSnapshot, AttentionError> {
        self.engine
            .as_ref()
            .and_then(|engine| engine.section(section_id))
            .ok_or_else(|| AttentionError::UnknownSection(section_id.to_string()))
    }

    /// Snapshot of tracked sections as JSON
    pub fn snapshot_json(&self) -> Result<String, AttentionError> {
        Ok(serde_json::to_string(&self.sections())?)
    }

    /// Build a report from everything processed so far
    pub fn report(&self) -> DwellReport {
        DwellReport {
            producer: self.producer.clone(),
            config: self.config.clone(),
            events: self.events.clone(),
            sections: self.sections(),
            total_dwell_ms: self.events.iter().map(|e| e.duration_ms).sum(),
        }
    }
}
