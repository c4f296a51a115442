//! Attention Quality - bounded, quality-filtered section dwell-time telemetry
//!
//! Naively timing "section visible" inflates numbers when the tab is in the
//! background, the user has walked away, or the user is parked on one section
//! for minutes. The engine fuses page visibility, user activity and scroll
//! distance into per-section dwell events of uniform size:
//! host signals → monitors → engine → section timers → dwell sink.
//!
//! ## Modules
//!
//! - **Engine**: [`AttentionEngine`] with its monitors, timers and scroll trackers
//! - **Replay**: drive the engine from recorded `attn.signal.v1` streams

pub mod activity;
pub mod config;
pub mod engine;
pub mod error;
pub mod replay;
pub mod schema;
pub mod scroll;
pub mod sink;
pub mod timer;
pub mod types;
pub mod visibility;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::{AttentionConfig, CatchUpPolicy};
pub use engine::{AttentionEngine, HostCapabilities};
pub use error::AttentionError;
pub use sink::{DiagnosticSink, DwellSink, FnSink};
pub use types::{
    Activity, Diagnostic, DiagnosticReason, DwellEvent, GlobalAttentionState, SectionSnapshot,
    SignalKind, TimerPhase, Visibility,
};

// Schema exports
pub use schema::{AttentionSignal, SignalAdapter, SCHEMA_VERSION};

// Replay exports
pub use replay::{replay_to_dwell, DwellReport, ReplayProcessor};

/// Engine version embedded in every report
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "attention-quality";
