//! Outbound seams of the engine
//!
//! [`DwellSink`] receives every completed dwell interval and is implemented by
//! the transport layer. [`DiagnosticSink`] receives the structured diagnostic
//! entries and must never influence tracking.

use crate::types::{Diagnostic, DwellEvent};

/// Receiver for emitted dwell intervals
pub trait DwellSink {
    fn emit(&mut self, event: DwellEvent);
}

/// Collects events in memory
impl DwellSink for Vec<DwellEvent> {
    fn emit(&mut self, event: DwellEvent) {
        self.push(event);
    }
}

/// Adapts a plain `emit(section_id, duration_ms)` callback into a [`DwellSink`]
pub struct FnSink<F>(pub F);

impl<F> DwellSink for FnSink<F>
where
    F: FnMut(&str, u64),
{
    fn emit(&mut self, event: DwellEvent) {
        (self.0)(&event.section_id, event.duration_ms)
    }
}

/// Receiver for diagnostic entries
pub trait DiagnosticSink {
    fn record(&mut self, diagnostic: &Diagnostic);
}

impl<F> DiagnosticSink for F
where
    F: FnMut(&Diagnostic),
{
    fn record(&mut self, diagnostic: &Diagnostic) {
        self(diagnostic)
    }
}
