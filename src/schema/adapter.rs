//! Parsing and batch validation for attn.signal.v1 streams

use crate::error::AttentionError;
use crate::schema::signal::*;
use chrono::{DateTime, Utc};

/// Adapter for reading signal streams
pub struct SignalAdapter;

impl SignalAdapter {
    /// Parse a JSON string containing an array of signals
    pub fn parse_array(json: &str) -> Result<Vec<AttentionSignal>, AttentionError> {
        let signals: Vec<AttentionSignal> = serde_json::from_str(json)?;
        Ok(signals)
    }

    /// Parse NDJSON (newline-delimited JSON) containing signals
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<AttentionSignal>, AttentionError> {
        let mut signals = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<AttentionSignal>(trimmed) {
                Ok(signal) => signals.push(signal),
                Err(e) => {
                    return Err(AttentionError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(signals)
    }

    /// Validate a batch of signals.
    ///
    /// Besides per-record checks, timestamps must be non-decreasing across the
    /// batch. Only failing records are returned.
    pub fn validate_signals(signals: &[AttentionSignal]) -> Vec<ValidationResult> {
        let mut results = Vec::new();
        let mut previous: Option<DateTime<Utc>> = None;

        for (idx, signal) in signals.iter().enumerate() {
            let mut error = signal.validate().err();

            if error.is_none() {
                if let Some(previous) = previous {
                    if signal.at < previous {
                        error = Some(ValidationError::OutOfOrder {
                            previous,
                            current: signal.at,
                        });
                    }
                }
            }

            previous = Some(previous.map_or(signal.at, |p| p.max(signal.at)));

            if error.is_some() {
                results.push(ValidationResult {
                    index: idx,
                    signal_id: signal.signal_id.clone(),
                    result: error,
                });
            }
        }

        results
    }
}

/// Result of signal validation
#[derive(Debug)]
pub struct ValidationResult {
    pub index: usize,
    pub signal_id: Option<String>,
    pub result: Option<ValidationError>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SignalKind;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 14, 0, 0).unwrap() + Duration::milliseconds(ms)
    }

    #[test]
    fn test_parse_ndjson_skips_blank_lines() {
        let ndjson = r#"
{"schema_version":"attn.signal.v1","at":"2024-01-15T14:00:00Z","type":"observe","section_id":"hero"}

{"schema_version":"attn.signal.v1","at":"2024-01-15T14:00:01Z","type":"tick"}
"#;
        let signals = SignalAdapter::parse_ndjson(ndjson).unwrap();
        assert_eq!(signals.len(), 2);
        assert_eq!(signals[0].payload.section_id(), Some("hero"));
    }

    #[test]
    fn test_parse_ndjson_reports_line_number() {
        let ndjson = "{\"schema_version\":\"attn.signal.v1\",\"at\":\"2024-01-15T14:00:00Z\",\"type\":\"tick\"}\nnot json\n";
        let err = SignalAdapter::parse_ndjson(ndjson).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_parse_array() {
        let json = r#"[
            {"schema_version":"attn.signal.v1","at":"2024-01-15T14:00:00Z","type":"visibility","visible":false},
            {"schema_version":"attn.signal.v1","at":"2024-01-15T14:00:01Z","type":"destroy"}
        ]"#;
        let signals = SignalAdapter::parse_array(json).unwrap();
        assert_eq!(signals.len(), 2);
        assert_eq!(signals[1].payload, SignalPayload::Destroy);
    }

    #[test]
    fn test_validate_signals_flags_only_bad_records() {
        let signals = vec![
            AttentionSignal::observe(at(0), "hero"),
            AttentionSignal::tick(at(2_000)),
            AttentionSignal::interaction(at(1_000), SignalKind::Click),
            AttentionSignal::observe(at(3_000), ""),
            AttentionSignal::tick(at(4_000)),
        ];

        let results = SignalAdapter::validate_signals(&signals);
        let indices: Vec<usize> = results.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![2, 3]);
        assert!(matches!(
            results[0].result,
            Some(ValidationError::OutOfOrder { .. })
        ));
    }
}
