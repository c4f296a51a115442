//! Error types for the attention-quality engine
//!
//! The engine's own transitions are total and never fail. These errors only come
//! out of the surfaces that parse untrusted input: configuration JSON, the
//! signal schema, the replay pipeline, the CLI and the FFI layer.

use thiserror::Error;

/// Errors raised while parsing or replaying attention input
#[derive(Debug, Error)]
pub enum AttentionError {
    #[error("Failed to parse signal stream: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid signal: {0}")]
    InvalidSignal(#[from] crate::schema::ValidationError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown section: {0}")]
    UnknownSection(String),

    #[error("Engine has been destroyed")]
    EngineDestroyed,
}
