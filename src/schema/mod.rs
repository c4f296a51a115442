//! attn.signal.v1 schema
//!
//! This module defines the serialized form of the host notifications that
//! drive the engine, so recorded sessions can be validated and replayed.

mod adapter;
mod signal;

pub use adapter::*;
pub use signal::*;
