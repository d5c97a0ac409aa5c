//! Error types for formguard

use thiserror::Error;

/// Errors that can occur at the crate's parse and transmission boundaries.
///
/// Numeric edge cases inside the calculators (zero elapsed time, empty
/// sample sets, empty similarity inputs) never surface here; they are
/// absorbed by skipping the recomputation or returning a neutral value.
#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("Failed to parse interaction event: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Event type {0} is missing its payload")]
    MissingPayload(&'static str),

    #[error("Report sink error: {0}")]
    SinkError(String),
}
