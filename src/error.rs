//! Error types for Vitalens

use thiserror::Error;

/// Errors that can occur during analysis.
///
/// These cover programmer-error conditions only: the caller fully controls
/// frame cadence and configuration, so invalid timestamps or impossible
/// configuration fail fast. Insufficient or degenerate *data* never errors;
/// it degrades to null metrics with zero confidence instead.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid landmark data: {0}")]
    InvalidLandmark(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),
}
