//! Error types for collectors and the timeline store

use thiserror::Error;

/// Failure of a single collector query. Never fatal to the sampler:
/// callers substitute a default and keep going.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CollectorError {
    /// The query interface could not be reached or exited non-zero
    #[error("{command} unavailable: {reason}")]
    Unavailable { command: String, reason: String },

    /// The query did not finish within the configured timeout
    #[error("{command} timed out after {timeout_ms}ms")]
    Timeout { command: String, timeout_ms: u64 },

    /// The response did not have the expected shape
    #[error("failed to parse {what}: {reason}")]
    Parse { what: String, reason: String },
}

impl CollectorError {
    pub fn parse(what: impl Into<String>, reason: impl ToString) -> Self {
        CollectorError::Parse {
            what: what.into(),
            reason: reason.to_string(),
        }
    }
}

/// Errors raised while building or loading a timeline
#[derive(Debug, Error)]
pub enum TimelineError {
    #[error("tick elapsed time went backwards: {previous}s followed by {next}s")]
    OutOfOrder { previous: f64, next: f64 },

    #[error("invalid poll interval: {0}s")]
    InvalidInterval(f64),

    #[error("timeline JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("timeline I/O error: {0}")]
    Io(#[from] std::io::Error),
}
