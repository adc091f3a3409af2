//! Error types for the request boundary and the feedback collaborator.
//!
//! Scoring itself is total and never fails. These errors cover the two places
//! where something outside the core can go wrong: decoding a loosely-typed
//! request, and calling an optional narrative-feedback generator.

use thiserror::Error;

/// A request that could not be turned into a valid [`EvaluationRequest`].
///
/// [`EvaluationRequest`]: crate::model::EvaluationRequest
#[derive(Debug, Error)]
pub enum RequestError {
    /// The payload was not valid JSON or did not match the request shape.
    #[error("malformed request: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A numeric parameter fell outside its accepted range.
    #[error("{field} must be {expected}, got {value}")]
    OutOfRange {
        field: &'static str,
        expected: &'static str,
        value: f64,
    },

    /// The gold-standard message was empty.
    #[error("expected message is empty")]
    EmptyExpected,
}

/// Errors that can occur when calling a narrative-feedback generator.
#[derive(Debug, Error)]
pub enum FeedbackError {
    /// The generator asked us to slow down.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// The generator rejected our credentials.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The call did not finish in time.
    #[error("feedback timed out after {0}s")]
    Timeout(u64),

    /// The generator is unreachable or returned an error.
    #[error("feedback unavailable: {0}")]
    Unavailable(String),
}

impl FeedbackError {
    /// Returns `true` if retrying cannot help.
    pub fn is_permanent(&self) -> bool {
        matches!(self, FeedbackError::AuthenticationFailed(_))
    }

    /// Returns the retry-after delay in milliseconds, if applicable.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            FeedbackError::RateLimited { retry_after_ms } => Some(*retry_after_ms),
            _ => None,
        }
    }
}
