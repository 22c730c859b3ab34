use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable error codes for the security analysis pipeline.
///
/// These are business-agnostic technical categories, grouped by numeric range
/// the way the taxonomy in SPEC_FULL.md §7.1 describes. Codes are attached to
/// every [`super::Error`] so logs, metrics, and `warnings[]` entries can be
/// correlated without parsing free-text messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Recognizer errors (1000-1999)
    RecognizerFieldInvalid = 1000,

    // Backend (collaborator) errors (2000-2999)
    BackendTimeout = 2000,
    BackendUnavailable = 2001,

    // Response / effector errors (3000-3999)
    EffectorExecutionFailed = 3000,
    EffectorNotFound = 3001,

    // Pipeline / system errors (4000-4999)
    PipelineStageFailed = 4000,
    BatchTimeout = 4001,
    ConfigurationError = 4002,

    // Validation errors (5000-5999)
    ValidationFailed = 5000,
    InvalidInput = 5001,
}

impl ErrorCode {
    /// Error category for metrics and logging.
    pub fn category(&self) -> &'static str {
        match self {
            ErrorCode::RecognizerFieldInvalid => "validation",
            ErrorCode::BackendTimeout | ErrorCode::BackendUnavailable => "backend",
            ErrorCode::EffectorExecutionFailed | ErrorCode::EffectorNotFound => "response",
            ErrorCode::PipelineStageFailed
            | ErrorCode::BatchTimeout
            | ErrorCode::ConfigurationError => "system",
            ErrorCode::ValidationFailed | ErrorCode::InvalidInput => "validation",
        }
    }

    /// Whether a failure with this code should be retried by the caller.
    ///
    /// Matches the convention that network/timeout-class codes are
    /// retryable; everything else (validation, missing effector, absorbed
    /// pipeline faults) is not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorCode::BackendTimeout | ErrorCode::BackendUnavailable)
    }

    /// Whether this code should be logged at `error` level rather than `warn`/`debug`.
    pub fn should_log_as_error(&self) -> bool {
        matches!(
            self,
            ErrorCode::PipelineStageFailed | ErrorCode::ConfigurationError
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
