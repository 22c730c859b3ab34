use super::{ErrorCode, ErrorContext};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error as ThisError;

pub type Result<T> = std::result::Result<T, Error>;

/// Severity levels for errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    /// Low priority errors that don't affect pipeline output.
    Low,
    /// Medium priority errors that degrade one entity's or one branch's result.
    Medium,
    /// High priority errors affecting a whole stage.
    High,
    /// Critical errors that require immediate attention.
    Critical,
}

/// Error categories for classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    System,
    Backend,
    Response,
    Validation,
}

/// The crate-wide error type.
///
/// Every public pipeline method is total: stage and I/O boundaries catch
/// `Error` and fold it into a `warnings[]` entry or a partial result rather
/// than propagating it to the caller (SPEC_FULL.md §7).
#[derive(Debug, ThisError, Clone)]
pub struct Error {
    /// Standardized error code.
    pub code: ErrorCode,
    /// Human-readable error message.
    pub message: String,
    /// Optional detailed description.
    pub details: Option<String>,
    /// Error context for debugging.
    pub context: ErrorContext,
    /// Error severity.
    pub severity: ErrorSeverity,
    /// Optional cause chain.
    pub cause: Option<Box<Error>>,
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            context: ErrorContext::new(),
            severity: Self::default_severity_for_code(code),
            cause: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_severity(mut self, severity: ErrorSeverity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_cause(mut self, cause: Error) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    pub fn add_trace(mut self, trace: impl Into<String>) -> Self {
        self.context = self.context.add_trace(trace.into());
        self
    }

    pub fn add_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.context.add_metadata(key.into(), value);
        self
    }

    pub fn category(&self) -> ErrorCategory {
        match self.code.category() {
            "backend" => ErrorCategory::Backend,
            "response" => ErrorCategory::Response,
            "validation" => ErrorCategory::Validation,
            _ => ErrorCategory::System,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }

    pub fn should_log_as_error(&self) -> bool {
        self.code.should_log_as_error() || matches!(self.severity, ErrorSeverity::High | ErrorSeverity::Critical)
    }

    /// Render as a short, single-line warning suitable for `EventResult.warnings[]`.
    pub fn to_warning_string(&self) -> String {
        match &self.context.entity_key {
            Some(key) => format!("[{}] {}: {}", self.code, key, self.message),
            None => format!("[{}] {}", self.code, self.message),
        }
    }

    /// Full debug JSON for internal logging only.
    pub fn to_debug_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "code": self.code,
                "message": self.message,
                "details": self.details,
                "context": self.context,
                "severity": self.severity,
                "cause": self.cause.as_ref().map(|c| c.to_debug_json())
            }
        })
    }

    fn default_severity_for_code(code: ErrorCode) -> ErrorSeverity {
        match code {
            ErrorCode::RecognizerFieldInvalid => ErrorSeverity::Low,
            ErrorCode::ValidationFailed | ErrorCode::InvalidInput => ErrorSeverity::Low,
            ErrorCode::EffectorNotFound => ErrorSeverity::Medium,
            ErrorCode::BackendTimeout | ErrorCode::BackendUnavailable => ErrorSeverity::Medium,
            ErrorCode::EffectorExecutionFailed => ErrorSeverity::Medium,
            ErrorCode::BatchTimeout => ErrorSeverity::High,
            ErrorCode::PipelineStageFailed | ErrorCode::ConfigurationError => ErrorSeverity::Critical,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(details) = &self.details {
            write!(f, ": {}", details)?;
        }
        Ok(())
    }
}

impl Serialize for Error {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        #[derive(Serialize)]
        struct ErrorSer {
            code: ErrorCode,
            message: String,
            details: Option<String>,
            context: ErrorContext,
            severity: ErrorSeverity,
        }

        let error_ser = ErrorSer {
            code: self.code,
            message: self.message.clone(),
            details: self.details.clone(),
            context: self.context.clone(),
            severity: self.severity,
        };

        error_ser.serialize(serializer)
    }
}

// Convenience constructors for common errors.
impl Error {
    pub fn recognizer(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::RecognizerFieldInvalid, message)
    }

    pub fn backend_timeout(backend: &str, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BackendTimeout, message).add_trace(backend.to_string())
    }

    pub fn backend_unavailable(backend: &str, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BackendUnavailable, message).add_trace(backend.to_string())
    }

    pub fn effector_failed(effector: &str, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::EffectorExecutionFailed, message).add_trace(effector.to_string())
    }

    pub fn effector_not_found() -> Self {
        Self::new(ErrorCode::EffectorNotFound, "no suitable effector")
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigurationError, message)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::new(ErrorCode::InvalidInput, err.to_string()).add_trace("serde_json::Error conversion")
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Self::new(ErrorCode::ConfigurationError, err.to_string())
            .add_trace("config::ConfigError conversion")
    }
}
