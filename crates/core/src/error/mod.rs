//! # Error Handling Framework
//!
//! Structured error management for the security analysis pipeline.
//!
//! ## Core features
//!
//! - **Structured error types**: a stable [`ErrorCode`] per failure category.
//! - **Rich context**: per-event / per-entity metadata for debugging.
//! - **Severity classification**: appropriate log-level routing.
//! - **Metrics integration**: error rate and category tracking via [`ErrorMetrics`].
//!
//! ## Absorb, don't fail
//!
//! Every pipeline stage boundary and every collaborator I/O call is a catch
//! point. `Error` values produced inside a stage never propagate out of
//! `Pipeline::analyze` — they are folded into `EventResult.warnings[]` and
//! logged. See SPEC_FULL.md §7 for the full propagation policy.
//!
//! ```
//! use sentinel_core::error::{Error, ErrorCode, Result};
//!
//! fn validate_score(score: f64) -> Result<()> {
//!     if !(0.0..=100.0).contains(&score) {
//!         return Err(Error::new(ErrorCode::ValidationFailed, "score out of range"));
//!     }
//!     Ok(())
//! }
//! ```

pub mod codes;
pub mod context;
pub mod framework;
pub mod metrics;

pub use codes::ErrorCode;
pub use context::ErrorContext;
pub use framework::{Error, ErrorCategory, ErrorSeverity, Result};
pub use metrics::ErrorMetrics;
