//! # Configuration Management
//!
//! Hierarchical configuration for the security analysis pipeline, loaded from
//! multiple sources in order of precedence:
//!
//! 1. **Environment variables** (highest precedence)
//! 2. **Environment-specific TOML files** (e.g. `config/production.toml`)
//! 3. **Default TOML file** (`config/default.toml`) (lowest precedence)
//!
//! ## Usage
//!
//! ```no_run
//! use sentinel_core::PipelineConfig;
//!
//! let config = PipelineConfig::load().expect("failed to load configuration");
//! let threshold = config.min_risk_threshold_for_response;
//! ```
//!
//! ## Environment selection
//!
//! The `ENVIRONMENT` variable selects `development` (default), `testing`, or
//! `production`. Programmatic embedders that don't want file-based
//! configuration at all can skip `load()` and use [`PipelineConfig::default`]
//! directly.

use crate::error::{Error, Result};
use config::{Environment, File};
use serde::Deserialize;
use std::env;

/// Top-level pipeline configuration.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PipelineConfig {
    /// Whether stage 3 (ExpansionEngine) runs at all.
    pub enable_connection_expansion: bool,
    /// Whether stage 4 (Scorer) runs at all.
    pub enable_risk_scoring: bool,
    /// Whether stage 5 (ResponseOrchestrator) runs at all.
    pub enable_auto_response: bool,
    /// Upper bound on concurrently in-flight `Analyze` calls within `BatchAnalyze`.
    pub max_concurrent_processing: usize,
    /// Wall-clock deadline for a `BatchAnalyze` call, in seconds.
    pub processing_timeout_seconds: u64,
    /// Minimum max-entity-risk-score required before any response is dispatched.
    pub min_risk_threshold_for_response: f64,
    /// ExpansionEngine tuning (SPEC_FULL.md §4.2).
    pub expansion: ExpansionConfig,
    /// Prometheus metrics configuration.
    pub metrics: MetricsConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            enable_connection_expansion: true,
            enable_risk_scoring: true,
            enable_auto_response: true,
            max_concurrent_processing: 10,
            processing_timeout_seconds: 300,
            min_risk_threshold_for_response: 50.0,
            expansion: ExpansionConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

/// Tuning knobs for [`crate::expansion::ExpansionEngine`].
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ExpansionConfig {
    /// Only the first level is invoked by the pipeline; deeper recursion is out-of-core.
    pub max_expansion_depth: u32,
    /// Applied after dedup and confidence filtering, to the merged result.
    pub max_entities_per_expansion: usize,
    /// Window used by temporal-correlation expansion.
    pub time_window_hours: i64,
    /// Entities below this effective confidence are dropped during merge.
    pub min_confidence_threshold: f64,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            max_expansion_depth: 3,
            max_entities_per_expansion: 50,
            time_window_hours: 24,
            min_confidence_threshold: 0.3,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub namespace: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            namespace: "sentinel".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from `config/default.toml`, an environment-specific
    /// override file, and environment variables, in that order of increasing
    /// precedence. Validates the result before returning it.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use sentinel_core::PipelineConfig;
    ///
    /// std::env::set_var("MAX_CONCURRENT_PROCESSING", "25");
    /// let config = PipelineConfig::load()?;
    /// assert_eq!(config.max_concurrent_processing, 25);
    /// # Ok::<(), sentinel_core::error::Error>(())
    /// ```
    pub fn load() -> Result<Self> {
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let builder = config::Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            .add_source(Environment::with_prefix("").separator("_"));

        let built = builder.build()?;
        let loaded: PipelineConfig = built.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Cross-field validation. Returns `ErrorCode::ConfigurationError` on the
    /// first violation found, so a misconfigured pipeline fails fast at
    /// startup rather than misbehaving silently at the first `Analyze` call.
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_processing == 0 {
            return Err(Error::configuration(
                "max_concurrent_processing must be at least 1",
            ));
        }

        if self.processing_timeout_seconds == 0 {
            return Err(Error::configuration(
                "processing_timeout_seconds must be greater than 0",
            ));
        }

        if !(0.0..=100.0).contains(&self.min_risk_threshold_for_response) {
            return Err(Error::configuration(
                "min_risk_threshold_for_response must be between 0 and 100",
            ));
        }

        if !(0.0..=1.0).contains(&self.expansion.min_confidence_threshold) {
            return Err(Error::configuration(
                "expansion.min_confidence_threshold must be between 0 and 1",
            ));
        }

        if self.expansion.max_entities_per_expansion == 0 {
            return Err(Error::configuration(
                "expansion.max_entities_per_expansion must be at least 1",
            ));
        }

        Ok(())
    }

    /// Apply a partial update, re-validating before committing. Used by
    /// `Pipeline::update_configuration` (SPEC_FULL.md §4.5.1).
    pub fn merged_with(&self, partial: PartialPipelineConfig) -> Result<Self> {
        let mut next = self.clone();

        if let Some(v) = partial.enable_connection_expansion {
            next.enable_connection_expansion = v;
        }
        if let Some(v) = partial.enable_risk_scoring {
            next.enable_risk_scoring = v;
        }
        if let Some(v) = partial.enable_auto_response {
            next.enable_auto_response = v;
        }
        if let Some(v) = partial.max_concurrent_processing {
            next.max_concurrent_processing = v;
        }
        if let Some(v) = partial.processing_timeout_seconds {
            next.processing_timeout_seconds = v;
        }
        if let Some(v) = partial.min_risk_threshold_for_response {
            next.min_risk_threshold_for_response = v;
        }
        if let Some(v) = partial.max_entities_per_expansion {
            next.expansion.max_entities_per_expansion = v;
        }
        if let Some(v) = partial.min_confidence_threshold {
            next.expansion.min_confidence_threshold = v;
        }
        if let Some(v) = partial.time_window_hours {
            next.expansion.time_window_hours = v;
        }

        next.validate()?;
        Ok(next)
    }
}

/// Partial configuration update accepted by `Pipeline::update_configuration`.
/// Every field is optional; absent fields leave the current value untouched.
#[derive(Debug, Default, Deserialize, Clone)]
pub struct PartialPipelineConfig {
    pub enable_connection_expansion: Option<bool>,
    pub enable_risk_scoring: Option<bool>,
    pub enable_auto_response: Option<bool>,
    pub max_concurrent_processing: Option<usize>,
    pub processing_timeout_seconds: Option<u64>,
    pub min_risk_threshold_for_response: Option<f64>,
    pub max_entities_per_expansion: Option<usize>,
    pub min_confidence_threshold: Option<f64>,
    pub time_window_hours: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_concurrency() {
        let mut cfg = PipelineConfig::default();
        cfg.max_concurrent_processing = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let mut cfg = PipelineConfig::default();
        cfg.min_risk_threshold_for_response = 150.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn merged_with_overrides_only_named_fields() {
        let base = PipelineConfig::default();
        let partial = PartialPipelineConfig {
            max_concurrent_processing: Some(42),
            ..Default::default()
        };
        let merged = base.merged_with(partial).unwrap();
        assert_eq!(merged.max_concurrent_processing, 42);
        assert_eq!(
            merged.min_risk_threshold_for_response,
            base.min_risk_threshold_for_response
        );
    }

    #[test]
    fn merged_with_rejects_invalid_override() {
        let base = PipelineConfig::default();
        let partial = PartialPipelineConfig {
            max_concurrent_processing: Some(0),
            ..Default::default()
        };
        assert!(base.merged_with(partial).is_err());
    }
}
