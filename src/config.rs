//! Service configuration.
//!
//! Loaded from JSON (every field optional), then adjusted from the
//! environment:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `RAILX_MODEL_PATH` | `model_path` |
//! | `RAILX_HEALTH_OFFSET` | `policy.offset` |
//! | `RAILX_HEALTH_SPAN` | `policy.span` |
//! | `RAILX_HEALTH_THRESHOLD` | `schedule.health_threshold` |
//!
//! Unparseable values are ignored with a warning.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::error::{FleetError, FleetResult};
use crate::health::{EvaluatorConfig, HealthPolicy};
use crate::models::DigitalChannels;
use crate::scheduler::ScheduleConfig;
use crate::validation::validate_schedule_config;

pub const ENV_MODEL_PATH: &str = "RAILX_MODEL_PATH";
pub const ENV_HEALTH_OFFSET: &str = "RAILX_HEALTH_OFFSET";
pub const ENV_HEALTH_SPAN: &str = "RAILX_HEALTH_SPAN";
pub const ENV_HEALTH_THRESHOLD: &str = "RAILX_HEALTH_THRESHOLD";

/// Errors reading a configuration source.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// How a resubmission for a known train is stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionPolicy {
    /// Every submission adds a record; a train may be listed repeatedly.
    #[default]
    Append,
    /// A submission replaces the train's latest record in place.
    ReplaceLatest,
}

/// Top-level service configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    /// Score normalization and classification.
    pub policy: HealthPolicy,
    /// Baseline for digital channels a reading leaves unset.
    pub digital_defaults: DigitalChannels,
    /// Default schedule options.
    pub schedule: ScheduleConfig,
    /// Resubmission handling.
    pub submission: SubmissionPolicy,
    /// Persisted anomaly model, if any.
    pub model_path: Option<PathBuf>,
}

impl FleetConfig {
    /// Parses a JSON config. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Applies `RAILX_*` environment overrides.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary key lookup.
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(path) = lookup(ENV_MODEL_PATH)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
        {
            self.model_path = Some(PathBuf::from(path));
        }
        if let Some(offset) = parse_f64(&lookup, ENV_HEALTH_OFFSET) {
            self.policy.offset = offset;
        }
        if let Some(span) = parse_f64(&lookup, ENV_HEALTH_SPAN) {
            self.policy.span = span;
        }
        if let Some(threshold) = parse_f64(&lookup, ENV_HEALTH_THRESHOLD) {
            self.schedule.health_threshold = threshold;
        }
        self
    }

    /// Evaluator settings derived from this config.
    pub fn evaluator_config(&self) -> EvaluatorConfig {
        EvaluatorConfig::default()
            .with_policy(self.policy)
            .with_digital_defaults(self.digital_defaults)
    }

    /// Checks the policy, digital defaults, and schedule options.
    ///
    /// A schedule threshold that differs from the policy's maintenance
    /// boundary is allowed but logged.
    pub fn validate(&self) -> FleetResult<()> {
        let mut errors = self.evaluator_config().validate().err().unwrap_or_default();
        if let Err(schedule_errors) = validate_schedule_config(&self.schedule) {
            errors.extend(schedule_errors);
        }
        if !errors.is_empty() {
            return Err(FleetError::InvalidConfig(errors));
        }

        if self.schedule.health_threshold != self.policy.maintenance_below {
            tracing::warn!(
                schedule_threshold = self.schedule.health_threshold,
                maintenance_below = self.policy.maintenance_below,
                "schedule threshold differs from maintenance threshold"
            );
        }
        Ok(())
    }
}

fn parse_f64(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<f64> {
    let value = lookup(key)?;
    match value.trim().parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => Some(parsed),
        _ => {
            tracing::warn!(key, value = %value, "ignoring unparseable override");
            None
        }
    }
}
