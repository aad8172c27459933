//! Health evaluator.
//!
//! # Failure Handling
//!
//! | Situation | Result |
//! |-----------|--------|
//! | Non-finite channel | `Err(FleetError::InvalidReading)`, scorer not called |
//! | No scorer loaded | score 0, `Unknown` |
//! | Scorer error or non-finite output | score 0, `Error` |
//!
//! Degraded outcomes are returned as values so the caller can still record
//! that a reading arrived.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{DecisionScore, DecisionScorer, HealthPolicy};
use crate::error::{FleetError, FleetResult, ScorerError};
use crate::models::{DigitalChannels, FeatureVector, HealthStatus, SensorReading};
use crate::validation::{validate_policy, ValidationResult};

/// Evaluator settings, fixed at construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    /// Normalization and classification.
    pub policy: HealthPolicy,
    /// Baseline for digital channels a reading leaves unset.
    pub digital_defaults: DigitalChannels,
}

impl EvaluatorConfig {
    /// Sets the health policy.
    pub fn with_policy(mut self, policy: HealthPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the digital channel baseline.
    pub fn with_digital_defaults(mut self, defaults: DigitalChannels) -> Self {
        self.digital_defaults = defaults;
        self
    }

    /// Checks the policy and that every default is finite.
    pub fn validate(&self) -> ValidationResult {
        let mut errors = validate_policy(&self.policy).err().unwrap_or_default();
        let defaults = FeatureVector::from_fn(|c| self.digital_defaults.get(c).unwrap_or(0.0));
        if let Err(channel_errors) = defaults.check_finite() {
            errors.extend(channel_errors);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Outcome of evaluating one reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthAssessment {
    /// Normalized health (0-100); 0 for degraded outcomes.
    pub health_score: f64,
    /// Classification or degraded status.
    pub status: HealthStatus,
    /// Raw decision value, when the scorer produced a usable one.
    pub raw_score: Option<DecisionScore>,
}

impl HealthAssessment {
    fn unknown() -> Self {
        Self {
            health_score: 0.0,
            status: HealthStatus::Unknown,
            raw_score: None,
        }
    }

    fn error() -> Self {
        Self {
            health_score: 0.0,
            status: HealthStatus::Error,
            raw_score: None,
        }
    }
}

/// Maps readings to health scores through an optional scorer.
///
/// The scorer is optional so that a process can start, and keep recording
/// readings, before a model is available.
#[derive(Debug, Clone, Default)]
pub struct HealthEvaluator {
    config: EvaluatorConfig,
    scorer: Option<Arc<dyn DecisionScorer>>,
}

impl HealthEvaluator {
    /// Creates an evaluator without a scorer.
    pub fn new(config: EvaluatorConfig) -> Self {
        Self {
            config,
            scorer: None,
        }
    }

    /// Attaches a scorer.
    pub fn with_scorer(mut self, scorer: Arc<dyn DecisionScorer>) -> Self {
        self.scorer = Some(scorer);
        self
    }

    /// Attaches a scorer if one was loaded.
    pub fn with_optional_scorer(mut self, scorer: Option<Arc<dyn DecisionScorer>>) -> Self {
        self.scorer = scorer;
        self
    }

    /// Whether a scorer is attached.
    pub fn has_scorer(&self) -> bool {
        self.scorer.is_some()
    }

    /// The evaluator's configuration.
    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    /// Builds and checks the feature vector for a reading.
    pub fn features(&self, reading: &SensorReading) -> FleetResult<FeatureVector> {
        let features = reading.to_features(&self.config.digital_defaults);
        features.check_finite().map_err(FleetError::InvalidReading)?;
        Ok(features)
    }

    /// Evaluates a reading.
    ///
    /// Fails only when the reading cannot be turned into a valid feature
    /// vector; scorer problems are reported through the status.
    pub fn evaluate(&self, reading: &SensorReading) -> FleetResult<HealthAssessment> {
        let features = self.features(reading)?;
        Ok(self.evaluate_features(&features))
    }

    /// Evaluates an already-built feature vector.
    ///
    /// A vector with non-finite values is not passed to the scorer and
    /// yields an `Error` assessment.
    pub fn evaluate_features(&self, features: &FeatureVector) -> HealthAssessment {
        let Some(scorer) = &self.scorer else {
            tracing::warn!("no scorer loaded; reading marked as unknown");
            return HealthAssessment::unknown();
        };

        if features.check_finite().is_err() {
            tracing::warn!(scorer = scorer.name(), "non-finite features; reading marked as error");
            return HealthAssessment::error();
        }

        let raw = match scorer.decision_score(features) {
            Ok(raw) if raw.is_finite() => raw,
            Ok(raw) => {
                let err = ScorerError::NonFinite(raw);
                tracing::warn!(scorer = scorer.name(), error = %err, "reading marked as error");
                return HealthAssessment::error();
            }
            Err(err) => {
                tracing::warn!(scorer = scorer.name(), error = %err, "reading marked as error");
                return HealthAssessment::error();
            }
        };

        let policy = &self.config.policy;
        let (health_score, status) = policy.assess(raw);
        tracing::debug!(
            scorer = scorer.name(),
            raw,
            health_score,
            status = %status,
            "reading evaluated"
        );

        HealthAssessment {
            health_score,
            status,
            raw_score: Some(raw),
        }
    }
}
