//! Input validation for submissions and configuration.
//!
//! Checks structural integrity before anything reaches the scorer or the
//! schedule generator. Detects:
//! - Empty train identifiers
//! - Non-finite or missing channel values
//! - Health policies whose thresholds or scale are unusable
//! - Schedule windows and slot widths that cannot tile an hour
//!
//! Every check collects all problems it finds instead of stopping at the
//! first one.

use std::fmt;

use crate::health::{HealthPolicy, MAX_SCORE_DECIMALS};
use crate::models::{DigitalChannels, SensorReading};
use crate::scheduler::ScheduleConfig;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Train identifier is empty or whitespace.
    EmptyTrainId,
    /// A channel value is NaN or infinite.
    NonFiniteChannel,
    /// A raw feature slice has the wrong number of channels.
    ChannelCountMismatch,
    /// Schedule hours are out of order or outside a day.
    InvalidHourRange,
    /// Slot width does not evenly divide an hour.
    InvalidSlotWidth,
    /// A health threshold is not usable.
    InvalidThreshold,
    /// Normalization constants are not usable.
    InvalidPolicy,
}

impl ValidationError {
    pub(crate) fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Joins error messages for display.
pub(crate) fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Validates a submission before evaluation.
///
/// Checks:
/// 1. `train_id` is not blank
/// 2. Every channel of the resolved feature vector is finite
pub fn validate_reading(
    train_id: &str,
    reading: &SensorReading,
    defaults: &DigitalChannels,
) -> ValidationResult {
    let mut errors = Vec::new();

    if train_id.trim().is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyTrainId,
            "Train ID must not be empty",
        ));
    }

    if let Err(channel_errors) = reading.to_features(defaults).check_finite() {
        errors.extend(channel_errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates normalization constants and classification thresholds.
///
/// Checks:
/// 1. `offset` and `span` are finite, `span > 0`
/// 2. Thresholds are finite and `0 <= maintenance_below <= optimal_above <= 100`
/// 3. `score_decimals` is at most [`MAX_SCORE_DECIMALS`]
pub fn validate_policy(policy: &HealthPolicy) -> ValidationResult {
    let mut errors = Vec::new();

    if !policy.offset.is_finite() {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidPolicy,
            format!("Offset must be finite, got {}", policy.offset),
        ));
    }
    if !(policy.span.is_finite() && policy.span > 0.0) {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidPolicy,
            format!("Span must be a positive finite number, got {}", policy.span),
        ));
    }
    if let Some(decimals) = policy.score_decimals.filter(|d| *d > MAX_SCORE_DECIMALS) {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidPolicy,
            format!("Score decimals must be at most {MAX_SCORE_DECIMALS}, got {decimals}"),
        ));
    }

    let lo = policy.maintenance_below;
    let hi = policy.optimal_above;
    if !(lo.is_finite() && hi.is_finite()) {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidThreshold,
            format!("Thresholds must be finite, got {lo} and {hi}"),
        ));
    } else if !(0.0..=100.0).contains(&lo) || !(0.0..=100.0).contains(&hi) || lo > hi {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidThreshold,
            format!(
                "Thresholds must satisfy 0 <= maintenance ({lo}) <= optimal ({hi}) <= 100"
            ),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates schedule generation options.
///
/// Checks:
/// 1. `start_hour <= end_hour <= 23`
/// 2. `slot_minutes` is in 1..=60 and divides 60
/// 3. `health_threshold` is finite
pub fn validate_schedule_config(config: &ScheduleConfig) -> ValidationResult {
    let mut errors = Vec::new();

    if config.end_hour > 23 {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidHourRange,
            format!("End hour must be at most 23, got {}", config.end_hour),
        ));
    }
    if config.start_hour > config.end_hour {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidHourRange,
            format!(
                "Start hour {} is after end hour {}",
                config.start_hour, config.end_hour
            ),
        ));
    }

    if config.slot_minutes == 0 || config.slot_minutes > 60 || 60 % config.slot_minutes != 0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidSlotWidth,
            format!(
                "Slot width must evenly divide 60 minutes, got {}",
                config.slot_minutes
            ),
        ));
    }

    if !config.health_threshold.is_finite() {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidThreshold,
            format!(
                "Health threshold must be finite, got {}",
                config.health_threshold
            ),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
