//! Error types.
//!
//! Degraded scorer outcomes are deliberately absent from [`FleetError`]: a
//! missing or failing scorer still produces a stored record, with status
//! `Unknown` or `Error`. Only inputs that cannot be evaluated at all, bad
//! configuration, and storage failures surface as errors.

use thiserror::Error;

use crate::validation::{join_messages, ValidationError};

/// Result alias for fleet operations.
pub type FleetResult<T> = Result<T, FleetError>;

/// Errors returned by fleet operations.
#[derive(Debug, Clone, Error)]
pub enum FleetError {
    /// The reading could not be turned into a feature vector. Nothing was stored.
    #[error("Invalid reading: {}", join_messages(.0))]
    InvalidReading(Vec<ValidationError>),

    /// Schedule options are inconsistent.
    #[error("Invalid schedule config: {}", join_messages(.0))]
    InvalidScheduleConfig(Vec<ValidationError>),

    /// Service configuration is inconsistent.
    #[error("Invalid config: {}", join_messages(.0))]
    InvalidConfig(Vec<ValidationError>),

    /// The record store failed.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl FleetError {
    /// Validation errors carried by this error, if any.
    pub fn validation_errors(&self) -> &[ValidationError] {
        match self {
            FleetError::InvalidReading(errors)
            | FleetError::InvalidScheduleConfig(errors)
            | FleetError::InvalidConfig(errors) => errors,
            FleetError::Storage(_) => &[],
        }
    }
}

/// Errors reported by a scorer for a single invocation.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ScorerError {
    /// The scorer rejected the input or failed internally.
    #[error("Scorer invocation failed: {0}")]
    Invocation(String),

    /// The scorer produced a NaN or infinite decision value.
    #[error("Scorer returned a non-finite value: {0}")]
    NonFinite(f64),
}
