//! Train record model.
//!
//! A record is the evaluated form of one submission: the train identity,
//! the reading it was derived from, and the health score and status the
//! evaluator assigned.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::SensorReading;

/// Operational health classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthStatus {
    /// Score above the optimal threshold.
    Optimal,
    /// Score between the two thresholds (inclusive).
    Monitor,
    /// Score below the maintenance threshold.
    #[serde(rename = "Maintenance Required")]
    MaintenanceRequired,
    /// No scorer was loaded when the reading was evaluated.
    Unknown,
    /// The scorer failed on this reading.
    Error,
}

impl HealthStatus {
    /// All statuses, in severity-independent display order.
    pub const ALL: [HealthStatus; 5] = [
        HealthStatus::Optimal,
        HealthStatus::Monitor,
        HealthStatus::MaintenanceRequired,
        HealthStatus::Unknown,
        HealthStatus::Error,
    ];

    /// Whether the status came from a successful scorer call.
    pub fn is_scored(self) -> bool {
        !matches!(self, HealthStatus::Unknown | HealthStatus::Error)
    }

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            HealthStatus::Optimal => "Optimal",
            HealthStatus::Monitor => "Monitor",
            HealthStatus::MaintenanceRequired => "Maintenance Required",
            HealthStatus::Unknown => "Unknown",
            HealthStatus::Error => "Error",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An evaluated submission for one train.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainRecord {
    /// Caller-supplied train identifier.
    pub train_id: String,
    /// The reading this record was evaluated from.
    #[serde(flatten)]
    pub reading: SensorReading,
    /// Normalized health (0-100).
    pub health_score: f64,
    /// Classification of `health_score`, or a degraded status.
    pub status: HealthStatus,
}

impl TrainRecord {
    /// Creates a record.
    pub fn new(
        train_id: impl Into<String>,
        reading: SensorReading,
        health_score: f64,
        status: HealthStatus,
    ) -> Self {
        Self {
            train_id: train_id.into(),
            reading,
            health_score,
            status,
        }
    }

    /// Whether this record clears a scheduling threshold (strictly above).
    #[inline]
    pub fn is_eligible(&self, threshold: f64) -> bool {
        self.health_score > threshold
    }
}
