//! Score normalization and status classification.
//!
//! # Normalization
//!
//! `health = clamp((raw + offset) / span * 100, 0, 100)`
//!
//! With the defaults (offset 0.2, span 0.4) a raw value of -0.2 maps to 0 and
//! 0.2 maps to 100. The constants reflect the scorer's raw-score distribution
//! at training time and are never derived from request data.
//!
//! # Classification
//!
//! | Score | Status |
//! |-------|--------|
//! | `> optimal_above` (70) | Optimal |
//! | `< maintenance_below` (40) | Maintenance Required |
//! | otherwise (boundaries included) | Monitor |
//!
//! Classification sees the unrounded score; `score_decimals` only affects
//! the stored value.

use serde::{Deserialize, Serialize};

use super::DecisionScore;
use crate::models::HealthStatus;

/// Largest stored-score precision that rounds without overflowing.
pub const MAX_SCORE_DECIMALS: u32 = 15;

/// Normalization constants and classification thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthPolicy {
    /// Added to the raw score before scaling.
    pub offset: f64,
    /// Raw-score width mapped onto 0-100.
    pub span: f64,
    /// Scores strictly above this are `Optimal`.
    pub optimal_above: f64,
    /// Scores strictly below this are `MaintenanceRequired`.
    pub maintenance_below: f64,
    /// Decimal places kept in the stored score (`None` = no rounding).
    pub score_decimals: Option<u32>,
}

impl Default for HealthPolicy {
    fn default() -> Self {
        Self {
            offset: 0.2,
            span: 0.4,
            optimal_above: 70.0,
            maintenance_below: 40.0,
            score_decimals: Some(2),
        }
    }
}

impl HealthPolicy {
    /// Sets the normalization constants.
    pub fn with_scale(mut self, offset: f64, span: f64) -> Self {
        self.offset = offset;
        self.span = span;
        self
    }

    /// Sets the classification thresholds.
    pub fn with_thresholds(mut self, maintenance_below: f64, optimal_above: f64) -> Self {
        self.maintenance_below = maintenance_below;
        self.optimal_above = optimal_above;
        self
    }

    /// Sets the stored-score precision.
    pub fn with_score_decimals(mut self, decimals: Option<u32>) -> Self {
        self.score_decimals = decimals;
        self
    }

    /// Maps a raw decision value to an unrounded health score in [0, 100].
    ///
    /// Monotonically non-decreasing in `raw`. NaN maps to 0. Classification
    /// uses this value.
    pub fn scale(&self, raw: DecisionScore) -> f64 {
        if raw.is_nan() {
            return 0.0;
        }
        ((raw + self.offset) / self.span * 100.0).clamp(0.0, 100.0)
    }

    /// Rounds a score to the stored precision.
    ///
    /// Precision beyond [`MAX_SCORE_DECIMALS`] leaves the score unrounded.
    pub fn round_score(&self, score: f64) -> f64 {
        match self.score_decimals {
            Some(d) if d <= MAX_SCORE_DECIMALS => {
                let factor = 10f64.powi(d as i32);
                (score * factor).round() / factor
            }
            _ => score,
        }
    }

    /// Stored health score for a raw decision value: [`scale`](Self::scale)
    /// then [`round_score`](Self::round_score).
    pub fn normalize(&self, raw: DecisionScore) -> f64 {
        self.round_score(self.scale(raw))
    }

    /// Stored score and status for a raw decision value.
    ///
    /// The status is classified on the unrounded score, so rounding never
    /// moves a value across a threshold.
    pub fn assess(&self, raw: DecisionScore) -> (f64, HealthStatus) {
        let score = self.scale(raw);
        (self.round_score(score), self.classify(score))
    }

    /// Classifies a health score.
    pub fn classify(&self, score: f64) -> HealthStatus {
        if score > self.optimal_above {
            HealthStatus::Optimal
        } else if score < self.maintenance_below {
            HealthStatus::MaintenanceRequired
        } else {
            HealthStatus::Monitor
        }
    }
}
