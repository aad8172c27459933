//! Health evaluation: scorer seam, normalization policy, and evaluator.
//!
//! A reading becomes a health score in three steps:
//!
//! 1. Build the ordered [`FeatureVector`](crate::models::FeatureVector).
//! 2. Ask a [`DecisionScorer`] for a raw decision value (negative = anomaly).
//! 3. Normalize the value to 0-100 and classify it with a [`HealthPolicy`].
//!
//! # Usage
//!
//! ```
//! use std::sync::Arc;
//! use railx::health::{DecisionScorer, EvaluatorConfig, HealthEvaluator};
//! use railx::models::{AnalogChannels, FeatureVector, HealthStatus, SensorReading};
//! use railx::ScorerError;
//!
//! #[derive(Debug)]
//! struct Flat(f64);
//!
//! impl DecisionScorer for Flat {
//!     fn name(&self) -> &'static str { "flat" }
//!     fn decision_score(&self, _: &FeatureVector) -> Result<f64, ScorerError> { Ok(self.0) }
//! }
//!
//! let evaluator = HealthEvaluator::new(EvaluatorConfig::default())
//!     .with_scorer(Arc::new(Flat(0.15)));
//! let reading = SensorReading::new(AnalogChannels {
//!     tp2: 0.0, tp3: 9.0, h1: 9.0, dv_pressure: 0.0,
//!     reservoirs: 9.0, oil_temperature: 60.0, motor_current: 4.0,
//! });
//! let assessment = evaluator.evaluate(&reading).unwrap();
//! assert_eq!(assessment.health_score, 87.5);
//! assert_eq!(assessment.status, HealthStatus::Optimal);
//! ```

mod evaluator;
mod policy;

pub use evaluator::{EvaluatorConfig, HealthAssessment, HealthEvaluator};
pub use policy::{HealthPolicy, MAX_SCORE_DECIMALS};

use crate::error::ScorerError;
use crate::models::FeatureVector;
use std::fmt::Debug;

/// Raw decision value produced by a scorer.
///
/// Unbounded in principle, concentrated around zero in practice.
/// Negative values indicate an anomaly, positive values normal operation.
pub type DecisionScore = f64;

/// An anomaly scorer over fixed-length feature vectors.
///
/// # Score Convention
/// **Higher score = more normal.** Implementations must be monotonic in
/// normality; the evaluator relies on that when mapping scores to health.
pub trait DecisionScorer: Send + Sync + Debug {
    /// Scorer name (e.g., "isolation-forest").
    fn name(&self) -> &'static str;

    /// Scores one feature vector.
    fn decision_score(&self, features: &FeatureVector) -> Result<DecisionScore, ScorerError>;
}
