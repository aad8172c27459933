//! Metro fleet health scoring and service scheduling.
//!
//! Turns air-production-unit sensor readings into a 0-100 health score,
//! keeps an ordered registry of evaluated trains, and assigns healthy
//! trains to the day's departure slots in strict rotation.
//!
//! # Modules
//!
//! - **`models`**: Domain types (`Channel`, `FeatureVector`, `SensorReading`,
//!   `TrainRecord`, `HealthStatus`, `Schedule`)
//! - **`health`**: `DecisionScorer` seam, `HealthPolicy` normalization,
//!   `HealthEvaluator`
//! - **`forest`**: Isolation forest reference scorer, holdout fitting,
//!   JSON persistence
//! - **`registry`**: `TrainStore` seam and the in-memory registry
//! - **`scheduler`**: Round-robin `ScheduleGenerator` and `ScheduleKpi`
//! - **`fleet`**: `FleetService` facade and dashboard summary
//! - **`config`**: `FleetConfig` loading and environment overrides
//! - **`validation`**: Input integrity checks (train IDs, channels, hours, thresholds)
//!
//! # Data Flow
//!
//! ```text
//! SensorReading ─► FeatureVector ─► DecisionScorer ─► HealthPolicy ─► TrainRecord
//!                                                                        │
//!                                          Schedule ◄─ ScheduleGenerator ◄┘
//! ```
//!
//! # References
//!
//! - Liu, Ting & Zhou (2008), "Isolation Forest"
//! - Veloso et al. (2022), "The MetroPT dataset for predictive maintenance"

pub mod config;
pub mod error;
pub mod fleet;
pub mod forest;
pub mod health;
pub mod models;
pub mod registry;
pub mod scheduler;
pub mod validation;

pub use config::{FleetConfig, SubmissionPolicy};
pub use error::{FleetError, FleetResult, ScorerError};
pub use fleet::{FleetService, FleetSummary};
pub use forest::{ForestError, IsolationForest};
pub use health::{DecisionScorer, HealthEvaluator, HealthPolicy};
