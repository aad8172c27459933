//! Fleet service: submission, listing, scheduling, and dashboard summary.
//!
//! [`FleetService`] wires a [`HealthEvaluator`], a [`TrainStore`], and a
//! [`ScheduleGenerator`] together. It is `Send + Sync` and meant to be
//! shared behind an `Arc` by whatever transport fronts it.
//!
//! # Example
//!
//! ```
//! use railx::config::FleetConfig;
//! use railx::fleet::FleetService;
//! use railx::models::{AnalogChannels, HealthStatus, ScheduleOutcome, SensorReading};
//!
//! // No model configured: readings are still recorded, as Unknown.
//! let service = FleetService::from_config(&FleetConfig::default(), None).unwrap();
//! let reading = SensorReading::new(AnalogChannels {
//!     tp2: 0.0, tp3: 9.0, h1: 9.0, dv_pressure: 0.0,
//!     reservoirs: 9.0, oil_temperature: 60.0, motor_current: 4.0,
//! });
//! let record = service.submit_reading("T-101", reading).unwrap();
//! assert_eq!(record.status, HealthStatus::Unknown);
//!
//! let schedule = service.get_schedule(None).unwrap();
//! assert_eq!(schedule.outcome, ScheduleOutcome::NoEligibleTrains);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::{FleetConfig, SubmissionPolicy};
use crate::error::{FleetError, FleetResult};
use crate::forest::load_scorer;
use crate::health::{DecisionScorer, HealthEvaluator};
use crate::models::{HealthStatus, Schedule, SensorReading, TrainRecord};
use crate::registry::{InMemoryRegistry, TrainStore};
use crate::scheduler::{ScheduleConfig, ScheduleGenerator};
use crate::validation::validate_reading;

/// Dashboard view of the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetSummary {
    /// Stored records.
    pub total_records: usize,
    /// Distinct train IDs.
    pub distinct_trains: usize,
    /// Records per status label; every status is present.
    pub status_counts: BTreeMap<String, usize>,
    /// Mean score over records with a scored status.
    pub mean_health_score: Option<f64>,
}

impl FleetSummary {
    fn from_records(records: &[TrainRecord]) -> Self {
        let mut status_counts: BTreeMap<String, usize> = HealthStatus::ALL
            .iter()
            .map(|s| (s.label().to_string(), 0))
            .collect();
        let mut ids: Vec<&str> = Vec::new();
        let mut scored_sum = 0.0;
        let mut scored = 0usize;

        for r in records {
            *status_counts.entry(r.status.label().to_string()).or_insert(0) += 1;
            if !ids.contains(&r.train_id.as_str()) {
                ids.push(&r.train_id);
            }
            if r.status.is_scored() {
                scored_sum += r.health_score;
                scored += 1;
            }
        }

        Self {
            total_records: records.len(),
            distinct_trains: ids.len(),
            status_counts,
            mean_health_score: (scored > 0).then(|| scored_sum / scored as f64),
        }
    }

    /// Number of records with `status`.
    pub fn count(&self, status: HealthStatus) -> usize {
        self.status_counts.get(status.label()).copied().unwrap_or(0)
    }
}

/// Health scoring and scheduling over a shared record store.
#[derive(Clone)]
pub struct FleetService {
    evaluator: HealthEvaluator,
    store: Arc<dyn TrainStore>,
    generator: ScheduleGenerator,
    submission: SubmissionPolicy,
}

impl FleetService {
    /// Creates a service with default scheduling and append-only submissions.
    pub fn new(evaluator: HealthEvaluator, store: Arc<dyn TrainStore>) -> Self {
        Self {
            evaluator,
            store,
            generator: ScheduleGenerator::new(),
            submission: SubmissionPolicy::default(),
        }
    }

    /// Builds a service over an in-memory registry.
    ///
    /// # Errors
    /// `FleetError::InvalidConfig` if the configuration does not validate.
    pub fn from_config(
        config: &FleetConfig,
        scorer: Option<Arc<dyn DecisionScorer>>,
    ) -> FleetResult<Self> {
        Self::from_config_with_store(config, scorer, Arc::new(InMemoryRegistry::new()))
    }

    /// Builds a service over the given store.
    pub fn from_config_with_store(
        config: &FleetConfig,
        scorer: Option<Arc<dyn DecisionScorer>>,
        store: Arc<dyn TrainStore>,
    ) -> FleetResult<Self> {
        config.validate()?;
        let evaluator =
            HealthEvaluator::new(config.evaluator_config()).with_optional_scorer(scorer);
        Ok(Self::new(evaluator, store)
            .with_generator(ScheduleGenerator::new().with_default_config(config.schedule))
            .with_submission_policy(config.submission))
    }

    /// Builds a service, loading the scorer from `config.model_path`.
    ///
    /// A missing or unreadable model is tolerated; readings are then
    /// recorded as `Unknown`.
    pub fn open(config: &FleetConfig) -> FleetResult<Self> {
        let scorer = match &config.model_path {
            Some(path) => load_scorer(path),
            None => {
                tracing::warn!("no model path configured; readings will be marked unknown");
                None
            }
        };
        Self::from_config(config, scorer)
    }

    /// Sets the schedule generator.
    pub fn with_generator(mut self, generator: ScheduleGenerator) -> Self {
        self.generator = generator;
        self
    }

    /// Sets how resubmissions are stored.
    pub fn with_submission_policy(mut self, policy: SubmissionPolicy) -> Self {
        self.submission = policy;
        self
    }

    /// The health evaluator.
    pub fn evaluator(&self) -> &HealthEvaluator {
        &self.evaluator
    }

    /// The record store.
    pub fn store(&self) -> &Arc<dyn TrainStore> {
        &self.store
    }

    /// The resubmission policy.
    pub fn submission_policy(&self) -> SubmissionPolicy {
        self.submission
    }

    /// Validates, evaluates, and stores a reading. Returns the stored record.
    ///
    /// # Errors
    /// `InvalidReading` for a blank ID or non-finite channel (nothing is
    /// stored), or `Storage` if the store fails. A missing or failing scorer
    /// is not an error: the record is stored as `Unknown` or `Error`.
    pub fn submit_reading(
        &self,
        train_id: &str,
        reading: SensorReading,
    ) -> FleetResult<TrainRecord> {
        validate_reading(
            train_id,
            &reading,
            &self.evaluator.config().digital_defaults,
        )
        .map_err(FleetError::InvalidReading)?;

        let assessment = self.evaluator.evaluate(&reading)?;
        let record = TrainRecord::new(
            train_id,
            reading,
            assessment.health_score,
            assessment.status,
        );

        let replaced = match self.submission {
            SubmissionPolicy::Append => {
                self.store.append(record.clone())?;
                false
            }
            SubmissionPolicy::ReplaceLatest => self.store.upsert(record.clone())?,
        };

        tracing::info!(
            train_id,
            health_score = record.health_score,
            status = %record.status,
            replaced,
            "reading recorded"
        );
        Ok(record)
    }

    /// All stored records, in submission order.
    pub fn list_trains(&self) -> FleetResult<Vec<TrainRecord>> {
        self.store.records()
    }

    /// Most recent record for a train, if it has been seen.
    pub fn latest_record(&self, train_id: &str) -> FleetResult<Option<TrainRecord>> {
        self.store.latest(train_id)
    }

    /// Generates today's schedule from the current registry.
    ///
    /// `None` uses the configured default options.
    pub fn get_schedule(&self, config: Option<&ScheduleConfig>) -> FleetResult<Schedule> {
        let records = self.store.records()?;
        match config {
            Some(config) => self.generator.generate(&records, config),
            None => self.generator.generate_default(&records),
        }
    }

    /// Counts and mean score over the registry.
    pub fn fleet_summary(&self) -> FleetResult<FleetSummary> {
        Ok(FleetSummary::from_records(&self.store.records()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScorerError;
    use crate::forest::{ForestConfig, IsolationForest};
    use crate::models::{
        AnalogChannels, FeatureVector, ScheduleOutcome, NO_ELIGIBLE_MESSAGE,
    };
    use crate::validation::ValidationErrorKind;

    /// Scores by oil temperature: 60 °C maps to raw 0.1 (health 75).
    #[derive(Debug)]
    struct OilScorer;

    impl DecisionScorer for OilScorer {
        fn name(&self) -> &'static str {
            "oil"
        }

        fn decision_score(&self, features: &FeatureVector) -> Result<f64, ScorerError> {
            let oil = features.get(crate::models::Channel::OilTemperature);
            Ok(0.1 - (oil - 60.0) / 100.0)
        }
    }

    fn reading(oil_temperature: f64) -> SensorReading {
        SensorReading::new(AnalogChannels {
            tp2: 0.0,
            tp3: 9.0,
            h1: 9.0,
            dv_pressure: 0.0,
            reservoirs: 9.0,
            oil_temperature,
            motor_current: 4.0,
        })
    }

    fn scored_service() -> FleetService {
        FleetService::from_config(&FleetConfig::default(), Some(Arc::new(OilScorer))).unwrap()
    }

    #[test]
    fn test_submit_scored() {
        let service = scored_service();
        let record = service.submit_reading("T-1", reading(60.0)).unwrap();
        assert_eq!(record.health_score, 75.0);
        assert_eq!(record.status, HealthStatus::Optimal);
        assert_eq!(service.list_trains().unwrap(), vec![record]);
    }

    #[test]
    fn test_submit_without_scorer_is_unknown() {
        let service = FleetService::from_config(&FleetConfig::default(), None).unwrap();
        let record = service.submit_reading("T-1", reading(60.0)).unwrap();
        assert_eq!(record.status, HealthStatus::Unknown);
        assert_eq!(record.health_score, 0.0);
        assert_eq!(service.list_trains().unwrap().len(), 1);
    }

    #[test]
    fn test_invalid_reading_not_stored() {
        let service = scored_service();

        let err = service.submit_reading("T-1", reading(f64::NAN)).unwrap_err();
        assert!(matches!(err, FleetError::InvalidReading(_)));
        assert_eq!(
            err.validation_errors()[0].kind,
            ValidationErrorKind::NonFiniteChannel
        );

        let err = service.submit_reading("  ", reading(60.0)).unwrap_err();
        assert_eq!(err.validation_errors()[0].kind, ValidationErrorKind::EmptyTrainId);

        assert!(service.list_trains().unwrap().is_empty());
    }

    #[test]
    fn test_append_keeps_duplicates() {
        let service = scored_service();
        service.submit_reading("A", reading(60.0)).unwrap();
        service.submit_reading("B", reading(60.0)).unwrap();
        service.submit_reading("A", reading(90.0)).unwrap();
        let ids: Vec<String> = service
            .list_trains()
            .unwrap()
            .into_iter()
            .map(|r| r.train_id)
            .collect();
        assert_eq!(ids, vec!["A", "B", "A"]);
    }

    #[test]
    fn test_replace_latest() {
        let config = FleetConfig {
            submission: SubmissionPolicy::ReplaceLatest,
            ..FleetConfig::default()
        };
        let service = FleetService::from_config(&config, Some(Arc::new(OilScorer))).unwrap();
        service.submit_reading("A", reading(60.0)).unwrap();
        service.submit_reading("B", reading(60.0)).unwrap();
        service.submit_reading("A", reading(90.0)).unwrap();

        let records = service.list_trains().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].train_id, "A");
        // 90 °C: raw -0.2 -> health 0
        assert_eq!(records[0].health_score, 0.0);
        assert_eq!(records[0].status, HealthStatus::MaintenanceRequired);
    }

    #[test]
    fn test_latest_record() {
        let service = scored_service();
        service.submit_reading("A", reading(60.0)).unwrap();
        service.submit_reading("B", reading(60.0)).unwrap();
        service.submit_reading("A", reading(70.0)).unwrap();

        let latest = service.latest_record("A").unwrap().unwrap();
        assert_eq!(latest.health_score, 50.0);
        assert!(service.latest_record("Z").unwrap().is_none());
    }

    #[test]
    fn test_schedule_rotation() {
        let service = scored_service();
        service.submit_reading("A", reading(60.0)).unwrap();
        service.submit_reading("X", reading(90.0)).unwrap();
        service.submit_reading("B", reading(55.0)).unwrap();

        let schedule = service.get_schedule(None).unwrap();
        assert_eq!(schedule.outcome, ScheduleOutcome::Generated);
        assert_eq!(schedule.slot_count(), 72);
        assert_eq!(schedule.slots[0].train_id, "A");
        assert_eq!(schedule.slots[1].train_id, "B");
        assert_eq!(schedule.slots[2].train_id, "A");
        assert!(schedule.slots_for_train("X").is_empty());
    }

    #[test]
    fn test_schedule_with_override() {
        let service = scored_service();
        service.submit_reading("A", reading(60.0)).unwrap();

        let config = ScheduleConfig::default()
            .with_hours(8, 9)
            .with_slot_minutes(30);
        let schedule = service.get_schedule(Some(&config)).unwrap();
        let times: Vec<&str> = schedule.slots.iter().map(|s| s.time.as_str()).collect();
        assert_eq!(times, vec!["08:00", "08:30", "09:00", "09:30"]);

        let strict = ScheduleConfig::default().with_health_threshold(75.0);
        let schedule = service.get_schedule(Some(&strict)).unwrap();
        assert_eq!(schedule.outcome, ScheduleOutcome::NoEligibleTrains);
    }

    #[test]
    fn test_schedule_empty_registry() {
        let schedule = scored_service().get_schedule(None).unwrap();
        assert!(schedule.slots.is_empty());
        assert_eq!(schedule.message.as_deref(), Some(NO_ELIGIBLE_MESSAGE));
    }

    #[test]
    fn test_schedule_invalid_config() {
        let service = scored_service();
        let bad = ScheduleConfig::default().with_hours(20, 10);
        let err = service.get_schedule(Some(&bad)).unwrap_err();
        assert!(matches!(err, FleetError::InvalidScheduleConfig(_)));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = FleetConfig::default();
        config.policy.span = -1.0;
        let err = FleetService::from_config(&config, None).err().unwrap();
        assert!(matches!(err, FleetError::InvalidConfig(_)));
    }

    #[test]
    fn test_fleet_summary() {
        let service = scored_service();
        service.submit_reading("A", reading(60.0)).unwrap(); // 75, Optimal
        service.submit_reading("B", reading(70.0)).unwrap(); // 50, Monitor
        service.submit_reading("A", reading(90.0)).unwrap(); // 0, Maintenance

        let summary = service.fleet_summary().unwrap();
        assert_eq!(summary.total_records, 3);
        assert_eq!(summary.distinct_trains, 2);
        assert_eq!(summary.count(HealthStatus::Optimal), 1);
        assert_eq!(summary.count(HealthStatus::Monitor), 1);
        assert_eq!(summary.count(HealthStatus::MaintenanceRequired), 1);
        assert_eq!(summary.count(HealthStatus::Unknown), 0);
        assert_eq!(summary.status_counts.len(), HealthStatus::ALL.len());
        assert!((summary.mean_health_score.unwrap() - 125.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_summary_ignores_unscored() {
        let service = FleetService::from_config(&FleetConfig::default(), None).unwrap();
        service.submit_reading("A", reading(60.0)).unwrap();
        let summary = service.fleet_summary().unwrap();
        assert_eq!(summary.count(HealthStatus::Unknown), 1);
        assert!(summary.mean_health_score.is_none());
    }

    #[test]
    fn test_open_with_missing_model() {
        let dir = tempfile::tempdir().unwrap();
        let config = FleetConfig {
            model_path: Some(dir.path().join("absent.json")),
            ..FleetConfig::default()
        };
        let service = FleetService::open(&config).unwrap();
        assert!(!service.evaluator().has_scorer());
    }

    #[test]
    fn test_open_with_forest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forest.json");
        let rows = crate::forest::tests::healthy_rows(200, 11);
        IsolationForest::fit(&rows, &ForestConfig::default().with_estimators(40))
            .unwrap()
            .save(&path)
            .unwrap();

        let config = FleetConfig {
            model_path: Some(path),
            ..FleetConfig::default()
        };
        let service = FleetService::open(&config).unwrap();
        assert!(service.evaluator().has_scorer());

        let record = service.submit_reading("T-9", reading(60.0)).unwrap();
        assert!(record.status.is_scored());

        let hot = service.submit_reading("T-10", reading(140.0)).unwrap();
        assert!(hot.health_score < record.health_score);
    }

    #[test]
    fn test_shared_across_threads() {
        let service = Arc::new(scored_service());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let service = Arc::clone(&service);
                std::thread::spawn(move || {
                    for i in 0..10 {
                        service
                            .submit_reading(&format!("T{t}-{i}"), reading(60.0))
                            .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(service.fleet_summary().unwrap().total_records, 40);
    }
}
