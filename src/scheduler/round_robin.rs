//! Slot-based round-robin scheduler.
//!
//! # Algorithm
//!
//! 1. Keep records whose health score is strictly above the threshold,
//!    in registry order.
//! 2. Generate every `HH:MM` slot from `start_hour:00` through the last
//!    slot of `end_hour`, stepping by `slot_minutes`.
//! 3. Assign slot *i* to `eligible[i mod eligible.len()]`.
//!
//! # Complexity
//! O(n + s) where n=records, s=slots.
//!
//! The output depends only on the eligible list order and the slot count:
//! no randomness, no clock, no hash ordering.

use serde::{Deserialize, Serialize};

use crate::error::{FleetError, FleetResult};
use crate::models::{Schedule, ScheduleSlot, TrainRecord};
use crate::validation::validate_schedule_config;

/// Schedule generation options.
///
/// Every field has a default, so a partial JSON object is a valid config.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Records must score strictly above this to be scheduled.
    pub health_threshold: f64,
    /// First service hour (0-23).
    pub start_hour: u8,
    /// Last service hour (0-23), inclusive.
    pub end_hour: u8,
    /// Slot width in minutes; must divide 60.
    pub slot_minutes: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            health_threshold: 40.0,
            start_hour: 6,
            end_hour: 23,
            slot_minutes: 15,
        }
    }
}

impl ScheduleConfig {
    /// Sets the eligibility threshold.
    pub fn with_health_threshold(mut self, threshold: f64) -> Self {
        self.health_threshold = threshold;
        self
    }

    /// Sets the service window.
    pub fn with_hours(mut self, start_hour: u8, end_hour: u8) -> Self {
        self.start_hour = start_hour;
        self.end_hour = end_hour;
        self
    }

    /// Sets the slot width.
    pub fn with_slot_minutes(mut self, slot_minutes: u32) -> Self {
        self.slot_minutes = slot_minutes;
        self
    }

    /// Number of slots this config produces: `hours × (60 / slot_minutes)`.
    ///
    /// Returns 0 for configs that fail validation.
    pub fn slot_count(&self) -> usize {
        if validate_schedule_config(self).is_err() {
            return 0;
        }
        let hours = (self.end_hour - self.start_hour) as usize + 1;
        hours * (60 / self.slot_minutes) as usize
    }
}

/// Generates slot labels (`HH:MM`) in departure order.
///
/// Returns an empty list for configs that fail validation.
pub fn slot_labels(config: &ScheduleConfig) -> Vec<String> {
    if validate_schedule_config(config).is_err() {
        return Vec::new();
    }
    let mut labels = Vec::with_capacity(config.slot_count());
    for hour in config.start_hour..=config.end_hour {
        for minute in (0..60).step_by(config.slot_minutes as usize) {
            labels.push(format!("{hour:02}:{minute:02}"));
        }
    }
    labels
}

/// Assigns slot *i* to `train_ids[i mod len]`.
///
/// Returns no slots when `train_ids` is empty.
pub fn assign_round_robin<I>(train_ids: &[&str], labels: I) -> Vec<ScheduleSlot>
where
    I: IntoIterator<Item = String>,
{
    if train_ids.is_empty() {
        return Vec::new();
    }
    labels
        .into_iter()
        .enumerate()
        .map(|(i, time)| ScheduleSlot::new(time, train_ids[i % train_ids.len()]))
        .collect()
}

/// Round-robin schedule generator.
///
/// Stateless: the same records and config always produce the same schedule.
///
/// # Example
///
/// ```
/// use railx::scheduler::{ScheduleConfig, ScheduleGenerator};
/// use railx::models::{AnalogChannels, HealthStatus, SensorReading, TrainRecord};
///
/// let reading = SensorReading::new(AnalogChannels {
///     tp2: 0.0, tp3: 9.0, h1: 9.0, dv_pressure: 0.0,
///     reservoirs: 9.0, oil_temperature: 60.0, motor_current: 4.0,
/// });
/// let records = vec![
///     TrainRecord::new("A", reading, 90.0, HealthStatus::Optimal),
///     TrainRecord::new("B", reading, 12.0, HealthStatus::MaintenanceRequired),
/// ];
///
/// let schedule = ScheduleGenerator::new()
///     .generate(&records, &ScheduleConfig::default())
///     .unwrap();
/// assert_eq!(schedule.slot_count(), 72);
/// assert!(schedule.slots.iter().all(|s| s.train_id == "A"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScheduleGenerator {
    default_config: ScheduleConfig,
}

impl ScheduleGenerator {
    /// Creates a generator with the default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the config used by [`generate_default`](Self::generate_default).
    pub fn with_default_config(mut self, config: ScheduleConfig) -> Self {
        self.default_config = config;
        self
    }

    /// The config used when the caller supplies none.
    pub fn default_config(&self) -> &ScheduleConfig {
        &self.default_config
    }

    /// Generates a schedule with the generator's default config.
    pub fn generate_default(&self, records: &[TrainRecord]) -> FleetResult<Schedule> {
        self.generate(records, &self.default_config)
    }

    /// Generates a schedule from records in registry order.
    ///
    /// Fails only on an invalid config. An all-unhealthy registry yields a
    /// schedule with outcome `NoEligibleTrains`.
    pub fn generate(
        &self,
        records: &[TrainRecord],
        config: &ScheduleConfig,
    ) -> FleetResult<Schedule> {
        validate_schedule_config(config).map_err(FleetError::InvalidScheduleConfig)?;

        let eligible: Vec<&TrainRecord> = records
            .iter()
            .filter(|r| r.is_eligible(config.health_threshold))
            .collect();

        if eligible.is_empty() {
            tracing::warn!(
                records = records.len(),
                threshold = config.health_threshold,
                "no trains above health threshold; schedule is empty"
            );
            return Ok(Schedule::no_eligible_trains());
        }

        let train_ids: Vec<&str> = eligible.iter().map(|r| r.train_id.as_str()).collect();
        let mut schedule = Schedule::new();
        for slot in assign_round_robin(&train_ids, slot_labels(config)) {
            schedule.add_slot(slot);
        }

        tracing::info!(
            slots = schedule.slot_count(),
            eligible = eligible.len(),
            excluded = records.len() - eligible.len(),
            "schedule generated"
        );
        Ok(schedule)
    }
}
