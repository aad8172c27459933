//! Schedule quality metrics (KPIs).
//!
//! Computes service indicators from a generated schedule and the records it
//! was generated from.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Slot count | Number of assigned departures |
//! | Slots by train | Departures per train |
//! | Excluded trains | Trains with records but no departures |
//! | Min/Max slots | Spread of departures across scheduled trains |
//! | Balance | Max - min ≤ 1 |

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{Schedule, TrainRecord};

/// Schedule performance indicators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleKpi {
    /// Number of assigned slots.
    pub slot_count: usize,
    /// Distinct trains with at least one slot.
    pub scheduled_trains: usize,
    /// Slots per train (ordered by train ID).
    pub slots_by_train: BTreeMap<String, usize>,
    /// Trains present in the records but never scheduled, first-seen order.
    pub excluded_trains: Vec<String>,
    /// Fewest slots given to any scheduled train (0 if none).
    pub min_slots_per_train: usize,
    /// Most slots given to any scheduled train (0 if none).
    pub max_slots_per_train: usize,
}

impl ScheduleKpi {
    /// Computes KPIs from a schedule and its input records.
    ///
    /// # Arguments
    /// * `schedule` - The generated schedule.
    /// * `records` - The records the schedule was generated from.
    pub fn calculate(schedule: &Schedule, records: &[TrainRecord]) -> Self {
        let slots_by_train = schedule.slots_by_train();

        let mut excluded_trains: Vec<String> = Vec::new();
        for r in records {
            if !slots_by_train.contains_key(&r.train_id) && !excluded_trains.contains(&r.train_id)
            {
                excluded_trains.push(r.train_id.clone());
            }
        }

        let min_slots_per_train = slots_by_train.values().copied().min().unwrap_or(0);
        let max_slots_per_train = slots_by_train.values().copied().max().unwrap_or(0);

        Self {
            slot_count: schedule.slot_count(),
            scheduled_trains: slots_by_train.len(),
            slots_by_train,
            excluded_trains,
            min_slots_per_train,
            max_slots_per_train,
        }
    }

    /// Whether departures are spread evenly (max - min ≤ 1).
    pub fn is_balanced(&self) -> bool {
        self.max_slots_per_train - self.min_slots_per_train <= 1
    }

    /// Whether every train scoring above `threshold` in `records` has a slot.
    pub fn covers_all_eligible(&self, records: &[TrainRecord], threshold: f64) -> bool {
        records
            .iter()
            .filter(|r| r.is_eligible(threshold))
            .all(|r| self.slots_by_train.contains_key(&r.train_id))
    }
}
