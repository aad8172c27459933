//! Schedule (solution) model.
//!
//! A schedule is an ordered sequence of fixed-width departure slots, each
//! assigned to one train. A schedule with no slots always says why, through
//! its [`ScheduleOutcome`], so "ran with zero eligible trains" is never
//! confused with a failure.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Message attached to a schedule when no train is eligible.
pub const NO_ELIGIBLE_MESSAGE: &str = "No healthy trains available.";

/// A daily service schedule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    /// Slot assignments in departure order.
    #[serde(rename = "schedule")]
    pub slots: Vec<ScheduleSlot>,
    /// How the schedule was produced.
    pub outcome: ScheduleOutcome,
    /// Human-readable note (set for the no-eligible case).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// One departure slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSlot {
    /// Slot start label, `HH:MM`.
    pub time: String,
    /// Assigned train.
    pub train_id: String,
    /// Slot state.
    pub status: SlotState,
}

/// State of a slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotState {
    /// Train is assigned to depart in this slot.
    #[default]
    Scheduled,
}

/// Result classification of a schedule generation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleOutcome {
    /// At least one train was eligible and every slot is assigned.
    #[default]
    Generated,
    /// Every train was below the health threshold; no slots were produced.
    NoEligibleTrains,
}

impl ScheduleSlot {
    /// Creates a scheduled slot.
    pub fn new(time: impl Into<String>, train_id: impl Into<String>) -> Self {
        Self {
            time: time.into(),
            train_id: train_id.into(),
            status: SlotState::Scheduled,
        }
    }
}

impl Schedule {
    /// Creates an empty generated schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the empty schedule returned when no train is eligible.
    pub fn no_eligible_trains() -> Self {
        Self {
            slots: Vec::new(),
            outcome: ScheduleOutcome::NoEligibleTrains,
            message: Some(NO_ELIGIBLE_MESSAGE.to_string()),
        }
    }

    /// Adds a slot.
    pub fn add_slot(&mut self, slot: ScheduleSlot) {
        self.slots.push(slot);
    }

    /// Whether any train was eligible.
    pub fn has_eligible_trains(&self) -> bool {
        self.outcome == ScheduleOutcome::Generated
    }

    /// Number of slots.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Finds the slot starting at `time`.
    pub fn slot_at(&self, time: &str) -> Option<&ScheduleSlot> {
        self.slots.iter().find(|s| s.time == time)
    }

    /// Returns all slots assigned to a train.
    pub fn slots_for_train(&self, train_id: &str) -> Vec<&ScheduleSlot> {
        self.slots.iter().filter(|s| s.train_id == train_id).collect()
    }

    /// Counts slots per train.
    pub fn slots_by_train(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for s in &self.slots {
            *counts.entry(s.train_id.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Distinct trains in first-assignment order.
    pub fn train_ids(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for s in &self.slots {
            if !seen.contains(&s.train_id.as_str()) {
                seen.push(&s.train_id);
            }
        }
        seen
    }
}
