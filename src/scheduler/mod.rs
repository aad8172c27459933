//! Round-robin schedule generation and KPI evaluation.
//!
//! # Algorithm
//!
//! `ScheduleGenerator` filters records by health threshold and assigns the
//! survivors to fixed-width daily slots in strict rotation. It makes no
//! attempt to optimize; its guarantee is that the same registry state always
//! yields the same schedule.
//!
//! # KPI
//!
//! `ScheduleKpi` summarizes a schedule: slots per train, excluded trains,
//! and whether departures are spread evenly.

mod kpi;
mod round_robin;

pub use kpi::ScheduleKpi;
pub use round_robin::{assign_round_robin, slot_labels, ScheduleConfig, ScheduleGenerator};
