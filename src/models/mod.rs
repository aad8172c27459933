//! Fleet domain models.
//!
//! Provides the data types that flow through the pipeline: a raw sensor
//! reading, the fixed-order feature vector a scorer consumes, the stored
//! train record, and the generated service schedule.
//!
//! # Pipeline
//!
//! | Stage | Input | Output |
//! |-------|-------|--------|
//! | Feature assembly | `SensorReading` + `DigitalChannels` | `FeatureVector` |
//! | Health evaluation | `FeatureVector` | score + `HealthStatus` |
//! | Registration | reading + assessment | `TrainRecord` |
//! | Scheduling | `[TrainRecord]` | `Schedule` |

mod channel;
mod reading;
mod record;
mod schedule;

pub use channel::{Channel, FeatureVector, ANALOG_COUNT, FEATURE_COUNT};
pub use reading::{AnalogChannels, DigitalChannels, DigitalOverrides, SensorReading};
pub use record::{HealthStatus, TrainRecord};
pub use schedule::{Schedule, ScheduleOutcome, ScheduleSlot, SlotState, NO_ELIGIBLE_MESSAGE};
