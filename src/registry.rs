//! Train record storage.
//!
//! [`TrainStore`] is the persistence seam: append, replace-latest, latest
//! lookup, and an ordered snapshot. [`InMemoryRegistry`] is the reference
//! implementation.
//!
//! # Ordering
//! Snapshots preserve insertion order. That order is the scheduling input
//! order, so a store must never reorder records.
//!
//! # Concurrency
//! Each write is atomic with respect to snapshots: a reader sees a record
//! either fully appended or not at all.

use std::sync::RwLock;

use crate::error::{FleetError, FleetResult};
use crate::models::TrainRecord;

/// Ordered, append-oriented record storage.
pub trait TrainStore: Send + Sync {
    /// Appends a record at the end.
    fn append(&self, record: TrainRecord) -> FleetResult<()>;

    /// Replaces the latest record with the same train ID in place, or
    /// appends if the train is new. Returns `true` if a record was replaced.
    fn upsert(&self, record: TrainRecord) -> FleetResult<bool>;

    /// Ordered snapshot of all records.
    fn records(&self) -> FleetResult<Vec<TrainRecord>>;

    /// Number of stored records.
    fn len(&self) -> FleetResult<usize> {
        Ok(self.records()?.len())
    }

    /// Whether the store holds no records.
    fn is_empty(&self) -> FleetResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Most recent record for a train.
    fn latest(&self, train_id: &str) -> FleetResult<Option<TrainRecord>> {
        Ok(self.records()?.into_iter().rev().find(|r| r.train_id == train_id))
    }
}

/// In-memory record store guarded by a read-write lock.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    records: RwLock<Vec<TrainRecord>>,
}

impl InMemoryRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry pre-populated with records, in order.
    pub fn with_records(records: Vec<TrainRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }
}

fn poisoned<T>(_: T) -> FleetError {
    FleetError::Storage("registry lock poisoned".to_string())
}

impl TrainStore for InMemoryRegistry {
    fn append(&self, record: TrainRecord) -> FleetResult<()> {
        self.records.write().map_err(poisoned)?.push(record);
        Ok(())
    }

    fn upsert(&self, record: TrainRecord) -> FleetResult<bool> {
        let mut records = self.records.write().map_err(poisoned)?;
        match records.iter().rposition(|r| r.train_id == record.train_id) {
            Some(idx) => {
                records[idx] = record;
                Ok(true)
            }
            None => {
                records.push(record);
                Ok(false)
            }
        }
    }

    fn records(&self) -> FleetResult<Vec<TrainRecord>> {
        Ok(self.records.read().map_err(poisoned)?.clone())
    }

    fn len(&self) -> FleetResult<usize> {
        Ok(self.records.read().map_err(poisoned)?.len())
    }

    fn latest(&self, train_id: &str) -> FleetResult<Option<TrainRecord>> {
        let records = self.records.read().map_err(poisoned)?;
        Ok(records.iter().rev().find(|r| r.train_id == train_id).cloned())
    }
}
