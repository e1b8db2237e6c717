//! `IFillStateStore` trait — per-statistic cursor persistence.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::errors::StorageError;
use crate::types::rows::{FillState, FillStatus};

/// Fill-state row operations. One row per statistic, keyed by property.
pub trait IFillStateStore: Send + Sync {
    fn get_fill_state(&self, property: &str) -> Result<Option<FillState>, StorageError>;

    /// Insert or overwrite the cursor for `property`. Stamps `last_modified`.
    fn upsert_fill_state(
        &self,
        property: &str,
        end_time: DateTime<Utc>,
        status: FillStatus,
    ) -> Result<(), StorageError>;

    /// Returns whether a row existed.
    fn delete_fill_state(&self, property: &str) -> Result<bool, StorageError>;

    /// All cursors, ordered by property.
    fn list_fill_states(&self) -> Result<Vec<FillState>, StorageError>;
}

// ─── Arc blanket impl ───────────────────────────────────────────────

impl<T: IFillStateStore + ?Sized> IFillStateStore for Arc<T> {
    fn get_fill_state(&self, property: &str) -> Result<Option<FillState>, StorageError> {
        (**self).get_fill_state(property)
    }
    fn upsert_fill_state(
        &self,
        property: &str,
        end_time: DateTime<Utc>,
        status: FillStatus,
    ) -> Result<(), StorageError> {
        (**self).upsert_fill_state(property, end_time, status)
    }
    fn delete_fill_state(&self, property: &str) -> Result<bool, StorageError> {
        (**self).delete_fill_state(property)
    }
    fn list_fill_states(&self) -> Result<Vec<FillState>, StorageError> {
        (**self).list_fill_states()
    }
}
