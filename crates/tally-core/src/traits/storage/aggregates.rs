//! `IAggregateStore` trait — aggregate rows at all four levels.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::errors::StorageError;
use crate::types::rows::{AggregateRow, RowLevel};

/// One grouped summation from a finer level into a coarser one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollUpStep {
    pub from: RowLevel,
    pub to: RowLevel,
}

/// Ordered roll-up steps for one (property, end_time). Executed atomically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollUpPlan {
    pub property: String,
    pub end_time: DateTime<Utc>,
    pub steps: Vec<RollUpStep>,
}

/// Rows written per target level by one roll-up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RollUpCounts {
    pub tenant_rows: usize,
    pub installation_rows: usize,
}

/// What one [`IAggregateStore::clear_property`] removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClearedProperty {
    pub had_state: bool,
    pub rows_removed: usize,
}

pub trait IAggregateStore: Send + Sync {
    /// Insert rows. A row colliding with an existing
    /// (owner, property, subgroup, end_time) fails the whole batch.
    fn insert_rows(&self, rows: &[AggregateRow]) -> Result<usize, StorageError>;

    /// Delete every row of `property` at `end_time` on the given levels.
    fn delete_rows_at(
        &self,
        property: &str,
        end_time: DateTime<Utc>,
        levels: &[RowLevel],
    ) -> Result<usize, StorageError>;

    /// Execute every step of `plan` in one transaction.
    fn roll_up(&self, plan: &RollUpPlan) -> Result<RollUpCounts, StorageError>;

    /// Create the row, or add `row.value` to the existing one.
    fn increment_row(&self, row: &AggregateRow) -> Result<(), StorageError>;

    /// Rows of `property` at `level`, optionally restricted to one end time,
    /// ordered by end time, owner, subgroup.
    fn get_rows(
        &self,
        property: &str,
        level: RowLevel,
        end_time: Option<DateTime<Utc>>,
    ) -> Result<Vec<AggregateRow>, StorageError>;

    /// Delete `property`'s fill state and every row at every level,
    /// atomically.
    fn clear_property(&self, property: &str) -> Result<ClearedProperty, StorageError>;
}

// ─── Arc blanket impl ───────────────────────────────────────────────

impl<T: IAggregateStore + ?Sized> IAggregateStore for Arc<T> {
    fn insert_rows(&self, rows: &[AggregateRow]) -> Result<usize, StorageError> {
        (**self).insert_rows(rows)
    }
    fn delete_rows_at(
        &self,
        property: &str,
        end_time: DateTime<Utc>,
        levels: &[RowLevel],
    ) -> Result<usize, StorageError> {
        (**self).delete_rows_at(property, end_time, levels)
    }
    fn roll_up(&self, plan: &RollUpPlan) -> Result<RollUpCounts, StorageError> {
        (**self).roll_up(plan)
    }
    fn increment_row(&self, row: &AggregateRow) -> Result<(), StorageError> {
        (**self).increment_row(row)
    }
    fn get_rows(
        &self,
        property: &str,
        level: RowLevel,
        end_time: Option<DateTime<Utc>>,
    ) -> Result<Vec<AggregateRow>, StorageError> {
        (**self).get_rows(property, level, end_time)
    }
    fn clear_property(&self, property: &str) -> Result<ClearedProperty, StorageError> {
        (**self).clear_property(property)
    }
}
