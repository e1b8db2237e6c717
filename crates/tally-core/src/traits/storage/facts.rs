//! `IFactSource` trait — read side of the raw fact tables.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::errors::StorageError;
use crate::traits::collector::CollectorQuery;
use crate::types::time::BucketWindow;

pub trait IFactSource: Send + Sync {
    /// Earliest tenant creation time, or `None` when no tenant exists yet.
    fn installation_epoch(&self) -> Result<Option<DateTime<Utc>>, StorageError>;

    /// Execute a collector statement with `:property`, `:window_start`, and
    /// `:window_end` bound. Returns the number of rows it wrote.
    fn run_collector_query(
        &self,
        query: &CollectorQuery,
        property: &str,
        window: &BucketWindow,
    ) -> Result<usize, StorageError>;
}

// ─── Arc blanket impl ───────────────────────────────────────────────

impl<T: IFactSource + ?Sized> IFactSource for Arc<T> {
    fn installation_epoch(&self) -> Result<Option<DateTime<Utc>>, StorageError> {
        (**self).installation_epoch()
    }
    fn run_collector_query(
        &self,
        query: &CollectorQuery,
        property: &str,
        window: &BucketWindow,
    ) -> Result<usize, StorageError> {
        (**self).run_collector_query(query, property, window)
    }
}
