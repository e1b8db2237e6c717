//! Fact collector seam.
//!
//! A collector writes finest-granularity rows for one statistic over one
//! window. The built-in collectors are [`CollectorQuery`] values: a static,
//! parameterized statement plus the level it writes.

use std::fmt;

use crate::errors::StorageError;
use crate::traits::storage::IStatStore;
use crate::types::rows::RowLevel;
use crate::types::time::BucketWindow;

pub trait FactCollector: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Level of the rows this collector writes.
    fn output_level(&self) -> RowLevel;

    /// Write rows for `property` over `window`. Returns rows written;
    /// zero is a valid result for an empty window.
    fn collect(
        &self,
        store: &dyn IStatStore,
        property: &str,
        window: &BucketWindow,
    ) -> Result<usize, StorageError>;
}

/// A typed, parameterized collector statement.
///
/// `sql` is a single `INSERT ... SELECT` that may only reference the named
/// parameters `:property`, `:window_start`, and `:window_end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectorQuery {
    pub name: &'static str,
    pub output_level: RowLevel,
    pub sql: &'static str,
}

impl FactCollector for CollectorQuery {
    fn name(&self) -> &str {
        self.name
    }

    fn output_level(&self) -> RowLevel {
        self.output_level
    }

    fn collect(
        &self,
        store: &dyn IStatStore,
        property: &str,
        window: &BucketWindow,
    ) -> Result<usize, StorageError> {
        store.run_collector_query(self, property, window)
    }
}
