//! `TallyStorageEngine` — the SQLite implementation of the tally storage
//! traits.
//!
//! Reads go through the reader pool, every mutation through the single
//! writer. Fill-state reads also use the writer so the driver always sees
//! its own latest commit.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::info;

use tally_core::config::StorageConfig;
use tally_core::errors::StorageError;
use tally_core::traits::collector::CollectorQuery;
use tally_core::traits::storage::{
    ClearedProperty, IAggregateStore, IFactSource, IFillStateStore, RollUpCounts, RollUpPlan,
};
use tally_core::types::rows::{AggregateRow, FillState, FillStatus, RowLevel};
use tally_core::types::time::BucketWindow;

use crate::connection::ConnectionPool;
use crate::migrations;
use crate::queries::{counts, facts, fill_state, rollup};

pub struct TallyStorageEngine {
    pool: ConnectionPool,
}

impl TallyStorageEngine {
    /// Open (or create) a file-backed database and migrate it.
    pub fn open(path: &Path, read_pool_size: usize) -> Result<Self, StorageError> {
        let pool = ConnectionPool::open(path, read_pool_size)?;
        info!(
            path = %path.display(),
            readers = pool.reader_count(),
            "opened tally database"
        );
        Ok(Self { pool })
    }

    /// Open a private in-memory database. Nothing is shared across engines.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        Ok(Self {
            pool: ConnectionPool::open_in_memory()?,
        })
    }

    /// Open according to `[storage]`. No `db_path` means in-memory.
    pub fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        match &config.db_path {
            Some(path) => Self::open(Path::new(path), config.effective_read_pool_size()),
            None => Self::open_in_memory(),
        }
    }

    pub fn with_reader<F, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&Connection) -> Result<T, StorageError>,
    {
        self.pool.with_reader(f)
    }

    pub fn with_writer<F, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&Connection) -> Result<T, StorageError>,
    {
        self.pool.with_writer(f)
    }

    /// Database file path (None for in-memory).
    pub fn path(&self) -> Option<&Path> {
        self.pool.path()
    }

    pub fn schema_version(&self) -> Result<u32, StorageError> {
        self.pool.with_reader(migrations::current_version)
    }
}

impl IFillStateStore for TallyStorageEngine {
    fn get_fill_state(&self, property: &str) -> Result<Option<FillState>, StorageError> {
        self.pool.with_writer(|conn| fill_state::get(conn, property))
    }

    fn upsert_fill_state(
        &self,
        property: &str,
        end_time: DateTime<Utc>,
        status: FillStatus,
    ) -> Result<(), StorageError> {
        let now = Utc::now();
        self.pool
            .with_writer(|conn| fill_state::upsert(conn, property, end_time, status, now))
    }

    fn delete_fill_state(&self, property: &str) -> Result<bool, StorageError> {
        self.pool.with_writer(|conn| fill_state::delete(conn, property))
    }

    fn list_fill_states(&self) -> Result<Vec<FillState>, StorageError> {
        self.pool.with_reader(fill_state::list)
    }
}

impl IAggregateStore for TallyStorageEngine {
    fn insert_rows(&self, rows: &[AggregateRow]) -> Result<usize, StorageError> {
        self.pool.with_writer(|conn| counts::insert_rows(conn, rows))
    }

    fn delete_rows_at(
        &self,
        property: &str,
        end_time: DateTime<Utc>,
        levels: &[RowLevel],
    ) -> Result<usize, StorageError> {
        self.pool
            .with_writer(|conn| counts::delete_at(conn, property, end_time, levels))
    }

    fn roll_up(&self, plan: &RollUpPlan) -> Result<RollUpCounts, StorageError> {
        self.pool.with_writer(|conn| rollup::roll_up(conn, plan))
    }

    fn increment_row(&self, row: &AggregateRow) -> Result<(), StorageError> {
        self.pool.with_writer(|conn| counts::increment(conn, row))
    }

    fn get_rows(
        &self,
        property: &str,
        level: RowLevel,
        end_time: Option<DateTime<Utc>>,
    ) -> Result<Vec<AggregateRow>, StorageError> {
        self.pool
            .with_reader(|conn| counts::get_rows(conn, property, level, end_time))
    }

    fn clear_property(&self, property: &str) -> Result<ClearedProperty, StorageError> {
        self.pool
            .with_writer(|conn| counts::clear_property(conn, property))
    }
}

impl IFactSource for TallyStorageEngine {
    fn installation_epoch(&self) -> Result<Option<DateTime<Utc>>, StorageError> {
        self.pool.with_reader(facts::installation_epoch)
    }

    fn run_collector_query(
        &self,
        query: &CollectorQuery,
        property: &str,
        window: &BucketWindow,
    ) -> Result<usize, StorageError> {
        self.pool
            .with_writer(|conn| facts::run_collector(conn, query, property, window))
    }
}
