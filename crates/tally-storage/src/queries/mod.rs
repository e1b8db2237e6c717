//! Raw SQL operations, one module per table family.
//!
//! Every function takes a borrowed `Connection` so the engine decides
//! which pooled connection (writer or reader) runs it.

pub mod counts;
pub mod facts;
pub mod fill_state;
pub mod rollup;

use chrono::{DateTime, TimeZone, Utc};

use tally_core::errors::StorageError;

/// Timestamps are stored as UNIX seconds.
pub(crate) fn to_secs(t: DateTime<Utc>) -> i64 {
    t.timestamp()
}

pub(crate) fn from_secs(secs: i64, table: &str) -> Result<DateTime<Utc>, StorageError> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or_else(|| StorageError::CorruptRow {
            table: table.to_string(),
            details: format!("timestamp {secs} is out of range"),
        })
}
