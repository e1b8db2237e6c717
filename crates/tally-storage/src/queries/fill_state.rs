//! fill_state table: one cursor row per statistic.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use tally_core::errors::StorageError;
use tally_core::types::rows::{FillState, FillStatus};

use super::{from_secs, to_secs};

const TABLE: &str = "fill_state";

/// Raw row before timestamp and status decoding.
struct RawFillState {
    property: String,
    end_time: i64,
    state: String,
    last_modified: i64,
}

impl RawFillState {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            property: row.get(0)?,
            end_time: row.get(1)?,
            state: row.get(2)?,
            last_modified: row.get(3)?,
        })
    }

    fn decode(self) -> Result<FillState, StorageError> {
        let status = self
            .state
            .parse::<FillStatus>()
            .map_err(|details| StorageError::CorruptRow {
                table: TABLE.to_string(),
                details,
            })?;
        Ok(FillState {
            end_time: from_secs(self.end_time, TABLE)?,
            last_modified: from_secs(self.last_modified, TABLE)?,
            property: self.property,
            status,
        })
    }
}

pub fn get(conn: &Connection, property: &str) -> Result<Option<FillState>, StorageError> {
    let mut stmt = conn.prepare_cached(
        "SELECT property, end_time, state, last_modified FROM fill_state WHERE property = ?1",
    )?;
    let raw = stmt
        .query_row(params![property], RawFillState::from_row)
        .optional()?;
    raw.map(RawFillState::decode).transpose()
}

pub fn upsert(
    conn: &Connection,
    property: &str,
    end_time: DateTime<Utc>,
    status: FillStatus,
    now: DateTime<Utc>,
) -> Result<(), StorageError> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO fill_state (property, end_time, state, last_modified)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(property) DO UPDATE SET
            end_time = excluded.end_time,
            state = excluded.state,
            last_modified = excluded.last_modified",
    )?;
    stmt.execute(params![
        property,
        to_secs(end_time),
        status.as_str(),
        to_secs(now)
    ])?;
    Ok(())
}

pub fn delete(conn: &Connection, property: &str) -> Result<bool, StorageError> {
    let removed = conn.execute("DELETE FROM fill_state WHERE property = ?1", params![property])?;
    Ok(removed > 0)
}

pub fn list(conn: &Connection) -> Result<Vec<FillState>, StorageError> {
    let mut stmt = conn.prepare_cached(
        "SELECT property, end_time, state, last_modified FROM fill_state ORDER BY property",
    )?;
    let raws = stmt
        .query_map([], RawFillState::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    raws.into_iter().map(RawFillState::decode).collect()
}
