//! Aggregate tables: user_counts, channel_counts, tenant_counts,
//! installation_counts.
//!
//! Every statement is static. The table is chosen by matching on the
//! row level, never by composing SQL text.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use tally_core::errors::StorageError;
use tally_core::traits::storage::ClearedProperty;
use tally_core::types::rows::{AggregateRow, CountOwner, RowLevel};

use super::{from_secs, to_secs};

pub fn table_for(level: RowLevel) -> &'static str {
    match level {
        RowLevel::User => "user_counts",
        RowLevel::Channel => "channel_counts",
        RowLevel::Tenant => "tenant_counts",
        RowLevel::Installation => "installation_counts",
    }
}

/// Insert a batch in one transaction. Any duplicate key fails the batch.
pub fn insert_rows(conn: &Connection, rows: &[AggregateRow]) -> Result<usize, StorageError> {
    if rows.is_empty() {
        return Ok(0);
    }
    let tx = conn.unchecked_transaction()?;
    for row in rows {
        insert_one(&tx, row)?;
    }
    tx.commit()?;
    Ok(rows.len())
}

fn insert_one(conn: &Connection, row: &AggregateRow) -> Result<(), StorageError> {
    let end = to_secs(row.end_time);
    match row.owner {
        CountOwner::User { user_id, tenant_id } => {
            conn.prepare_cached(
                "INSERT INTO user_counts (user_id, tenant_id, property, subgroup, end_time, value)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?
            .execute(params![user_id, tenant_id, row.property, row.subgroup, end, row.value])?;
        }
        CountOwner::Channel { channel_id, tenant_id } => {
            conn.prepare_cached(
                "INSERT INTO channel_counts (channel_id, tenant_id, property, subgroup, end_time, value)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?
            .execute(params![channel_id, tenant_id, row.property, row.subgroup, end, row.value])?;
        }
        CountOwner::Tenant { tenant_id } => {
            conn.prepare_cached(
                "INSERT INTO tenant_counts (tenant_id, property, subgroup, end_time, value)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?
            .execute(params![tenant_id, row.property, row.subgroup, end, row.value])?;
        }
        CountOwner::Installation => {
            conn.prepare_cached(
                "INSERT INTO installation_counts (property, subgroup, end_time, value)
                 VALUES (?1, ?2, ?3, ?4)",
            )?
            .execute(params![row.property, row.subgroup, end, row.value])?;
        }
    }
    Ok(())
}

/// Delete one bucket of `property` on each listed level, in one transaction.
pub fn delete_at(
    conn: &Connection,
    property: &str,
    end_time: DateTime<Utc>,
    levels: &[RowLevel],
) -> Result<usize, StorageError> {
    let end = to_secs(end_time);
    let tx = conn.unchecked_transaction()?;
    let mut removed = 0;
    for level in levels {
        let sql = match level {
            RowLevel::User => "DELETE FROM user_counts WHERE property = ?1 AND end_time = ?2",
            RowLevel::Channel => "DELETE FROM channel_counts WHERE property = ?1 AND end_time = ?2",
            RowLevel::Tenant => "DELETE FROM tenant_counts WHERE property = ?1 AND end_time = ?2",
            RowLevel::Installation => {
                "DELETE FROM installation_counts WHERE property = ?1 AND end_time = ?2"
            }
        };
        removed += tx.prepare_cached(sql)?.execute(params![property, end])?;
    }
    tx.commit()?;
    Ok(removed)
}

/// Add `row.value` to the existing row, or create it.
///
/// `subgroup IS ?` matches NULL against NULL, which `=` would not.
pub fn increment(conn: &Connection, row: &AggregateRow) -> Result<(), StorageError> {
    let end = to_secs(row.end_time);
    let tx = conn.unchecked_transaction()?;
    let updated = match row.owner {
        CountOwner::User { user_id, .. } => tx
            .prepare_cached(
                "UPDATE user_counts SET value = value + ?1
                 WHERE user_id = ?2 AND property = ?3 AND subgroup IS ?4 AND end_time = ?5",
            )?
            .execute(params![row.value, user_id, row.property, row.subgroup, end])?,
        CountOwner::Channel { channel_id, .. } => tx
            .prepare_cached(
                "UPDATE channel_counts SET value = value + ?1
                 WHERE channel_id = ?2 AND property = ?3 AND subgroup IS ?4 AND end_time = ?5",
            )?
            .execute(params![row.value, channel_id, row.property, row.subgroup, end])?,
        CountOwner::Tenant { tenant_id } => tx
            .prepare_cached(
                "UPDATE tenant_counts SET value = value + ?1
                 WHERE tenant_id = ?2 AND property = ?3 AND subgroup IS ?4 AND end_time = ?5",
            )?
            .execute(params![row.value, tenant_id, row.property, row.subgroup, end])?,
        CountOwner::Installation => tx
            .prepare_cached(
                "UPDATE installation_counts SET value = value + ?1
                 WHERE property = ?2 AND subgroup IS ?3 AND end_time = ?4",
            )?
            .execute(params![row.value, row.property, row.subgroup, end])?,
    };
    if updated == 0 {
        insert_one(&tx, row)?;
    }
    tx.commit()?;
    Ok(())
}

/// Owner columns are padded to two so every level decodes the same shape.
struct RawCountRow {
    owner_id: Option<i64>,
    tenant_id: Option<i64>,
    subgroup: Option<String>,
    end_time: i64,
    value: i64,
}

impl RawCountRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            owner_id: row.get(0)?,
            tenant_id: row.get(1)?,
            subgroup: row.get(2)?,
            end_time: row.get(3)?,
            value: row.get(4)?,
        })
    }

    fn decode(self, level: RowLevel, property: &str) -> Result<AggregateRow, StorageError> {
        let table = table_for(level);
        let missing = |column: &str| StorageError::CorruptRow {
            table: table.to_string(),
            details: format!("{column} is NULL"),
        };
        let owner = match level {
            RowLevel::User => CountOwner::User {
                user_id: self.owner_id.ok_or_else(|| missing("user_id"))?,
                tenant_id: self.tenant_id.ok_or_else(|| missing("tenant_id"))?,
            },
            RowLevel::Channel => CountOwner::Channel {
                channel_id: self.owner_id.ok_or_else(|| missing("channel_id"))?,
                tenant_id: self.tenant_id.ok_or_else(|| missing("tenant_id"))?,
            },
            RowLevel::Tenant => CountOwner::Tenant {
                tenant_id: self.tenant_id.ok_or_else(|| missing("tenant_id"))?,
            },
            RowLevel::Installation => CountOwner::Installation,
        };
        Ok(AggregateRow {
            owner,
            property: property.to_string(),
            subgroup: self.subgroup,
            end_time: from_secs(self.end_time, table)?,
            value: self.value,
        })
    }
}

/// Rows of one property at one level, ordered by end time, owner, subgroup.
pub fn get_rows(
    conn: &Connection,
    property: &str,
    level: RowLevel,
    end_time: Option<DateTime<Utc>>,
) -> Result<Vec<AggregateRow>, StorageError> {
    let sql = match level {
        RowLevel::User => {
            "SELECT user_id, tenant_id, subgroup, end_time, value FROM user_counts
             WHERE property = ?1 AND (?2 IS NULL OR end_time = ?2)
             ORDER BY end_time, user_id, subgroup"
        }
        RowLevel::Channel => {
            "SELECT channel_id, tenant_id, subgroup, end_time, value FROM channel_counts
             WHERE property = ?1 AND (?2 IS NULL OR end_time = ?2)
             ORDER BY end_time, channel_id, subgroup"
        }
        RowLevel::Tenant => {
            "SELECT NULL, tenant_id, subgroup, end_time, value FROM tenant_counts
             WHERE property = ?1 AND (?2 IS NULL OR end_time = ?2)
             ORDER BY end_time, tenant_id, subgroup"
        }
        RowLevel::Installation => {
            "SELECT NULL, NULL, subgroup, end_time, value FROM installation_counts
             WHERE property = ?1 AND (?2 IS NULL OR end_time = ?2)
             ORDER BY end_time, subgroup"
        }
    };
    let mut stmt = conn.prepare_cached(sql)?;
    let raws = stmt
        .query_map(params![property, end_time.map(to_secs)], RawCountRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    raws.into_iter()
        .map(|raw| raw.decode(level, property))
        .collect()
}

/// Remove `property`'s cursor and every row at every level in one
/// transaction, so a failure leaves both in place.
pub fn clear_property(conn: &Connection, property: &str) -> Result<ClearedProperty, StorageError> {
    let tx = conn.unchecked_transaction()?;
    let had_state = tx
        .prepare_cached("DELETE FROM fill_state WHERE property = ?1")?
        .execute(params![property])?
        > 0;
    let mut rows_removed = 0;
    for sql in [
        "DELETE FROM user_counts WHERE property = ?1",
        "DELETE FROM channel_counts WHERE property = ?1",
        "DELETE FROM tenant_counts WHERE property = ?1",
        "DELETE FROM installation_counts WHERE property = ?1",
    ] {
        rows_removed += tx.prepare_cached(sql)?.execute(params![property])?;
    }
    tx.commit()?;
    Ok(ClearedProperty {
        had_state,
        rows_removed,
    })
}
