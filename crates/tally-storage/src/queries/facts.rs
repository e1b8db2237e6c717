//! Raw fact tables: epoch lookup, collector execution, and the write
//! helpers producers (and tests) use to append facts.

use std::fmt;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use tally_core::errors::StorageError;
use tally_core::traits::collector::CollectorQuery;
use tally_core::types::time::BucketWindow;

use super::{from_secs, to_secs};

/// Earliest tenant creation time. `None` when there are no tenants.
pub fn installation_epoch(conn: &Connection) -> Result<Option<DateTime<Utc>>, StorageError> {
    let min: Option<i64> = conn.query_row("SELECT MIN(created_at) FROM tenants", [], |row| {
        row.get(0)
    })?;
    min.map(|secs| from_secs(secs, "tenants")).transpose()
}

/// Execute a collector statement.
///
/// Only the named parameters the statement actually references are bound.
/// A statement referencing anything else is rejected before it runs.
pub fn run_collector(
    conn: &Connection,
    query: &CollectorQuery,
    property: &str,
    window: &BucketWindow,
) -> Result<usize, StorageError> {
    let mut stmt = conn.prepare_cached(query.sql)?;
    let mut bound = 0;

    if let Some(index) = stmt.parameter_index(":property")? {
        stmt.raw_bind_parameter(index, property)?;
        bound += 1;
    }
    if let Some(index) = stmt.parameter_index(":window_start")? {
        stmt.raw_bind_parameter(index, window.start_secs())?;
        bound += 1;
    }
    if let Some(index) = stmt.parameter_index(":window_end")? {
        stmt.raw_bind_parameter(index, window.end_secs())?;
        bound += 1;
    }

    if bound != stmt.parameter_count() {
        return Err(StorageError::NotSupported {
            operation: format!("collector {}", query.name),
            reason: "statement references parameters other than :property, :window_start, :window_end"
                .to_string(),
        });
    }

    Ok(stmt.raw_execute()?)
}

/// How a message was addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipientKind {
    Channel,
    Direct,
    GroupDirect,
}

impl RecipientKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Channel => "channel",
            Self::Direct => "direct",
            Self::GroupDirect => "group_direct",
        }
    }
}

impl fmt::Display for RecipientKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account lifecycle events in `user_audit_log`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditEvent {
    Created,
    Deactivated,
    Reactivated,
}

impl AuditEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Deactivated => "deactivated",
            Self::Reactivated => "reactivated",
        }
    }
}

pub fn insert_tenant(
    conn: &Connection,
    id: i64,
    name: &str,
    created_at: DateTime<Utc>,
) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO tenants (id, name, created_at) VALUES (?1, ?2, ?3)",
        params![id, name, to_secs(created_at)],
    )?;
    Ok(())
}

pub fn insert_user(
    conn: &Connection,
    id: i64,
    tenant_id: i64,
    is_bot: bool,
    created_at: DateTime<Utc>,
) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO users (id, tenant_id, is_bot, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![id, tenant_id, is_bot, to_secs(created_at)],
    )?;
    Ok(())
}

pub fn insert_channel(
    conn: &Connection,
    id: i64,
    tenant_id: i64,
    name: &str,
) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO channels (id, tenant_id, name) VALUES (?1, ?2, ?3)",
        params![id, tenant_id, name],
    )?;
    Ok(())
}

/// Returns the new message id.
pub fn insert_message(
    conn: &Connection,
    sender_id: i64,
    channel_id: Option<i64>,
    kind: RecipientKind,
    client: &str,
    sent_at: DateTime<Utc>,
) -> Result<i64, StorageError> {
    conn.prepare_cached(
        "INSERT INTO messages (sender_id, channel_id, recipient_kind, client, sent_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?
    .execute(params![sender_id, channel_id, kind.as_str(), client, to_secs(sent_at)])?;
    Ok(conn.last_insert_rowid())
}

pub fn insert_audit_event(
    conn: &Connection,
    user_id: i64,
    event: AuditEvent,
    event_time: DateTime<Utc>,
) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO user_audit_log (user_id, event_type, event_time) VALUES (?1, ?2, ?3)",
        params![user_id, event.as_str(), to_secs(event_time)],
    )?;
    Ok(())
}

pub fn insert_activity_interval(
    conn: &Connection,
    user_id: i64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO user_activity_intervals (user_id, start_at, end_at) VALUES (?1, ?2, ?3)",
        params![user_id, to_secs(start), to_secs(end)],
    )?;
    Ok(())
}
