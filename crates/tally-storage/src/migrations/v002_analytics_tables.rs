//! v002: fill state and the four aggregate tables.
//!
//! `subgroup` is nullable and NULL is a distinct key value. SQLite treats
//! NULLs as distinct in UNIQUE indexes, so each table carries a second
//! partial unique index covering the NULL-subgroup rows.

use rusqlite::Connection;

use tally_core::errors::StorageError;

pub fn migrate(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS fill_state (
            property        TEXT PRIMARY KEY,
            end_time        INTEGER NOT NULL,
            state           TEXT NOT NULL CHECK (state IN ('done', 'started')),
            last_modified   INTEGER NOT NULL
        ) STRICT;

        CREATE TABLE IF NOT EXISTS user_counts (
            id          INTEGER PRIMARY KEY,
            user_id     INTEGER NOT NULL REFERENCES users(id),
            tenant_id   INTEGER NOT NULL REFERENCES tenants(id),
            property    TEXT NOT NULL,
            subgroup    TEXT,
            end_time    INTEGER NOT NULL,
            value       INTEGER NOT NULL
        ) STRICT;

        CREATE UNIQUE INDEX IF NOT EXISTS uq_user_counts
            ON user_counts(user_id, property, subgroup, end_time);
        CREATE UNIQUE INDEX IF NOT EXISTS uq_user_counts_null_subgroup
            ON user_counts(user_id, property, end_time) WHERE subgroup IS NULL;
        CREATE INDEX IF NOT EXISTS idx_user_counts_property_time
            ON user_counts(property, end_time);

        CREATE TABLE IF NOT EXISTS channel_counts (
            id          INTEGER PRIMARY KEY,
            channel_id  INTEGER NOT NULL REFERENCES channels(id),
            tenant_id   INTEGER NOT NULL REFERENCES tenants(id),
            property    TEXT NOT NULL,
            subgroup    TEXT,
            end_time    INTEGER NOT NULL,
            value       INTEGER NOT NULL
        ) STRICT;

        CREATE UNIQUE INDEX IF NOT EXISTS uq_channel_counts
            ON channel_counts(channel_id, property, subgroup, end_time);
        CREATE UNIQUE INDEX IF NOT EXISTS uq_channel_counts_null_subgroup
            ON channel_counts(channel_id, property, end_time) WHERE subgroup IS NULL;
        CREATE INDEX IF NOT EXISTS idx_channel_counts_property_time
            ON channel_counts(property, end_time);

        CREATE TABLE IF NOT EXISTS tenant_counts (
            id          INTEGER PRIMARY KEY,
            tenant_id   INTEGER NOT NULL REFERENCES tenants(id),
            property    TEXT NOT NULL,
            subgroup    TEXT,
            end_time    INTEGER NOT NULL,
            value       INTEGER NOT NULL
        ) STRICT;

        CREATE UNIQUE INDEX IF NOT EXISTS uq_tenant_counts
            ON tenant_counts(tenant_id, property, subgroup, end_time);
        CREATE UNIQUE INDEX IF NOT EXISTS uq_tenant_counts_null_subgroup
            ON tenant_counts(tenant_id, property, end_time) WHERE subgroup IS NULL;
        CREATE INDEX IF NOT EXISTS idx_tenant_counts_property_time
            ON tenant_counts(property, end_time);

        CREATE TABLE IF NOT EXISTS installation_counts (
            id          INTEGER PRIMARY KEY,
            property    TEXT NOT NULL,
            subgroup    TEXT,
            end_time    INTEGER NOT NULL,
            value       INTEGER NOT NULL
        ) STRICT;

        CREATE UNIQUE INDEX IF NOT EXISTS uq_installation_counts
            ON installation_counts(property, subgroup, end_time);
        CREATE UNIQUE INDEX IF NOT EXISTS uq_installation_counts_null_subgroup
            ON installation_counts(property, end_time) WHERE subgroup IS NULL;
        ",
    )?;
    Ok(())
}
