//! v001: raw fact tables read by the built-in collectors.
//!
//! These belong to the producing system. They are created here so a
//! standalone database (and the test suite) is self-contained.

use rusqlite::Connection;

use tally_core::errors::StorageError;

pub fn migrate(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS tenants (
            id          INTEGER PRIMARY KEY,
            name        TEXT NOT NULL,
            created_at  INTEGER NOT NULL
        ) STRICT;

        CREATE TABLE IF NOT EXISTS users (
            id          INTEGER PRIMARY KEY,
            tenant_id   INTEGER NOT NULL REFERENCES tenants(id),
            is_bot      INTEGER NOT NULL DEFAULT 0 CHECK (is_bot IN (0, 1)),
            created_at  INTEGER NOT NULL
        ) STRICT;

        CREATE INDEX IF NOT EXISTS idx_users_tenant ON users(tenant_id);

        CREATE TABLE IF NOT EXISTS channels (
            id          INTEGER PRIMARY KEY,
            tenant_id   INTEGER NOT NULL REFERENCES tenants(id),
            name        TEXT NOT NULL
        ) STRICT;

        CREATE TABLE IF NOT EXISTS messages (
            id              INTEGER PRIMARY KEY,
            sender_id       INTEGER NOT NULL REFERENCES users(id),
            channel_id      INTEGER REFERENCES channels(id),
            recipient_kind  TEXT NOT NULL
                CHECK (recipient_kind IN ('channel', 'direct', 'group_direct')),
            client          TEXT NOT NULL DEFAULT 'unknown',
            sent_at         INTEGER NOT NULL
        ) STRICT;

        CREATE INDEX IF NOT EXISTS idx_messages_sent_at ON messages(sent_at);
        CREATE INDEX IF NOT EXISTS idx_messages_channel_time
            ON messages(channel_id, sent_at);

        CREATE TABLE IF NOT EXISTS user_audit_log (
            id          INTEGER PRIMARY KEY,
            user_id     INTEGER NOT NULL REFERENCES users(id),
            event_type  TEXT NOT NULL
                CHECK (event_type IN ('created', 'deactivated', 'reactivated')),
            event_time  INTEGER NOT NULL
        ) STRICT;

        CREATE INDEX IF NOT EXISTS idx_audit_user_time
            ON user_audit_log(user_id, event_time);

        CREATE TABLE IF NOT EXISTS user_activity_intervals (
            id          INTEGER PRIMARY KEY,
            user_id     INTEGER NOT NULL REFERENCES users(id),
            start_at    INTEGER NOT NULL,
            end_at      INTEGER NOT NULL,
            CHECK (end_at >= start_at)
        ) STRICT;

        CREATE INDEX IF NOT EXISTS idx_activity_end
            ON user_activity_intervals(end_at, start_at);
        ",
    )?;
    Ok(())
}
