//! SQLite PRAGMA configuration. Must be applied to every connection
//! immediately after opening.

use rusqlite::Connection;
use tally_core::errors::StorageError;

/// Configure a read-write connection.
///
/// - WAL so readers proceed during fill writes
/// - busy_timeout as the lock-contention mechanism
/// - NORMAL synchronous (WAL durability trade-off)
pub fn apply_pragmas(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        PRAGMA busy_timeout = 5000;
        PRAGMA cache_size = -8000;
        PRAGMA temp_store = MEMORY;
        ",
    )?;
    Ok(())
}

/// Same as [`apply_pragmas`] plus `query_only = ON`.
pub fn apply_readonly_pragmas(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        PRAGMA busy_timeout = 5000;
        PRAGMA cache_size = -8000;
        PRAGMA temp_store = MEMORY;
        PRAGMA query_only = ON;
        ",
    )?;
    Ok(())
}
