//! Migration runner — `PRAGMA user_version` tracking, forward-only,
//! one transaction per migration.

mod v001_fact_tables;
mod v002_analytics_tables;

use rusqlite::Connection;
use tracing::{debug, info, warn};

use tally_core::errors::StorageError;

/// Highest schema version this build knows how to create.
pub const LATEST_VERSION: u32 = 2;

type MigrationFn = fn(&Connection) -> Result<(), StorageError>;

const MIGRATIONS: [(u32, &str, MigrationFn); 2] = [
    (1, "fact_tables", v001_fact_tables::migrate),
    (2, "analytics_tables", v002_analytics_tables::migrate),
];

/// Schema version recorded in the database header. 0 for a fresh file.
pub fn current_version(conn: &Connection) -> Result<u32, StorageError> {
    let version: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    Ok(version)
}

/// Run all pending migrations. Returns how many were applied.
pub fn run_migrations(conn: &Connection) -> Result<u32, StorageError> {
    let current = current_version(conn)?;

    if current > LATEST_VERSION {
        return Err(StorageError::MigrationFailed {
            version: current,
            message: format!("database schema v{current} is newer than this build (v{LATEST_VERSION})"),
        });
    }
    if current == LATEST_VERSION {
        debug!("database schema is up to date (v{current})");
        return Ok(0);
    }

    info!("running migrations: v{} → v{}", current, LATEST_VERSION);

    let mut applied = 0;
    for &(version, name, migrate_fn) in &MIGRATIONS {
        if version <= current {
            continue;
        }

        debug!("applying migration v{version:03}: {name}");
        conn.execute_batch("BEGIN IMMEDIATE")
            .map_err(|e| migration_err(version, format!("begin transaction: {e}")))?;

        let outcome = migrate_fn(conn).and_then(|()| {
            conn.pragma_update(None, "user_version", version)
                .map_err(StorageError::from)
        });

        match outcome {
            Ok(()) => {
                conn.execute_batch("COMMIT")
                    .map_err(|e| migration_err(version, format!("commit: {e}")))?;
                info!("applied migration v{version:03}: {name}");
                applied += 1;
            }
            Err(e) => {
                warn!("migration v{version:03} failed: {e}, rolling back");
                let _ = conn.execute_batch("ROLLBACK");
                return Err(migration_err(version, e.to_string()));
            }
        }
    }

    Ok(applied)
}

fn migration_err(version: u32, message: String) -> StorageError {
    StorageError::MigrationFailed { version, message }
}
