//! Storage-layer errors for SQLite operations.

use super::error_code::{self, TallyErrorCode};

/// Errors that can occur in the storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {message}")]
    SqliteError { message: String },

    #[error("Migration failed at version {version}: {message}")]
    MigrationFailed { version: u32, message: String },

    #[error("Database busy (another operation in progress)")]
    DbBusy,

    #[error("Unique constraint violated: {message}")]
    ConstraintViolation { message: String },

    #[error("Corrupt row in {table}: {details}")]
    CorruptRow { table: String, details: String },

    #[error("Operation not supported: {operation} — {reason}")]
    NotSupported { operation: String, reason: String },
}

impl From<rusqlite::Error> for StorageError {
    fn from(e: rusqlite::Error) -> Self {
        match &e {
            rusqlite::Error::SqliteFailure(err, _) => match err.code {
                rusqlite::ffi::ErrorCode::DatabaseBusy | rusqlite::ffi::ErrorCode::DatabaseLocked => {
                    Self::DbBusy
                }
                rusqlite::ffi::ErrorCode::ConstraintViolation => Self::ConstraintViolation {
                    message: e.to_string(),
                },
                _ => Self::SqliteError {
                    message: e.to_string(),
                },
            },
            _ => Self::SqliteError {
                message: e.to_string(),
            },
        }
    }
}

impl TallyErrorCode for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::DbBusy => error_code::DB_BUSY,
            Self::MigrationFailed { .. } => error_code::MIGRATION_FAILED,
            Self::ConstraintViolation { .. } => error_code::CONSTRAINT_VIOLATION,
            Self::CorruptRow { .. } => error_code::CORRUPT_ROW,
            _ => error_code::STORAGE_ERROR,
        }
    }
}
