//! Stable error codes surfaced to operators and alerting.

pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
pub const DB_BUSY: &str = "DB_BUSY";
pub const MIGRATION_FAILED: &str = "MIGRATION_FAILED";
pub const CONSTRAINT_VIOLATION: &str = "CONSTRAINT_VIOLATION";
pub const CORRUPT_ROW: &str = "CORRUPT_ROW";
pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const INVALID_TARGET_TIME: &str = "INVALID_TARGET_TIME";
pub const UNKNOWN_STATISTIC: &str = "UNKNOWN_STATISTIC";
pub const STAT_LOCKED: &str = "STAT_LOCKED";
pub const IO_ERROR: &str = "IO_ERROR";

/// Maps an error to a stable, machine-readable code.
pub trait TallyErrorCode {
    fn error_code(&self) -> &'static str;
}
