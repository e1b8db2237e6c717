//! RecoveryAction: what an external scheduler should do with a failed run.

use std::fmt;

use super::{FillError, StorageError};

/// Recommended recovery action for a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Re-invoke on the next schedule tick. The STARTED bucket is undone then.
    Retry,
    /// Needs a human: bad configuration or invocation.
    Escalate,
    /// Best-effort path; drop and move on.
    Ignore,
}

impl RecoveryAction {
    pub fn for_error(error: &FillError) -> Self {
        match error {
            FillError::Config(_) => Self::Escalate,
            FillError::Locked { .. } => Self::Ignore,
            FillError::Storage(StorageError::MigrationFailed { .. }) => Self::Escalate,
            FillError::Storage(StorageError::CorruptRow { .. }) => Self::Escalate,
            FillError::Storage(_) => Self::Retry,
            FillError::Io(_) => Self::Retry,
        }
    }
}

impl fmt::Display for RecoveryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Retry => write!(f, "Retry"),
            Self::Escalate => write!(f, "Escalate"),
            Self::Ignore => write!(f, "Ignore"),
        }
    }
}
