//! Top-level error for fill runs, recording, and runtime setup.

use super::error_code::{self, TallyErrorCode};
use super::{ConfigError, StorageError};

#[derive(Debug, thiserror::Error)]
pub enum FillError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Statistic {property} is locked: {message}")]
    Locked { property: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TallyErrorCode for FillError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.error_code(),
            Self::Storage(e) => e.error_code(),
            Self::Locked { .. } => error_code::STAT_LOCKED,
            Self::Io(_) => error_code::IO_ERROR,
        }
    }
}

pub type FillResult<T> = Result<T, FillError>;
