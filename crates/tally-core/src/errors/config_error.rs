//! Configuration and invocation errors. Always fatal, never retried.

use super::error_code::{self, TallyErrorCode};
use crate::types::time::Frequency;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Unknown statistic: {0}")]
    UnknownStatistic(String),

    #[error("Statistic declared twice: {0}")]
    DuplicateStatistic(String),

    #[error("Statistic {property} depends on unknown statistic {dependency}")]
    UnknownDependency { property: String, dependency: String },

    #[error("Statistic {property} must be declared after its dependency {dependency}")]
    DependencyOrder { property: String, dependency: String },

    #[error("Invalid definition for {property}: {reason}")]
    InvalidDefinition { property: String, reason: String },

    #[error("Target time {time} is not UTC (offset {offset_secs}s)")]
    NonUtcTime { time: String, offset_secs: i32 },

    #[error("Target time {time} is not aligned to the {frequency} boundary")]
    MisalignedTime { time: String, frequency: Frequency },

    #[error("Time {time} has no following {frequency} bucket")]
    TimeOutOfRange { time: String, frequency: Frequency },

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl TallyErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NonUtcTime { .. }
            | Self::MisalignedTime { .. }
            | Self::TimeOutOfRange { .. } => {
                error_code::INVALID_TARGET_TIME
            }
            Self::UnknownStatistic(_) => error_code::UNKNOWN_STATISTIC,
            _ => error_code::CONFIG_ERROR,
        }
    }
}
