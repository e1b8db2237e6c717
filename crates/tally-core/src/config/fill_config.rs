//! Fill engine configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FillConfig {
    /// Directory holding per-statistic run lock files.
    /// Defaults to `locks/` beside the database file. An in-memory database
    /// without this set takes no run locks.
    pub lock_dir: Option<String>,
    /// Built-in statistics to leave out of the registry. Dependents of a
    /// disabled statistic must be disabled too.
    #[serde(default)]
    pub disabled_stats: Vec<String>,
}

