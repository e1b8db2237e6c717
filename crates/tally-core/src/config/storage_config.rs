//! Storage configuration.

use serde::{Deserialize, Serialize};

/// Where the analytics database lives and how many readers it gets.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the SQLite database. `None` = in-memory (tests only).
    pub db_path: Option<String>,
    /// Number of read-only connections. Default: 2.
    pub read_pool_size: Option<usize>,
}

impl StorageConfig {
    pub fn effective_read_pool_size(&self) -> usize {
        self.read_pool_size.filter(|n| *n > 0).unwrap_or(2)
    }
}
