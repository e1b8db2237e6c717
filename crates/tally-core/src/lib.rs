//! # tally-core
//!
//! Foundation crate for the tally statistics fill engine.
//! Defines bucket arithmetic, row types, storage traits, errors, config,
//! and tracing setup. Every other crate in the workspace depends on this.

pub mod config;
pub mod errors;
pub mod tracing;
pub mod traits;
pub mod types;

// Re-export the most commonly used types at the crate root.
pub use config::TallyConfig;
pub use errors::error_code::TallyErrorCode;
pub use errors::{ConfigError, FillError, FillResult, StorageError};
pub use types::rows::{AggregateRow, CountOwner, FillState, FillStatus, RowLevel, UndoScope};
pub use types::time::{BucketWindow, Frequency, Interval};
