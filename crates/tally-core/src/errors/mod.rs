//! Error types for every tally layer, plus stable error codes and the
//! recovery classification used by schedulers.

pub mod config_error;
pub mod error_code;
pub mod fill_error;
pub mod recovery;
pub mod storage_error;

pub use config_error::ConfigError;
pub use fill_error::{FillError, FillResult};
pub use recovery::RecoveryAction;
pub use storage_error::StorageError;
