//! Shared value types: bucket arithmetic and persisted row shapes.

pub mod rows;
pub mod time;
