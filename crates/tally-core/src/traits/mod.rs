//! Shared traits used across tally crates.

pub mod collector;
pub mod storage;

pub use collector::{CollectorQuery, FactCollector};
pub use storage::{IAggregateStore, IFactSource, IFillStateStore, IStatStore};
