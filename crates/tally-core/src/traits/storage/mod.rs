//! Storage trait module — re-exports all tally storage traits.
//!
//! These traits define the contract between the fill engine and the
//! relational store. The SQLite implementation lives in `tally-storage`.
//! All traits are object-safe, `Send + Sync`, and have blanket `Arc<T>`
//! impls.

pub mod aggregates;
pub mod facts;
pub mod fill_state;

pub use aggregates::{ClearedProperty, IAggregateStore, RollUpCounts, RollUpPlan, RollUpStep};
pub use facts::IFactSource;
pub use fill_state::IFillStateStore;

/// Everything the driver needs from the store, as one object-safe bound.
pub trait IStatStore: IFillStateStore + IAggregateStore + IFactSource {}

impl<T: IFillStateStore + IAggregateStore + IFactSource + ?Sized> IStatStore for T {}
