//! # tally-fill
//!
//! The fill engine: a validated statistic registry, the per-statistic
//! fill-state machine, roll-up planning, dependency clamping, and the
//! driver loop that advances each statistic bucket by bucket. Also the
//! producer-side [`Recorder`], per-statistic run locks, status reporting,
//! and the [`FillRuntime`] that wires them to a SQLite store.

pub mod aggregator;
pub mod collectors;
pub mod driver;
pub mod fill_state;
pub mod lock;
pub mod maintenance;
pub mod recorder;
pub mod registry;
pub mod resolver;
pub mod runtime;
pub mod status;

pub use driver::{FillDriver, RunOutcome};
pub use recorder::Recorder;
pub use registry::{Registry, StatDefinition};
pub use runtime::FillRuntime;
pub use status::{StatStatus, StatusReport};
