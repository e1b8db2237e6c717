//! # tally-storage
//!
//! SQLite persistence layer for the tally fill engine.
//! WAL mode, write-serialized + read-pooled, `user_version` migrations,
//! fill-state and aggregate-row queries, collector statement execution.

pub mod connection;
pub mod engine;
pub mod migrations;
pub mod queries;

pub use connection::ConnectionPool;
pub use engine::TallyStorageEngine;
